// crates/astra-ledger/src/memory.rs
//
// InMemoryLedger: an in-process stand-in for the hosted backend.
//
// Implements every backend collaborator with the backend's own semantics:
// transfers are atomic and refuse to overdraw, rewards credit from the
// system, votes add weight to proposal tallies. Used by the CLI demo mode
// and by tests. It can be taken offline, slowed down, or told to answer a
// given procedure with a fixed reply.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use astra_core::{
    ActivityLog, Astra, AstraError, ClaimCall, LedgerProcedures, LedgerStore, MarketStats, ProcedureReply,
    Proposal, ProposalStatus, ProposalStore, Resident, ResidentDirectory, ResidentId, RewardCall,
    Session, SessionProvider, Transaction, TransactionKind, TransferCall, VoteCall, WalletProvider,
};

/// Procedure names, matching the hosted backend's.
pub const TRANSFER_PROCEDURE: &str = "transfer_astra";
pub const REWARD_PROCEDURE: &str = "reward_astra_activity";
pub const MARKET_STATS_PROCEDURE: &str = "get_astra_market_stats";
pub const VOTE_PROCEDURE: &str = "cast_dao_vote";
pub const CLAIM_PROCEDURE: &str = "claim_astra_to_wallet";

/// A fixed session.
#[derive(Debug, Default)]
pub struct StaticSession {
    session: Session,
}

impl StaticSession {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

impl SessionProvider for StaticSession {
    fn session(&self) -> Session {
        self.session.clone()
    }
}

/// A fixed wallet binding, e.g. an address from the config file.
#[derive(Debug, Default)]
pub struct StaticWallet {
    address: Option<String>,
}

impl StaticWallet {
    pub fn new(address: Option<&str>) -> Self {
        Self {
            address: address.map(str::to_string),
        }
    }
}

impl WalletProvider for StaticWallet {
    fn wallet_address(&self) -> Option<String> {
        self.address.clone()
    }
}

#[derive(Debug, Default)]
struct LedgerState {
    residents: Vec<Resident>,
    balances: HashMap<ResidentId, Astra>,
    transactions: Vec<Transaction>,
    projects: HashMap<String, ResidentId>,
    proposals: Vec<Proposal>,
    activity: Vec<(String, String)>,
    claimed: HashMap<String, Astra>,
    calls: HashMap<&'static str, usize>,
    scripted: HashMap<&'static str, ProcedureReply>,
    offline: bool,
    latency: Duration,
    last_timestamp: Option<DateTime<Utc>>,
    next_tx: u64,
}

#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Register a resident with an opening balance (recorded as a grant).
    pub fn add_resident(&self, name: &str, role: Option<&str>, opening: Astra) -> ResidentId {
        let id = ResidentId::new_v7();
        let mut state = self.lock();
        state.residents.push(Resident {
            id,
            display_name: name.to_string(),
            role: role.map(str::to_string),
        });
        state.balances.insert(id, opening);
        if !opening.is_zero() {
            let tx = new_transaction(
                &mut state,
                opening,
                TransactionKind::AdminGrant,
                None,
                id,
                Some("Opening balance".to_string()),
            );
            state.transactions.push(tx);
        }
        id
    }

    pub fn add_project(&self, project_id: &str, owner: ResidentId) {
        self.lock().projects.insert(project_id.to_string(), owner);
    }

    pub fn add_proposal(&self, proposal: Proposal) {
        self.lock().proposals.push(proposal);
    }

    /// Simulate an unreachable backend.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Delay every call by `latency` before answering.
    pub fn set_latency(&self, latency: Duration) {
        self.lock().latency = latency;
    }

    /// Answer every call of `procedure` with `reply`, without applying it.
    pub fn script_reply(&self, procedure: &'static str, reply: ProcedureReply) {
        self.lock().scripted.insert(procedure, reply);
    }

    pub fn clear_scripted(&self, procedure: &'static str) {
        self.lock().scripted.remove(procedure);
    }

    /// How many times `procedure` has been invoked.
    pub fn calls(&self, procedure: &str) -> usize {
        self.lock().calls.get(procedure).copied().unwrap_or(0)
    }

    pub fn balance_of(&self, resident: ResidentId) -> Option<Astra> {
        self.lock().balances.get(&resident).copied()
    }

    /// Total claimed to `wallet` so far.
    pub fn claimed_to(&self, wallet: &str) -> Astra {
        self.lock().claimed.get(wallet).copied().unwrap_or_default()
    }

    pub fn activity_events(&self) -> Vec<String> {
        self.lock().activity.iter().map(|(e, _)| e.clone()).collect()
    }

    /// The backend's atomic transfer: all or nothing, never overdraws.
    pub fn apply_transfer(
        &self,
        from: ResidentId,
        to: ResidentId,
        amount: Astra,
        note: &str,
        project_id: Option<&str>,
    ) -> Result<Transaction, String> {
        let mut state = self.lock();
        if amount.is_zero() {
            return Err("Amount must be positive".to_string());
        }
        if from == to {
            return Err("Cannot transfer to yourself".to_string());
        }
        if !state.balances.contains_key(&to) {
            return Err("Recipient not found".to_string());
        }
        let available = state.balances.get(&from).copied().unwrap_or_default();
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| "Insufficient funds".to_string())?;
        let credited = state
            .balances
            .get(&to)
            .copied()
            .unwrap_or_default()
            .checked_add(amount)
            .ok_or_else(|| "Balance overflow".to_string())?;

        state.balances.insert(from, remaining);
        state.balances.insert(to, credited);

        let kind = if project_id.is_some() {
            TransactionKind::ProjectContribution
        } else {
            TransactionKind::Transfer
        };
        let note = Some(note.to_string()).filter(|n| !n.is_empty());
        let tx = new_transaction(&mut state, amount, kind, Some(from), to, note);
        state.transactions.push(tx.clone());
        Ok(tx)
    }

    /// Begin a call: count it, wait out the latency, then check reachability.
    async fn enter(&self, procedure: &'static str) -> Result<Option<ProcedureReply>, AstraError> {
        let latency = {
            let mut state = self.lock();
            *state.calls.entry(procedure).or_insert(0) += 1;
            state.latency
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        let state = self.lock();
        if state.offline {
            return Err(AstraError::Transport("ledger unreachable".to_string()));
        }
        Ok(state.scripted.get(procedure).cloned())
    }

    fn decorate(state: &LedgerState, tx: &Transaction) -> Transaction {
        let name_of = |id: ResidentId| {
            state
                .residents
                .iter()
                .find(|r| r.id == id)
                .map(|r| r.display_name.clone())
        };
        let mut tx = tx.clone();
        tx.from_name = tx.from_id.and_then(name_of);
        tx.to_name = name_of(tx.to_id);
        tx
    }
}

fn new_transaction(
    state: &mut LedgerState,
    amount: Astra,
    kind: TransactionKind,
    from_id: Option<ResidentId>,
    to_id: ResidentId,
    note: Option<String>,
) -> Transaction {
    // Strictly increasing timestamps keep "newest first" well defined.
    let mut now = Utc::now();
    if let Some(last) = state.last_timestamp {
        if now <= last {
            now = last + chrono::Duration::milliseconds(1);
        }
    }
    state.last_timestamp = Some(now);
    state.next_tx += 1;

    Transaction {
        id: format!("tx-{}", state.next_tx),
        amount,
        kind,
        from_id,
        to_id,
        from_name: None,
        to_name: None,
        note,
        created_at: now,
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn balance(&self, resident: ResidentId) -> Result<Option<Astra>, AstraError> {
        self.enter("astra_balances").await?;
        Ok(self.balance_of(resident))
    }

    async fn transactions(
        &self,
        resident: ResidentId,
        limit: usize,
    ) -> Result<Vec<Transaction>, AstraError> {
        self.enter("astra_transactions").await?;
        let state = self.lock();
        let mut txs: Vec<Transaction> = state
            .transactions
            .iter()
            .filter(|tx| tx.to_id == resident || tx.from_id == Some(resident))
            .map(|tx| Self::decorate(&state, tx))
            .collect();
        txs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        txs.truncate(limit);
        Ok(txs)
    }

    async fn project_owner(&self, project_id: &str) -> Result<Option<ResidentId>, AstraError> {
        self.enter("shared_projects").await?;
        Ok(self.lock().projects.get(project_id).copied())
    }
}

#[async_trait]
impl LedgerProcedures for InMemoryLedger {
    async fn transfer(&self, call: TransferCall) -> Result<ProcedureReply, AstraError> {
        if let Some(reply) = self.enter(TRANSFER_PROCEDURE).await? {
            return Ok(reply);
        }
        let outcome = self.apply_transfer(
            call.from,
            call.to,
            call.amount,
            &call.note,
            call.project_id.as_deref(),
        );
        Ok(match outcome {
            Ok(_) => ProcedureReply::ok(),
            Err(reason) => ProcedureReply::failed(reason),
        })
    }

    async fn reward(&self, call: RewardCall) -> Result<ProcedureReply, AstraError> {
        if let Some(reply) = self.enter(REWARD_PROCEDURE).await? {
            return Ok(reply);
        }
        let mut state = self.lock();
        if call.amount.is_zero() {
            return Ok(ProcedureReply::failed("Amount must be positive"));
        }
        let current = state.balances.get(&call.resident).copied().unwrap_or_default();
        let credited = match current.checked_add(call.amount) {
            Some(c) => c,
            None => return Ok(ProcedureReply::failed("Balance overflow")),
        };
        state.balances.insert(call.resident, credited);
        let tx = new_transaction(
            &mut state,
            call.amount,
            TransactionKind::Reward,
            None,
            call.resident,
            Some(call.kind.clone()),
        );
        state.transactions.push(tx);
        Ok(ProcedureReply::ok())
    }

    async fn market_stats(&self) -> Result<MarketStats, AstraError> {
        self.enter(MARKET_STATS_PROCEDURE).await?;
        let state = self.lock();
        let total_supply = state
            .balances
            .values()
            .fold(Astra::zero(), |acc, b| acc.checked_add(*b).unwrap_or(acc));
        let since = Utc::now() - chrono::Duration::hours(24);
        let tx_count_24h = state
            .transactions
            .iter()
            .filter(|tx| tx.created_at >= since)
            .count() as u64;
        Ok(MarketStats {
            total_supply,
            tx_count_24h,
        })
    }

    async fn cast_vote(&self, call: VoteCall) -> Result<ProcedureReply, AstraError> {
        if let Some(reply) = self.enter(VOTE_PROCEDURE).await? {
            return Ok(reply);
        }
        let mut state = self.lock();
        let proposal = match state.proposals.iter_mut().find(|p| p.id == call.proposal_id) {
            Some(p) => p,
            None => return Ok(ProcedureReply::failed("Proposal not found")),
        };
        if proposal.status != ProposalStatus::Active {
            return Ok(ProcedureReply::failed("Voting is closed"));
        }
        let tally = if call.support {
            &mut proposal.votes_for
        } else {
            &mut proposal.votes_against
        };
        *tally = tally.checked_add(call.weight).unwrap_or(*tally);
        Ok(ProcedureReply::ok())
    }

    async fn claim_to_wallet(&self, call: ClaimCall) -> Result<ProcedureReply, AstraError> {
        if let Some(reply) = self.enter(CLAIM_PROCEDURE).await? {
            return Ok(reply);
        }
        let mut state = self.lock();
        if call.amount.is_zero() {
            return Ok(ProcedureReply::failed("Amount must be positive"));
        }
        if call.wallet.trim().is_empty() {
            return Ok(ProcedureReply::failed("Wallet address required"));
        }
        let available = state.balances.get(&call.resident).copied().unwrap_or_default();
        let remaining = match available.checked_sub(call.amount) {
            Some(r) => r,
            None => return Ok(ProcedureReply::failed("Insufficient funds")),
        };
        state.balances.insert(call.resident, remaining);
        let claimed = state.claimed.entry(call.wallet).or_default();
        *claimed = claimed.checked_add(call.amount).unwrap_or(*claimed);
        Ok(ProcedureReply::ok())
    }
}

#[async_trait]
impl ResidentDirectory for InMemoryLedger {
    async fn search(
        &self,
        query: &str,
        exclude: Option<ResidentId>,
        limit: usize,
    ) -> Result<Vec<Resident>, AstraError> {
        self.enter("residents").await?;
        let needle = query.to_lowercase();
        let state = self.lock();
        let mut found: Vec<Resident> = state
            .residents
            .iter()
            .filter(|r| Some(r.id) != exclude)
            .filter(|r| r.display_name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        found.truncate(limit);
        Ok(found)
    }
}

#[async_trait]
impl ProposalStore for InMemoryLedger {
    async fn proposals(&self) -> Result<Vec<Proposal>, AstraError> {
        self.enter("dao_proposals").await?;
        Ok(self.lock().proposals.clone())
    }
}

#[async_trait]
impl ActivityLog for InMemoryLedger {
    async fn record(&self, event: &str, message: &str, _metadata: serde_json::Value) {
        self.lock()
            .activity
            .push((event.to_string(), message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_is_all_or_nothing() {
        let ledger = InMemoryLedger::new();
        let a = ledger.add_resident("Alex River", None, Astra::from_whole(100));
        let b = ledger.add_resident("Alice Park", None, Astra::zero());

        assert_eq!(
            ledger.apply_transfer(a, b, Astra::from_whole(150), "", None),
            Err("Insufficient funds".to_string())
        );
        assert_eq!(ledger.balance_of(a), Some(Astra::from_whole(100)));
        assert_eq!(ledger.balance_of(b), Some(Astra::zero()));

        ledger.apply_transfer(a, b, Astra::from_whole(40), "thanks", None).unwrap();
        assert_eq!(ledger.balance_of(a), Some(Astra::from_whole(60)));
        assert_eq!(ledger.balance_of(b), Some(Astra::from_whole(40)));
    }

    #[test]
    fn test_transfer_rejects_unknown_recipient_and_self() {
        let ledger = InMemoryLedger::new();
        let a = ledger.add_resident("Alex River", None, Astra::from_whole(100));
        assert!(ledger.apply_transfer(a, a, Astra::from_whole(1), "", None).is_err());
        assert!(ledger
            .apply_transfer(a, ResidentId::new_v7(), Astra::from_whole(1), "", None)
            .is_err());
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_excludes() {
        let ledger = InMemoryLedger::new();
        let me = ledger.add_resident("Alina Self", None, Astra::zero());
        ledger.add_resident("Alex River", None, Astra::zero());
        ledger.add_resident("Alice Park", None, Astra::zero());
        ledger.add_resident("Bob Stone", None, Astra::zero());

        let found = ledger.search("AL", Some(me), 5).await.unwrap();
        let names: Vec<_> = found.iter().map(|r| r.display_name.as_str()).collect();
        assert_eq!(names, vec!["Alex River", "Alice Park"]);
    }

    #[tokio::test]
    async fn test_offline_fails_every_call() {
        let ledger = InMemoryLedger::new();
        let me = ledger.add_resident("Alex River", None, Astra::from_whole(1));
        ledger.set_offline(true);
        assert!(ledger.balance(me).await.is_err());
        assert!(ledger.market_stats().await.is_err());
        assert_eq!(ledger.calls(MARKET_STATS_PROCEDURE), 1);
    }

    #[tokio::test]
    async fn test_scripted_reply_is_not_applied() {
        let ledger = InMemoryLedger::new();
        let a = ledger.add_resident("Alex River", None, Astra::from_whole(10));
        let b = ledger.add_resident("Alice Park", None, Astra::zero());
        ledger.script_reply(TRANSFER_PROCEDURE, ProcedureReply::default());

        let reply = ledger
            .transfer(TransferCall {
                from: a,
                to: b,
                amount: Astra::from_whole(5),
                note: String::new(),
                project_id: None,
            })
            .await
            .unwrap();
        assert_eq!(reply, ProcedureReply::default());
        assert_eq!(ledger.balance_of(a), Some(Astra::from_whole(10)));
    }

    #[tokio::test]
    async fn test_claim_debits_and_never_overdraws() {
        let ledger = InMemoryLedger::new();
        let me = ledger.add_resident("Maya Neural", None, Astra::from_whole(30));
        let claim = |amount| ClaimCall {
            resident: me,
            wallet: "0xfeed".to_string(),
            amount,
        };

        let reply = ledger.claim_to_wallet(claim(Astra::from_whole(31))).await.unwrap();
        assert_eq!(reply, ProcedureReply::failed("Insufficient funds"));
        assert_eq!(ledger.balance_of(me), Some(Astra::from_whole(30)));

        let reply = ledger.claim_to_wallet(claim(Astra::from_whole(30))).await.unwrap();
        assert_eq!(reply, ProcedureReply::ok());
        assert_eq!(ledger.balance_of(me), Some(Astra::zero()));
        assert_eq!(ledger.claimed_to("0xfeed"), Astra::from_whole(30));
    }
}
