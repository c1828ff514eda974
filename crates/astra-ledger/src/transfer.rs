// crates/astra-ledger/src/transfer.rs
//
// TransferOrchestrator: attempts a ledger mutation only when its
// preconditions hold, and makes the display reflect the true outcome.
//
// Flow for a transfer:
//   in-flight guard -> session -> recipient -> amount -> verified balance
//   -> remote transfer (bounded by the request timeout)
//   -> success: clear form, reload balance, reload history, notify
//   -> failure: notify with the ledger's reason, keep the form
//
// Administrator grants, project contributions and wallet claims share the
// same guard and timeout.
//
// The cached balance is never adjusted locally; the only way it changes is
// the reload after the ledger has answered.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use astra_core::{
    Astra, AstraError, ClaimCall, ResidentId, Severity, TransferCall, ValidationError,
};

use crate::balance::BalanceSnapshot;
use crate::client::LedgerClient;
use crate::collaborators::bounded;
use crate::resolver::RecipientResolver;

/// Note attached to administrator grants.
pub const ADMIN_GRANT_NOTE: &str = "Admin grant";

/// Note attached to project contributions.
pub const CONTRIBUTION_NOTE: &str = "Project contribution";

/// Inputs for one transfer attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferDraft {
    /// Resolved recipient; `None` if nothing was selected.
    pub recipient: Option<ResidentId>,
    /// Amount exactly as typed.
    pub amount: String,
    pub note: String,
}

/// Outcome of a completed mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub recipient: ResidentId,
    pub amount: Astra,
    /// Balance as reloaded from the ledger afterwards.
    pub balance: BalanceSnapshot,
}

/// Outcome of a confirmed wallet claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimReceipt {
    pub wallet: String,
    pub amount: Astra,
    pub balance: BalanceSnapshot,
}

#[derive(Debug, Default)]
struct FormFields {
    amount: String,
    note: String,
}

/// Releases the in-flight flag on every exit path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
pub struct TransferOrchestrator {
    ledger: Arc<LedgerClient>,
    resolver: Arc<RecipientResolver>,
    form: Mutex<FormFields>,
    in_flight: AtomicBool,
}

impl TransferOrchestrator {
    pub fn new(ledger: Arc<LedgerClient>, resolver: Arc<RecipientResolver>) -> Self {
        Self {
            ledger,
            resolver,
            form: Mutex::new(FormFields::default()),
            in_flight: AtomicBool::new(false),
        }
    }

    fn form(&self) -> MutexGuard<'_, FormFields> {
        match self.form.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn set_amount(&self, amount: &str) {
        self.form().amount = amount.to_string();
    }

    pub fn set_note(&self, note: &str) {
        self.form().note = note.to_string();
    }

    /// Current contents of the bound form.
    pub fn draft(&self) -> TransferDraft {
        let form = self.form();
        TransferDraft {
            recipient: self.resolver.resolved().map(|r| r.id),
            amount: form.amount.clone(),
            note: form.note.clone(),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Submit whatever the bound form currently holds.
    pub async fn submit_form(&self) -> Result<TransferReceipt, AstraError> {
        let draft = self.draft();
        self.send_tokens(draft).await
    }

    /// Validate and perform a transfer.
    ///
    /// # Errors
    /// - `TransferInFlight` while another mutation from this form runs.
    /// - `Validation` for any failed precondition; nothing is sent.
    /// - `Remote`, `Transport`, `Timeout` when the ledger did not confirm.
    /// - `Offline` when no ledger procedures are configured.
    pub async fn send_tokens(&self, draft: TransferDraft) -> Result<TransferReceipt, AstraError> {
        let _guard = self.begin()?;

        let result = self.execute_transfer(&draft).await;
        match &result {
            Ok(receipt) => {
                tracing::info!("Transfer of {} to {} confirmed", receipt.amount, receipt.recipient);
                self.notify(Severity::Success, &format!("Sent {}", receipt.amount));
            }
            Err(e) => self.report_failure("Transfer", e),
        }
        result
    }

    async fn execute_transfer(&self, draft: &TransferDraft) -> Result<TransferReceipt, AstraError> {
        let sender = self.acting_resident()?;
        let recipient = draft.recipient.ok_or(ValidationError::NoRecipient)?;
        let amount = Astra::parse(&draft.amount)?;
        self.check_balance(amount)?;

        self.call_transfer(TransferCall {
            from: sender,
            to: recipient,
            amount,
            note: draft.note.trim().to_string(),
            project_id: None,
        })
        .await?;

        self.clear_form();
        let balance = self.ledger.refresh().await;
        self.ledger
            .collaborators()
            .log_activity(
                "astra_transfer",
                &format!("Sent {} to {}", amount, recipient),
                serde_json::json!({ "to": recipient, "amount": amount.to_astr() }),
            )
            .await;

        Ok(TransferReceipt {
            recipient,
            amount,
            balance,
        })
    }

    /// Administrator credit to the first directory match for `recipient_name`.
    pub async fn admin_grant(
        &self,
        recipient_name: &str,
        amount: &str,
    ) -> Result<TransferReceipt, AstraError> {
        let _guard = self.begin()?;

        let result = self.execute_grant(recipient_name, amount).await;
        match &result {
            Ok(receipt) => self.notify(
                Severity::Success,
                &format!("Granted {} to {}", receipt.amount, recipient_name.trim()),
            ),
            Err(e) => self.report_failure("Grant", e),
        }
        result
    }

    async fn execute_grant(
        &self,
        recipient_name: &str,
        amount: &str,
    ) -> Result<TransferReceipt, AstraError> {
        let session = self.ledger.collaborators().session();
        let admin = session
            .acting_resident()
            .ok_or(ValidationError::NotAuthenticated)?;
        if !session.admin {
            return Err(ValidationError::NotAdmin.into());
        }
        let name = recipient_name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingField("recipient").into());
        }
        let amount = Astra::parse(amount)?;

        let recipient = self
            .resolver
            .search(name)
            .await
            .into_iter()
            .next()
            .ok_or_else(|| AstraError::NotFound(format!("resident matching {:?}", name)))?;

        self.call_transfer(TransferCall {
            from: admin,
            to: recipient.id,
            amount,
            note: ADMIN_GRANT_NOTE.to_string(),
            project_id: None,
        })
        .await?;

        let balance = self.ledger.refresh().await;
        self.ledger
            .collaborators()
            .log_activity(
                "astra_grant",
                &format!("Granted {} to {}", amount, recipient.display_name),
                serde_json::json!({ "to": recipient.id, "amount": amount.to_astr() }),
            )
            .await;

        Ok(TransferReceipt {
            recipient: recipient.id,
            amount,
            balance,
        })
    }

    /// Transfer into a shared project; the ledger credits its owner.
    pub async fn contribute(
        &self,
        project_id: &str,
        amount: &str,
    ) -> Result<TransferReceipt, AstraError> {
        let _guard = self.begin()?;

        let result = self.execute_contribution(project_id, amount).await;
        match &result {
            Ok(receipt) => self.notify(
                Severity::Success,
                &format!("Contributed {} to the project", receipt.amount),
            ),
            Err(e) => self.report_failure("Contribution", e),
        }
        result
    }

    async fn execute_contribution(
        &self,
        project_id: &str,
        amount: &str,
    ) -> Result<TransferReceipt, AstraError> {
        let sender = self.acting_resident()?;
        let amount = Astra::parse(amount)?;
        self.check_balance(amount)?;

        let store = self
            .ledger
            .collaborators()
            .store
            .clone()
            .ok_or_else(|| AstraError::Offline("no ledger store configured".to_string()))?;
        let owner = bounded(
            self.ledger.config().request_timeout(),
            store.project_owner(project_id),
        )
        .await?
        .ok_or_else(|| AstraError::NotFound(format!("project {}", project_id)))?;

        self.call_transfer(TransferCall {
            from: sender,
            to: owner,
            amount,
            note: CONTRIBUTION_NOTE.to_string(),
            project_id: Some(project_id.to_string()),
        })
        .await?;

        let balance = self.ledger.refresh().await;
        Ok(TransferReceipt {
            recipient: owner,
            amount,
            balance,
        })
    }

    /// Move off-chain Astra to the connected wallet.
    ///
    /// `amount` defaults to the whole verified balance. The ledger debits
    /// the balance; the display follows from the reload afterwards.
    pub async fn claim_to_wallet(&self, amount: Option<&str>) -> Result<ClaimReceipt, AstraError> {
        let _guard = self.begin()?;

        let result = self.execute_claim(amount).await;
        match &result {
            Ok(receipt) => {
                tracing::info!("Claim of {} to {} confirmed", receipt.amount, receipt.wallet);
                self.notify(
                    Severity::Success,
                    &format!("Claimed {} to {}", receipt.amount, receipt.wallet),
                );
            }
            Err(e) => self.report_failure("Claim", e),
        }
        self.ledger.show_wallet_status();
        result
    }

    async fn execute_claim(&self, amount: Option<&str>) -> Result<ClaimReceipt, AstraError> {
        let resident = self.acting_resident()?;
        let wallet = self
            .ledger
            .collaborators()
            .wallet_address()
            .ok_or(ValidationError::NoWallet)?;
        let amount = match amount {
            Some(text) => Astra::parse(text)?,
            None => self
                .ledger
                .balance_cell()
                .verified_amount()
                .ok_or(ValidationError::BalanceUnverified)?,
        };
        if amount.is_zero() {
            return Err(ValidationError::NothingToClaim.into());
        }
        self.check_balance(amount)?;

        let procedures = self
            .ledger
            .collaborators()
            .procedures
            .clone()
            .ok_or_else(|| AstraError::Offline("demo mode, claim not submitted".to_string()))?;
        self.notify(Severity::Info, &format!("Claiming {} to {}", amount, wallet));
        bounded(
            self.ledger.config().request_timeout(),
            procedures.claim_to_wallet(ClaimCall {
                resident,
                wallet: wallet.clone(),
                amount,
            }),
        )
        .await?
        .into_result()?;

        let balance = self.ledger.refresh().await;
        self.ledger
            .collaborators()
            .log_activity(
                "astra_claimed",
                &format!("Claimed {} to {}", amount, wallet),
                serde_json::json!({ "wallet": wallet, "amount": amount.to_astr() }),
            )
            .await;

        Ok(ClaimReceipt {
            wallet,
            amount,
            balance,
        })
    }

    fn begin(&self) -> Result<InFlightGuard<'_>, AstraError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Rejecting submission: a transfer is already in flight");
            self.notify(Severity::Info, "A transfer is already in progress");
            return Err(AstraError::TransferInFlight);
        }
        Ok(InFlightGuard(&self.in_flight))
    }

    fn acting_resident(&self) -> Result<ResidentId, AstraError> {
        self.ledger
            .collaborators()
            .session()
            .acting_resident()
            .ok_or_else(|| ValidationError::NotAuthenticated.into())
    }

    /// Compare against the last verified balance; a placeholder never
    /// authorizes spending.
    fn check_balance(&self, amount: Astra) -> Result<(), AstraError> {
        let available = self
            .ledger
            .balance_cell()
            .verified_amount()
            .ok_or(ValidationError::BalanceUnverified)?;
        if amount > available {
            return Err(ValidationError::InsufficientBalance {
                requested: amount,
                available,
            }
            .into());
        }
        Ok(())
    }

    async fn call_transfer(&self, call: TransferCall) -> Result<(), AstraError> {
        let procedures = self
            .ledger
            .collaborators()
            .procedures
            .clone()
            .ok_or_else(|| AstraError::Offline("demo mode, transfer not submitted".to_string()))?;

        tracing::debug!("Submitting transfer of {} to {}", call.amount, call.to);
        bounded(
            self.ledger.config().request_timeout(),
            procedures.transfer(call),
        )
        .await?
        .into_result()
    }

    fn clear_form(&self) {
        {
            let mut form = self.form();
            form.amount.clear();
            form.note.clear();
        }
        self.resolver.clear();
    }

    fn notify(&self, severity: Severity, message: &str) {
        self.ledger.collaborators().notify(severity, message);
    }

    fn report_failure(&self, what: &str, e: &AstraError) {
        let (severity, message) = match e {
            AstraError::Validation(v) => (Severity::Error, capitalize(&v.to_string())),
            AstraError::Remote(reason) => (Severity::Error, reason.clone()),
            AstraError::Timeout(_) => (
                Severity::Error,
                format!("{} timed out. Check your history before retrying.", what),
            ),
            AstraError::Offline(reason) => (Severity::Info, capitalize(reason)),
            AstraError::NotFound(what_missing) => {
                (Severity::Error, format!("Not found: {}", what_missing))
            }
            AstraError::TransferInFlight => return,
            _ => (Severity::Error, format!("{} failed. Please try again.", what)),
        };
        if !e.is_validation() {
            tracing::warn!("{} failed: {}", what, e);
        }
        self.notify(severity, &message);
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use astra_core::{ProcedureReply, Session};

    use crate::collaborators::Collaborators;
    use crate::config::LedgerConfig;
    use crate::memory::{
        InMemoryLedger, StaticSession, StaticWallet, CLAIM_PROCEDURE, TRANSFER_PROCEDURE,
    };

    const WALLET: &str = "0x9f2c04d1";

    fn setup(session: impl Fn(ResidentId) -> Session) -> (Arc<InMemoryLedger>, TransferOrchestrator, ResidentId, ResidentId) {
        let ledger = Arc::new(InMemoryLedger::new());
        let me = ledger.add_resident("Maya Neural", None, Astra::from_whole(300));
        let other = ledger.add_resident("Alex River", None, Astra::zero());
        let collab = Collaborators::new(Arc::new(StaticSession::new(session(me))))
            .with_backend(ledger.clone())
            .with_wallet(Arc::new(StaticWallet::new(Some(WALLET))));
        let config = LedgerConfig::default();
        let client = Arc::new(LedgerClient::new(collab.clone(), config.clone()));
        let resolver = Arc::new(RecipientResolver::new(collab, config));
        (ledger, TransferOrchestrator::new(client, resolver), me, other)
    }

    fn draft(to: Option<ResidentId>, amount: &str) -> TransferDraft {
        TransferDraft {
            recipient: to,
            amount: amount.to_string(),
            note: String::new(),
        }
    }

    #[tokio::test]
    async fn test_unverified_balance_blocks_transfer() {
        let (ledger, orch, _, other) = setup(Session::resident);
        let err = orch.send_tokens(draft(Some(other), "1")).await.unwrap_err();
        assert!(matches!(err, AstraError::Validation(ValidationError::BalanceUnverified)));
        assert_eq!(ledger.calls(TRANSFER_PROCEDURE), 0);
    }

    #[tokio::test]
    async fn test_unauthenticated_is_read_only() {
        let (ledger, orch, _, other) = setup(|id| Session {
            resident_id: Some(id),
            authenticated: false,
            admin: false,
        });
        orch.ledger.load_balance().await;
        let err = orch.send_tokens(draft(Some(other), "1")).await.unwrap_err();
        assert!(matches!(err, AstraError::Validation(ValidationError::NotAuthenticated)));
        assert_eq!(ledger.calls(TRANSFER_PROCEDURE), 0);
    }

    #[tokio::test]
    async fn test_guard_released_after_failure() {
        let (ledger, orch, _, other) = setup(Session::resident);
        orch.ledger.load_balance().await;
        ledger.script_reply(TRANSFER_PROCEDURE, ProcedureReply::failed("Recipient frozen"));

        let err = orch.send_tokens(draft(Some(other), "10")).await.unwrap_err();
        assert!(matches!(err, AstraError::Remote(ref m) if m == "Recipient frozen"));
        assert!(!orch.is_in_flight());

        ledger.clear_scripted(TRANSFER_PROCEDURE);
        assert!(orch.send_tokens(draft(Some(other), "10")).await.is_ok());
    }

    #[tokio::test]
    async fn test_failure_preserves_form() {
        let (ledger, orch, _, _) = setup(Session::resident);
        orch.ledger.load_balance().await;
        ledger.script_reply(TRANSFER_PROCEDURE, ProcedureReply::default());
        orch.set_amount("25");
        orch.set_note("rent");

        assert!(orch.submit_form().await.is_err());
        let kept = orch.draft();
        assert_eq!(kept.amount, "25");
        assert_eq!(kept.note, "rent");
    }

    #[tokio::test]
    async fn test_admin_grant_requires_admin() {
        let (ledger, orch, _, _) = setup(Session::resident);
        let err = orch.admin_grant("Alex", "5").await.unwrap_err();
        assert!(matches!(err, AstraError::Validation(ValidationError::NotAdmin)));
        assert_eq!(ledger.calls(TRANSFER_PROCEDURE), 0);
    }

    #[tokio::test]
    async fn test_admin_grant_credits_first_match() {
        let (ledger, orch, _, other) = setup(Session::admin);
        let receipt = orch.admin_grant("alex", "5").await.unwrap();
        assert_eq!(receipt.recipient, other);
        assert_eq!(ledger.balance_of(other), Some(Astra::from_whole(5)));
        assert_eq!(receipt.balance, BalanceSnapshot::verified(Astra::from_whole(295)));
    }

    #[tokio::test]
    async fn test_contribution_goes_to_project_owner() {
        let (ledger, orch, _, other) = setup(Session::resident);
        ledger.add_project("proj-quantum", other);
        orch.ledger.load_balance().await;

        let receipt = orch.contribute("proj-quantum", "50").await.unwrap();
        assert_eq!(receipt.recipient, other);
        assert_eq!(receipt.balance.amount, Astra::from_whole(250));

        let err = orch.contribute("proj-missing", "1").await.unwrap_err();
        assert!(matches!(err, AstraError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_claim_moves_balance_to_wallet() {
        let (ledger, orch, me, _) = setup(Session::resident);
        orch.ledger.load_balance().await;

        let receipt = orch.claim_to_wallet(Some("120")).await.unwrap();
        assert_eq!(receipt.wallet, WALLET);
        assert_eq!(receipt.balance, BalanceSnapshot::verified(Astra::from_whole(180)));
        assert_eq!(ledger.claimed_to(WALLET), Astra::from_whole(120));
        assert!(ledger.activity_events().contains(&"astra_claimed".to_string()));

        // Without an amount the whole remaining balance is claimed.
        let receipt = orch.claim_to_wallet(None).await.unwrap();
        assert_eq!(receipt.amount, Astra::from_whole(180));
        assert_eq!(ledger.balance_of(me), Some(Astra::zero()));

        let err = orch.claim_to_wallet(None).await.unwrap_err();
        assert!(matches!(err, AstraError::Validation(ValidationError::NothingToClaim)));
    }

    #[tokio::test]
    async fn test_claim_overdraw_rejected_without_network() {
        let (ledger, orch, me, _) = setup(Session::resident);
        orch.ledger.load_balance().await;

        let err = orch.claim_to_wallet(Some("300.5")).await.unwrap_err();
        assert!(matches!(
            err,
            AstraError::Validation(ValidationError::InsufficientBalance { .. })
        ));
        assert_eq!(ledger.calls(CLAIM_PROCEDURE), 0);
        assert_eq!(ledger.balance_of(me), Some(Astra::from_whole(300)));
    }

    #[tokio::test]
    async fn test_claim_requires_bound_wallet() {
        let ledger = Arc::new(InMemoryLedger::new());
        let me = ledger.add_resident("Maya Neural", None, Astra::from_whole(300));
        let collab = Collaborators::new(Arc::new(StaticSession::new(Session::resident(me))))
            .with_backend(ledger.clone())
            .with_wallet(Arc::new(StaticWallet::new(Some("  "))));
        let config = LedgerConfig::default();
        let client = Arc::new(LedgerClient::new(collab.clone(), config.clone()));
        let orch = TransferOrchestrator::new(client, Arc::new(RecipientResolver::new(collab, config)));
        orch.ledger.load_balance().await;

        let err = orch.claim_to_wallet(Some("1")).await.unwrap_err();
        assert!(matches!(err, AstraError::Validation(ValidationError::NoWallet)));
        assert_eq!(ledger.calls(CLAIM_PROCEDURE), 0);
    }

    #[tokio::test]
    async fn test_claim_only_explicit_success_counts() {
        let (ledger, orch, _, _) = setup(Session::resident);
        orch.ledger.load_balance().await;
        ledger.script_reply(CLAIM_PROCEDURE, ProcedureReply::default());

        let err = orch.claim_to_wallet(Some("10")).await.unwrap_err();
        assert!(matches!(err, AstraError::Remote(_)));
        assert!(!orch.is_in_flight());
        assert_eq!(ledger.claimed_to(WALLET), Astra::zero());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_claim_while_first_runs_is_rejected() {
        let (ledger, orch, _, _) = setup(Session::resident);
        orch.ledger.load_balance().await;
        ledger.set_latency(std::time::Duration::from_secs(2));
        let orch = Arc::new(orch);

        let first = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.claim_to_wallet(Some("50")).await })
        };
        tokio::task::yield_now().await;
        assert!(orch.is_in_flight());

        let err = orch.claim_to_wallet(Some("50")).await.unwrap_err();
        assert!(matches!(err, AstraError::TransferInFlight));

        assert!(first.await.unwrap().is_ok());
        assert_eq!(ledger.calls(CLAIM_PROCEDURE), 1);
        assert_eq!(ledger.claimed_to(WALLET), Astra::from_whole(50));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("select a recipient"), "Select a recipient");
        assert_eq!(capitalize(""), "");
    }
}
