// crates/astra-ledger/src/governance.rs
//
// Governance: balance-weighted voting on proposals.
//
// Vote weight is the cached verified balance. A vote is shown immediately as
// a provisional tally, then reconciled against the backend: on success the
// proposals are reloaded, on failure the provisional weight is rolled back.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use astra_core::{Astra, AstraError, Proposal, Severity, ValidationError, VoteCall};

use crate::client::LedgerClient;
use crate::collaborators::{bounded, Collaborators};
use crate::view::{ElementKey, ProposalRow, View};

#[derive(Debug, Default)]
struct GovernanceState {
    proposals: Vec<Proposal>,
    /// proposal id -> (support, weight) applied locally but not confirmed.
    provisional: HashMap<String, (bool, Astra)>,
}

#[derive(Debug, Clone)]
pub struct Governance {
    ledger: Arc<LedgerClient>,
    state: Arc<Mutex<GovernanceState>>,
}

impl Governance {
    /// Create the module and keep the proposal list in step with the
    /// balance cell (the displayed vote weight).
    pub fn new(ledger: Arc<LedgerClient>) -> Self {
        let state = Arc::new(Mutex::new(GovernanceState::default()));

        let sub_state = state.clone();
        let sub_collab = ledger.collaborators().clone();
        ledger.balance_cell().subscribe(move |snapshot| {
            let weight = Some(snapshot.amount).filter(|_| snapshot.is_verified());
            render(&sub_collab, &lock(&sub_state), weight);
        });

        Self { ledger, state }
    }

    pub fn proposals(&self) -> Vec<Proposal> {
        lock(&self.state).proposals.clone()
    }

    /// Whether `proposal_id` currently carries an unconfirmed local vote.
    pub fn is_provisional(&self, proposal_id: &str) -> bool {
        lock(&self.state).provisional.contains_key(proposal_id)
    }

    /// Fetch proposals. Missing store or failure yields an empty list.
    pub async fn load_proposals(&self) -> Vec<Proposal> {
        let fetched = match &self.ledger.collaborators().proposals {
            Some(store) => {
                match bounded(self.ledger.config().request_timeout(), store.proposals()).await {
                    Ok(list) => list,
                    Err(e) => {
                        tracing::warn!("Proposal load failed: {}", e);
                        Vec::new()
                    }
                }
            }
            None => Vec::new(),
        };

        {
            let mut state = lock(&self.state);
            state.proposals = fetched.clone();
            state.provisional.clear();
        }
        self.render();
        fetched
    }

    /// Cast a vote weighted by the current verified balance.
    pub async fn vote(&self, proposal_id: &str, support: bool) -> Result<Astra, AstraError> {
        let collab = self.ledger.collaborators();
        let result = self.cast(proposal_id, support).await;
        match &result {
            Ok(_) => collab.notify(Severity::Success, "Vote recorded"),
            Err(AstraError::Validation(v)) => collab.notify(Severity::Error, &v.to_string()),
            Err(AstraError::Remote(reason)) => collab.notify(Severity::Error, reason),
            Err(e) => {
                tracing::warn!("Vote on {} failed: {}", proposal_id, e);
                collab.notify(Severity::Error, "Vote failed. Please try again.");
            }
        }
        result
    }

    async fn cast(&self, proposal_id: &str, support: bool) -> Result<Astra, AstraError> {
        let collab = self.ledger.collaborators();
        let voter = collab
            .session()
            .acting_resident()
            .ok_or(ValidationError::NotAuthenticated)?;
        let weight = self
            .ledger
            .balance_cell()
            .verified_amount()
            .ok_or(ValidationError::BalanceUnverified)?;
        if weight.is_zero() {
            return Err(ValidationError::NoVotingPower.into());
        }
        let procedures = collab
            .procedures
            .clone()
            .ok_or_else(|| AstraError::Offline("no ledger procedures configured".to_string()))?;

        self.apply_provisional(proposal_id, support, weight)?;
        collab.notify(Severity::Info, &format!("Recording vote (weight: {})", weight));

        let outcome = bounded(
            self.ledger.config().request_timeout(),
            procedures.cast_vote(VoteCall {
                proposal_id: proposal_id.to_string(),
                voter,
                support,
                weight,
            }),
        )
        .await
        .and_then(|reply| reply.into_result());

        if let Err(e) = outcome {
            self.roll_back(proposal_id);
            return Err(e);
        }

        collab
            .log_activity(
                "dao_vote",
                &format!("Voted {} on {}", if support { "YES" } else { "NO" }, proposal_id),
                serde_json::json!({ "weight": weight.to_astr() }),
            )
            .await;
        self.load_proposals().await;
        Ok(weight)
    }

    fn apply_provisional(&self, proposal_id: &str, support: bool, weight: Astra) -> Result<(), AstraError> {
        {
            let mut state = lock(&self.state);
            if state.provisional.contains_key(proposal_id) {
                return Err(ValidationError::VotePending.into());
            }
            let proposal = state
                .proposals
                .iter_mut()
                .find(|p| p.id == proposal_id)
                .ok_or_else(|| AstraError::NotFound(format!("proposal {}", proposal_id)))?;
            if !proposal.is_open(Utc::now()) {
                return Err(ValidationError::VotingClosed.into());
            }
            let tally = if support {
                &mut proposal.votes_for
            } else {
                &mut proposal.votes_against
            };
            *tally = tally.checked_add(weight).unwrap_or(*tally);
            state
                .provisional
                .insert(proposal_id.to_string(), (support, weight));
        }
        self.render();
        Ok(())
    }

    fn roll_back(&self, proposal_id: &str) {
        {
            let mut state = lock(&self.state);
            if let Some((support, weight)) = state.provisional.remove(proposal_id) {
                if let Some(proposal) = state.proposals.iter_mut().find(|p| p.id == proposal_id) {
                    let tally = if support {
                        &mut proposal.votes_for
                    } else {
                        &mut proposal.votes_against
                    };
                    *tally = tally.checked_sub(weight).unwrap_or_default();
                }
            }
        }
        self.render();
    }

    fn render(&self) {
        let weight = self.ledger.balance_cell().verified_amount();
        render(self.ledger.collaborators(), &lock(&self.state), weight);
    }
}

fn lock(state: &Mutex<GovernanceState>) -> MutexGuard<'_, GovernanceState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn render(collab: &Collaborators, state: &GovernanceState, vote_weight: Option<Astra>) {
    let rows = state
        .proposals
        .iter()
        .map(|p| ProposalRow {
            proposal: p.clone(),
            provisional: state.provisional.contains_key(&p.id),
        })
        .collect();
    collab.render(ElementKey::ProposalList, View::Proposals { rows, vote_weight });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use astra_core::{ProcedureReply, ProposalStatus, ResidentId, Session};

    use crate::config::LedgerConfig;
    use crate::markup::HtmlSurface;
    use crate::memory::{InMemoryLedger, StaticSession, VOTE_PROCEDURE};

    const PROPOSAL_ID: &str = "prop_01";

    fn proposal(id: &str) -> Proposal {
        Proposal {
            id: id.to_string(),
            title: "Quantum computing priority".to_string(),
            description: "Direct 30% of the R&D budget to quantum processors.".to_string(),
            votes_for: Astra::from_whole(12_500),
            votes_against: Astra::from_whole(4_200),
            status: ProposalStatus::Active,
            ends_at: Utc::now() + chrono::Duration::days(3),
        }
    }

    fn setup() -> (Arc<InMemoryLedger>, Governance, Arc<HtmlSurface>, ResidentId) {
        let ledger = Arc::new(InMemoryLedger::new());
        let me = ledger.add_resident("Maya Neural", None, Astra::from_whole(300));
        ledger.add_proposal(proposal(PROPOSAL_ID));
        let surface = Arc::new(HtmlSurface::new());
        let collab = Collaborators::new(Arc::new(StaticSession::new(Session::resident(me))))
            .with_backend(ledger.clone())
            .with_surface(surface.clone());
        let client = Arc::new(LedgerClient::new(collab, LedgerConfig::default()));
        (ledger, Governance::new(client), surface, me)
    }

    #[tokio::test]
    async fn test_vote_requires_verified_balance() {
        let (ledger, gov, _, _) = setup();
        gov.load_proposals().await;
        let err = gov.vote(PROPOSAL_ID, true).await.unwrap_err();
        assert!(matches!(err, AstraError::Validation(ValidationError::BalanceUnverified)));
        assert_eq!(ledger.calls(VOTE_PROCEDURE), 0);
    }

    #[tokio::test]
    async fn test_vote_is_weighted_and_reconciled() {
        let (_, gov, surface, _) = setup();
        gov.ledger.load_balance().await;
        gov.load_proposals().await;

        let weight = gov.vote(PROPOSAL_ID, true).await.unwrap();
        assert_eq!(weight, Astra::from_whole(300));
        let p = &gov.proposals()[0];
        assert_eq!(p.votes_for, Astra::from_whole(12_800));
        assert!(!gov.is_provisional(PROPOSAL_ID));
        let html = surface.markup(ElementKey::ProposalList).unwrap();
        assert!(html.contains("Voting power: 300 ASTR"));
        assert!(!html.contains("provisional"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_provisional_tally_shown_then_rolled_back() {
        let (ledger, gov, surface, _) = setup();
        gov.ledger.load_balance().await;
        gov.load_proposals().await;
        ledger.script_reply(VOTE_PROCEDURE, ProcedureReply::failed("Already voted"));
        ledger.set_latency(Duration::from_millis(500));

        let g = gov.clone();
        let pending = tokio::spawn(async move { g.vote(PROPOSAL_ID, false).await });
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(gov.is_provisional(PROPOSAL_ID));
        assert_eq!(gov.proposals()[0].votes_against, Astra::from_whole(4_500));
        assert!(surface.markup(ElementKey::ProposalList).unwrap().contains("provisional"));

        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, AstraError::Remote(ref m) if m == "Already voted"));
        assert!(!gov.is_provisional(PROPOSAL_ID));
        assert_eq!(gov.proposals()[0].votes_against, Astra::from_whole(4_200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_vote_while_pending_is_a_local_rejection() {
        let (ledger, gov, _, _) = setup();
        gov.ledger.load_balance().await;
        gov.load_proposals().await;
        ledger.set_latency(Duration::from_millis(500));

        let g = gov.clone();
        let pending = tokio::spawn(async move { g.vote(PROPOSAL_ID, true).await });
        tokio::time::sleep(Duration::from_millis(100)).await;

        let err = gov.vote(PROPOSAL_ID, true).await.unwrap_err();
        assert!(err.is_validation());
        assert!(matches!(err, AstraError::Validation(ValidationError::VotePending)));
        assert!(!err.to_string().contains("Remote"));

        assert!(pending.await.unwrap().is_ok());
        assert_eq!(ledger.calls(VOTE_PROCEDURE), 1);
        assert_eq!(gov.proposals()[0].votes_for, Astra::from_whole(12_800));
    }

    #[tokio::test]
    async fn test_closed_proposal_rejected_locally() {
        let (ledger, gov, _, _) = setup();
        let mut closed = proposal("prop_closed");
        closed.status = ProposalStatus::Closed;
        ledger.add_proposal(closed);
        gov.ledger.load_balance().await;
        gov.load_proposals().await;

        let err = gov.vote("prop_closed", true).await.unwrap_err();
        assert!(matches!(err, AstraError::Validation(ValidationError::VotingClosed)));
        assert_eq!(ledger.calls(VOTE_PROCEDURE), 0);
    }
}
