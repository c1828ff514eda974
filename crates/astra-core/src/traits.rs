// crates/astra-core/src/traits.rs
//
// Collaborator contracts. The ledger client is written against these and
// receives implementations at construction time; a missing collaborator is
// a configuration fact (degraded mode), not something probed at runtime.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AstraError;
use crate::governance::Proposal;
use crate::procedure::{ClaimCall, ProcedureReply, RewardCall, TransferCall, VoteCall};
use crate::resident::{Resident, ResidentId, Session};
use crate::token::Astra;
use crate::transaction::{MarketStats, Transaction};

/// Supplies the current resident and whether they are signed in.
///
/// Implemented by astra-rpc (static token session) and by tests.
pub trait SessionProvider: Send + Sync {
    fn session(&self) -> Session;
}

/// Read access to the backend's balance and transaction tables.
///
/// Implemented by astra-rpc (REST tables) and astra-ledger (in-memory).
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Authoritative balance of `resident`. `Ok(None)` when no row exists yet.
    async fn balance(&self, resident: ResidentId) -> Result<Option<Astra>, AstraError>;

    /// Most recent transactions involving `resident`, newest first.
    async fn transactions(
        &self,
        resident: ResidentId,
        limit: usize,
    ) -> Result<Vec<Transaction>, AstraError>;

    /// Owner of a shared project; contributions are transferred to them.
    async fn project_owner(&self, project_id: &str) -> Result<Option<ResidentId>, AstraError>;
}

/// Remote procedures. These are the only ledger mutators.
#[async_trait]
pub trait LedgerProcedures: Send + Sync {
    async fn transfer(&self, call: TransferCall) -> Result<ProcedureReply, AstraError>;

    async fn reward(&self, call: RewardCall) -> Result<ProcedureReply, AstraError>;

    async fn market_stats(&self) -> Result<MarketStats, AstraError>;

    async fn cast_vote(&self, call: VoteCall) -> Result<ProcedureReply, AstraError>;

    /// Debit the off-chain balance for a claim to `call.wallet`.
    async fn claim_to_wallet(&self, call: ClaimCall) -> Result<ProcedureReply, AstraError>;
}

/// The resident's connected on-chain wallet, if any.
///
/// Implemented by the host (browser wallet, configured address) and by tests.
pub trait WalletProvider: Send + Sync {
    fn wallet_address(&self) -> Option<String>;
}

/// Name-substring search over residents.
#[async_trait]
pub trait ResidentDirectory: Send + Sync {
    /// Case-insensitive substring match on display name, skipping `exclude`,
    /// returning at most `limit` entries.
    async fn search(
        &self,
        query: &str,
        exclude: Option<ResidentId>,
        limit: usize,
    ) -> Result<Vec<Resident>, AstraError>;
}

/// Source of governance proposals.
#[async_trait]
pub trait ProposalStore: Send + Sync {
    async fn proposals(&self) -> Result<Vec<Proposal>, AstraError>;
}

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Success,
    Error,
    Info,
}

/// Fire-and-forget "show message". Rendering is owned by the host.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, severity: Severity, message: &str);
}

/// Audit trail for notable client actions. Failures are the sink's problem.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn record(&self, event: &str, message: &str, metadata: serde_json::Value);
}
