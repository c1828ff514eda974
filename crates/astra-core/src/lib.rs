// crates/astra-core/src/lib.rs
//
// astra-core: Core types, collaborator traits, and errors for the Astra
// resident ledger client.
//
// This is the leaf crate that the rest of the workspace depends on. It
// defines amounts, residents and sessions, transaction and proposal records,
// procedure call/reply shapes, and the trait interfaces behind which the
// hosted backend and the host page live.

pub mod error;
pub mod governance;
pub mod procedure;
pub mod resident;
pub mod token;
pub mod traits;
pub mod transaction;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use astra_core::Astra;`

pub use error::{AstraError, ValidationError};
pub use governance::{Proposal, ProposalStatus};
pub use procedure::{ClaimCall, ProcedureReply, RewardCall, TransferCall, VoteCall};
pub use resident::{Resident, ResidentId, Session};
pub use token::{Astra, MICRO_PER_ASTR};
pub use transaction::{Direction, MarketStats, Transaction, TransactionKind};

pub use traits::{
    ActivityLog, LedgerProcedures, LedgerStore, NotificationSink, ProposalStore,
    ResidentDirectory, SessionProvider, Severity, WalletProvider,
};
