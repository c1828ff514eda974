// crates/astra-ledger/src/lib.rs
//
// astra-ledger: the client-side logic of the Astra resident ledger.
//
// The ledger itself (balances, transfers, rewards, votes) lives in a hosted
// backend reached through the collaborator traits in astra-core. This crate
// keeps a cached balance, resolves recipients from typed text, guards and
// reconciles mutations, and renders what it knows into a display surface.

pub mod balance;
pub mod client;
pub mod collaborators;
pub mod config;
pub mod governance;
pub mod markup;
pub mod memory;
pub mod resolver;
pub mod rewards;
pub mod transfer;
pub mod view;

// Re-export key types for ergonomic access from downstream crates.
pub use balance::{BalanceCell, BalanceSnapshot, BalanceSource};
pub use client::LedgerClient;
pub use collaborators::Collaborators;
pub use config::LedgerConfig;
pub use governance::Governance;
pub use markup::{render_view, HtmlSurface};
pub use memory::{
    InMemoryLedger, StaticSession, StaticWallet, CLAIM_PROCEDURE, MARKET_STATS_PROCEDURE,
    REWARD_PROCEDURE, TRANSFER_PROCEDURE, VOTE_PROCEDURE,
};
pub use resolver::{RecipientResolver, ResolvedRecipient, SearchOutcome};
pub use rewards::{ActivityKind, RewardHook};
pub use transfer::{
    ClaimReceipt, TransferDraft, TransferOrchestrator, TransferReceipt, ADMIN_GRANT_NOTE, CONTRIBUTION_NOTE,
};
pub use view::{DisplaySurface, ElementKey, ProposalRow, TransactionRow, View};
