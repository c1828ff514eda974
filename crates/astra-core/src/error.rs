// crates/astra-core/src/error.rs

use std::time::Duration;

use thiserror::Error;

use crate::token::Astra;

/// Error types for the Astra ledger client.
#[derive(Debug, Error)]
pub enum AstraError {
    /// Rejected client-side before any network call.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The backend answered with an explicit failure.
    #[error("Remote error: {0}")]
    Remote(String),

    /// The request never produced a usable answer (network, HTTP status, decoding).
    #[error("Transport error: {0}")]
    Transport(String),

    /// A remote call did not complete within the configured timeout.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The collaborator needed for this operation is not configured.
    #[error("Offline: {0}")]
    Offline(String),

    /// A transfer from the same form is still in flight.
    #[error("A transfer is already in progress")]
    TransferInFlight,

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid or unreadable configuration.
    #[error("Config error: {0}")]
    Config(String),
}

/// Preconditions checked before a ledger mutation is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("sign in to send Astra")]
    NotAuthenticated,

    #[error("only administrators can grant Astra")]
    NotAdmin,

    #[error("select a recipient from the suggestions")]
    NoRecipient,

    #[error("enter a positive amount (got {0:?})")]
    InvalidAmount(String),

    #[error("amounts have at most six decimal places (got {0:?})")]
    TooManyDecimals(String),

    #[error("balance is not verified yet, reload and try again")]
    BalanceUnverified,

    #[error("insufficient balance: {requested} requested, {available} available")]
    InsufficientBalance { requested: Astra, available: Astra },

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("only Astra holders can vote")]
    NoVotingPower,

    #[error("voting on this proposal is closed")]
    VotingClosed,

    #[error("your vote on this proposal is still being recorded")]
    VotePending,

    #[error("connect a wallet in your profile first")]
    NoWallet,

    #[error("nothing to claim")]
    NothingToClaim,
}

impl From<serde_json::Error> for AstraError {
    fn from(e: serde_json::Error) -> Self {
        AstraError::Serialization(e.to_string())
    }
}

impl AstraError {
    /// Whether the failure was decided locally without touching the backend.
    pub fn is_validation(&self) -> bool {
        matches!(self, AstraError::Validation(_))
    }
}
