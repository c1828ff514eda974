// crates/astra-core/src/procedure.rs
//
// Arguments and replies for the backend's ledger procedures. The transfer
// procedure is the sole mutator of balances; the client never writes a
// balance row directly.

use serde::{Deserialize, Serialize};

use crate::error::AstraError;
use crate::resident::ResidentId;
use crate::token::Astra;

/// Arguments for the atomic transfer procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferCall {
    pub from: ResidentId,
    pub to: ResidentId,
    pub amount: Astra,
    pub note: String,
    /// Set when the transfer is a contribution into a shared project.
    pub project_id: Option<String>,
}

/// Arguments for the activity reward procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardCall {
    pub resident: ResidentId,
    pub amount: Astra,
    pub kind: String,
    pub metadata: serde_json::Value,
}

/// Arguments for the governance vote procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteCall {
    pub proposal_id: String,
    pub voter: ResidentId,
    pub support: bool,
    pub weight: Astra,
}

/// Arguments for moving off-chain Astra to an on-chain wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimCall {
    pub resident: ResidentId,
    /// Wallet address as reported by the wallet provider.
    pub wallet: String,
    pub amount: Astra,
}

/// Raw reply of a ledger procedure.
///
/// Only an explicit `success: true` counts as success. A reply without a
/// `success` field is ambiguous and treated as failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureReply {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Message used when a failed reply carries no reason.
pub const GENERIC_FAILURE: &str = "the ledger rejected the request without a reason";

/// Message used for replies that are neither success nor failure.
pub const AMBIGUOUS_REPLY: &str = "the ledger returned an empty or ambiguous response";

impl ProcedureReply {
    pub fn ok() -> Self {
        Self {
            success: Some(true),
            error: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: Some(false),
            error: Some(reason.into()),
        }
    }

    /// Collapse the reply into a definitive outcome.
    pub fn into_result(self) -> Result<(), AstraError> {
        let reason = self.error.filter(|e| !e.trim().is_empty());
        match (self.success, reason) {
            (Some(true), _) => Ok(()),
            (Some(false), Some(reason)) => Err(AstraError::Remote(reason)),
            (Some(false), None) => Err(AstraError::Remote(GENERIC_FAILURE.to_string())),
            (None, Some(reason)) => Err(AstraError::Remote(reason)),
            (None, None) => Err(AstraError::Remote(AMBIGUOUS_REPLY.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_explicit_success_is_success() {
        assert!(ProcedureReply::ok().into_result().is_ok());

        let err = ProcedureReply::default().into_result().unwrap_err();
        assert!(matches!(err, AstraError::Remote(ref m) if m == AMBIGUOUS_REPLY));

        let reply: ProcedureReply = serde_json::from_str("{}").unwrap();
        assert!(reply.into_result().is_err());
    }

    #[test]
    fn test_failure_reason_is_kept_verbatim() {
        let err = ProcedureReply::failed("Insufficient funds").into_result().unwrap_err();
        assert!(matches!(err, AstraError::Remote(ref m) if m == "Insufficient funds"));

        let err = ProcedureReply::failed("  ").into_result().unwrap_err();
        assert!(matches!(err, AstraError::Remote(ref m) if m == GENERIC_FAILURE));
    }
}
