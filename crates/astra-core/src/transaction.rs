// crates/astra-core/src/transaction.rs
//
// Ledger transaction records. Transactions are append-only and are only
// ever created by the backend's transfer/reward/grant procedures; the client
// reads them and never synthesizes, mutates, or deletes one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::resident::ResidentId;
use crate::token::Astra;

/// Kind of ledger movement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionKind {
    /// Peer-to-peer transfer between residents.
    Transfer,
    /// Transfer into a shared project.
    ProjectContribution,
    /// Credit issued by an administrator.
    AdminGrant,
    /// System-initiated credit for an in-app action.
    Reward,
    /// Any kind this client does not know yet, kept verbatim.
    Other(String),
}

impl TransactionKind {
    pub fn as_str(&self) -> &str {
        match self {
            TransactionKind::Transfer => "transfer",
            TransactionKind::ProjectContribution => "project_contribution",
            TransactionKind::AdminGrant => "admin_grant",
            TransactionKind::Reward => "reward",
            TransactionKind::Other(s) => s,
        }
    }

    /// Human-readable label for history listings.
    pub fn label(&self) -> &str {
        match self {
            TransactionKind::Transfer => "Transfer",
            TransactionKind::ProjectContribution => "Project contribution",
            TransactionKind::AdminGrant => "Grant",
            TransactionKind::Reward => "Reward",
            TransactionKind::Other(s) => s,
        }
    }
}

impl From<String> for TransactionKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "transfer" => TransactionKind::Transfer,
            "project_contribution" => TransactionKind::ProjectContribution,
            "admin_grant" => TransactionKind::AdminGrant,
            "reward" => TransactionKind::Reward,
            _ => TransactionKind::Other(s),
        }
    }
}

impl From<TransactionKind> for String {
    fn from(kind: TransactionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable ledger record, decorated with counterparty names when the
/// backend supplies them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    /// Always positive.
    pub amount: Astra,
    pub kind: TransactionKind,
    /// Absent for system-originated credits.
    pub from_id: Option<ResidentId>,
    pub to_id: ResidentId,
    pub from_name: Option<String>,
    pub to_name: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Direction of a transaction relative to the viewing resident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl Transaction {
    pub fn direction_for(&self, viewer: ResidentId) -> Direction {
        if self.to_id == viewer {
            Direction::Incoming
        } else {
            Direction::Outgoing
        }
    }

    /// Display name of the other side, `"System"` for system credits.
    pub fn counterparty_name(&self, viewer: ResidentId) -> &str {
        let name = match self.direction_for(viewer) {
            Direction::Incoming => self.from_name.as_deref(),
            Direction::Outgoing => self.to_name.as_deref(),
        };
        name.unwrap_or("System")
    }
}

/// Aggregate ledger figures published by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketStats {
    pub total_supply: Astra,
    pub tx_count_24h: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(from: Option<ResidentId>, to: ResidentId) -> Transaction {
        Transaction {
            id: "tx-1".to_string(),
            amount: Astra::from_whole(10),
            kind: TransactionKind::Transfer,
            from_id: from,
            to_id: to,
            from_name: from.map(|_| "Alex River".to_string()),
            to_name: Some("Alice Park".to_string()),
            note: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_kind_roundtrip_keeps_unknown_verbatim() {
        let kind: TransactionKind = serde_json::from_str("\"airdrop\"").unwrap();
        assert_eq!(kind, TransactionKind::Other("airdrop".to_string()));
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"airdrop\"");

        let kind: TransactionKind = serde_json::from_str("\"project_contribution\"").unwrap();
        assert_eq!(kind, TransactionKind::ProjectContribution);
    }

    #[test]
    fn test_direction_and_counterparty() {
        let me = ResidentId::new_v7();
        let other = ResidentId::new_v7();

        let incoming = tx(Some(other), me);
        assert_eq!(incoming.direction_for(me), Direction::Incoming);
        assert_eq!(incoming.counterparty_name(me), "Alex River");

        let outgoing = tx(Some(me), other);
        assert_eq!(outgoing.direction_for(me), Direction::Outgoing);
        assert_eq!(outgoing.counterparty_name(me), "Alice Park");

        let system = tx(None, me);
        assert_eq!(system.counterparty_name(me), "System");
    }
}
