// crates/astra-rpc/src/wire.rs
//
// Row and parameter shapes as they travel over the wire, and their
// conversion into astra-core types.
//
// The backend stores amounts as numeric ASTR; they are converted to integer
// micro units at this boundary and nowhere else.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use astra_core::{
    Astra, AstraError, ClaimCall, MarketStats, ProcedureReply, Proposal, ProposalStatus, Resident,
    ResidentId, RewardCall, Transaction, TransactionKind, TransferCall, VoteCall,
};

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct BalanceRow {
    pub balance: f64,
}

/// `display_name` embedded through a foreign key.
#[derive(Debug, Clone, Deserialize)]
pub struct NameEmbed {
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionRecord {
    pub id: serde_json::Value,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub from_id: Option<ResidentId>,
    pub to_id: ResidentId,
    #[serde(default)]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub from: Option<NameEmbed>,
    #[serde(default)]
    pub to: Option<NameEmbed>,
}

impl From<TransactionRecord> for Transaction {
    fn from(r: TransactionRecord) -> Self {
        Transaction {
            id: id_string(&r.id),
            amount: Astra::from_astr(r.amount),
            kind: TransactionKind::from(r.kind),
            from_id: r.from_id,
            to_id: r.to_id,
            from_name: r.from.and_then(|e| e.display_name),
            to_name: r.to.and_then(|e| e.display_name),
            note: r.note,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResidentRecord {
    pub id: ResidentId,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl From<ResidentRecord> for Resident {
    fn from(r: ResidentRecord) -> Self {
        Resident {
            id: r.id,
            display_name: r.display_name.unwrap_or_default(),
            role: r.role,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectRecord {
    #[serde(default)]
    pub created_by: Option<ResidentId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProposalRecord {
    pub id: serde_json::Value,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub votes_for: f64,
    #[serde(default)]
    pub votes_against: f64,
    pub status: String,
    pub ends_at: DateTime<Utc>,
}

impl From<ProposalRecord> for Proposal {
    fn from(r: ProposalRecord) -> Self {
        let status = match r.status.as_str() {
            "active" => ProposalStatus::Active,
            "passed" => ProposalStatus::Passed,
            "rejected" => ProposalStatus::Rejected,
            // Unknown states are not votable.
            _ => ProposalStatus::Closed,
        };
        Proposal {
            id: id_string(&r.id),
            title: r.title,
            description: r.description,
            votes_for: Astra::from_astr(r.votes_for),
            votes_against: Astra::from_astr(r.votes_against),
            status,
            ends_at: r.ends_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketStatsRecord {
    #[serde(default)]
    pub total_supply: f64,
    #[serde(default)]
    pub tx_count_24h: u64,
}

impl From<MarketStatsRecord> for MarketStats {
    fn from(r: MarketStatsRecord) -> Self {
        MarketStats {
            total_supply: Astra::from_astr(r.total_supply),
            tx_count_24h: r.tx_count_24h,
        }
    }
}

/// Ids come back as uuid strings or integers depending on the table.
fn id_string(id: &serde_json::Value) -> String {
    match id {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Procedure parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct TransferParams {
    pub p_from_id: ResidentId,
    pub p_to_id: ResidentId,
    pub p_amount: f64,
    pub p_note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p_project_id: Option<String>,
}

impl From<TransferCall> for TransferParams {
    fn from(c: TransferCall) -> Self {
        Self {
            p_from_id: c.from,
            p_to_id: c.to,
            p_amount: c.amount.to_astr(),
            p_note: c.note,
            p_project_id: c.project_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RewardParams {
    pub p_resident_id: ResidentId,
    pub p_amount: f64,
    pub p_type: String,
    pub p_metadata: serde_json::Value,
}

impl From<RewardCall> for RewardParams {
    fn from(c: RewardCall) -> Self {
        Self {
            p_resident_id: c.resident,
            p_amount: c.amount.to_astr(),
            p_type: c.kind,
            p_metadata: c.metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VoteParams {
    pub p_proposal_id: String,
    pub p_voter_id: ResidentId,
    pub p_support: bool,
    pub p_weight: f64,
}

impl From<VoteCall> for VoteParams {
    fn from(c: VoteCall) -> Self {
        Self {
            p_proposal_id: c.proposal_id,
            p_voter_id: c.voter,
            p_support: c.support,
            p_weight: c.weight.to_astr(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClaimParams {
    pub p_resident_id: ResidentId,
    pub p_wallet: String,
    pub p_amount: f64,
}

impl From<ClaimCall> for ClaimParams {
    fn from(c: ClaimCall) -> Self {
        Self {
            p_resident_id: c.resident,
            p_wallet: c.wallet,
            p_amount: c.amount.to_astr(),
        }
    }
}

/// Row inserted into `system_logs`.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub event_type: String,
    pub user_id: Option<ResidentId>,
    pub metadata: serde_json::Value,
}

impl LogEntry {
    /// The message is stored inside `metadata` next to the caller's keys.
    pub fn new(
        event: &str,
        message: &str,
        user_id: Option<ResidentId>,
        metadata: serde_json::Value,
    ) -> Self {
        let mut merged = match metadata {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => serde_json::Map::new(),
            other => {
                let mut map = serde_json::Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        merged.insert(
            "message".to_string(),
            serde_json::Value::String(message.to_string()),
        );
        Self {
            event_type: event.to_string(),
            user_id,
            metadata: serde_json::Value::Object(merged),
        }
    }
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// Decode a procedure's response body.
///
/// Procedures declared `void` answer with an empty body or `null`; for those
/// (`void_ok`) that is a success. For every other procedure it is ambiguous.
pub fn decode_reply(body: &str, void_ok: bool) -> Result<ProcedureReply, AstraError> {
    let trimmed = body.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(if void_ok {
            ProcedureReply::ok()
        } else {
            ProcedureReply::default()
        });
    }
    match serde_json::from_str::<serde_json::Value>(trimmed)? {
        serde_json::Value::Object(map) => {
            Ok(serde_json::from_value(serde_json::Value::Object(map))?)
        }
        // A bare scalar is not a reply we understand.
        _ => Ok(ProcedureReply::default()),
    }
}

/// Error body returned with a non-2xx status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

/// PostgREST `ilike` pattern for a substring match.
///
/// Characters with meaning in filter syntax or patterns are dropped, so a
/// typed `*` cannot widen the match and a `,` cannot split the filter.
pub fn ilike_pattern(query: &str) -> String {
    let cleaned: String = query
        .trim()
        .chars()
        .filter(|c| !matches!(c, '*' | '%' | ',' | '(' | ')' | '"' | '\\'))
        .collect();
    format!("ilike.*{}*", cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_with_embeds() {
        let json = r#"{
            "id": "6a1d8c3e-0000-7000-8000-000000000001",
            "amount": 150.5,
            "type": "transfer",
            "from_id": "01890a5d-ac96-774b-bcce-b302099a8057",
            "to_id": "01890a5d-ac96-774b-bcce-b302099a8058",
            "note": "thanks",
            "created_at": "2026-03-01T12:00:00Z",
            "from": {"display_name": "Maya Neural"},
            "to": {"display_name": "Alex River"}
        }"#;
        let tx: Transaction = serde_json::from_str::<TransactionRecord>(json).unwrap().into();
        assert_eq!(tx.amount, Astra::from_micro(150_500_000));
        assert_eq!(tx.kind, TransactionKind::Transfer);
        assert_eq!(tx.from_name.as_deref(), Some("Maya Neural"));
        assert_eq!(tx.to_name.as_deref(), Some("Alex River"));
    }

    #[test]
    fn test_grant_without_sender() {
        let json = r#"{
            "id": 42,
            "amount": 300,
            "type": "admin_grant",
            "from_id": null,
            "to_id": "01890a5d-ac96-774b-bcce-b302099a8058",
            "created_at": "2026-03-01T12:00:00Z",
            "from": null,
            "to": {"display_name": null}
        }"#;
        let tx: Transaction = serde_json::from_str::<TransactionRecord>(json).unwrap().into();
        assert_eq!(tx.id, "42");
        assert_eq!(tx.kind, TransactionKind::AdminGrant);
        assert!(tx.from_id.is_none() && tx.from_name.is_none() && tx.to_name.is_none());
    }

    #[test]
    fn test_transfer_params_omit_missing_project() {
        let call = TransferCall {
            from: ResidentId::new_v7(),
            to: ResidentId::new_v7(),
            amount: Astra::from_micro(2_500_000),
            note: "rent".to_string(),
            project_id: None,
        };
        let value = serde_json::to_value(TransferParams::from(call)).unwrap();
        assert_eq!(value["p_amount"], serde_json::json!(2.5));
        assert!(value.get("p_project_id").is_none());
    }

    #[test]
    fn test_decode_reply() {
        assert_eq!(decode_reply(r#"{"success": true}"#, false).unwrap(), ProcedureReply::ok());
        assert_eq!(
            decode_reply(r#"{"success": false, "error": "Insufficient funds"}"#, false).unwrap(),
            ProcedureReply::failed("Insufficient funds")
        );
        assert_eq!(decode_reply("", false).unwrap(), ProcedureReply::default());
        assert_eq!(decode_reply("null", true).unwrap(), ProcedureReply::ok());
        assert_eq!(decode_reply("true", false).unwrap(), ProcedureReply::default());
        assert!(decode_reply("{not json", false).is_err());
    }

    #[test]
    fn test_unknown_proposal_status_is_closed() {
        let json = r#"{"id": 7, "title": "t", "status": "archived", "ends_at": "2026-03-01T12:00:00Z"}"#;
        let p: Proposal = serde_json::from_str::<ProposalRecord>(json).unwrap().into();
        assert_eq!(p.status, ProposalStatus::Closed);
        assert_eq!(p.votes_for, Astra::zero());
    }

    #[test]
    fn test_log_entry_merges_message() {
        let entry = LogEntry::new("astra_transfer", "Sent 5 ASTR", None, serde_json::json!({"amount": 5}));
        assert_eq!(entry.metadata["message"], "Sent 5 ASTR");
        assert_eq!(entry.metadata["amount"], 5);
    }

    #[test]
    fn test_ilike_pattern_strips_syntax() {
        assert_eq!(ilike_pattern(" al "), "ilike.*al*");
        assert_eq!(ilike_pattern("a*l,(x)"), "ilike.*alx*");
    }
}
