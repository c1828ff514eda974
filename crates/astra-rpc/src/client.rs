// crates/astra-rpc/src/client.rs
//
// RestClient: the hosted backend's tables and procedures over HTTP.
//
// Tables are read through PostgREST-style query strings; every mutation goes
// through a remote procedure under `/rpc/`. Every request carries the public
// `apikey` header and a bearer token (the user's when signed in).

use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use astra_core::{
    ActivityLog, Astra, AstraError, ClaimCall, LedgerProcedures, LedgerStore, MarketStats, ProcedureReply,
    Proposal, ProposalStore, Resident, ResidentDirectory, ResidentId, RewardCall, Transaction,
    TransferCall, VoteCall,
};

use crate::config::{RestConfig, TokenSession};
use crate::error::RestError;
use crate::wire::{
    decode_reply, ilike_pattern, BalanceRow, ClaimParams, ErrorBody, LogEntry, MarketStatsRecord,
    ProjectRecord, ProposalRecord, ResidentRecord, RewardParams, TransactionRecord,
    TransferParams, VoteParams,
};

pub const BALANCES_TABLE: &str = "astra_balances";
pub const TRANSACTIONS_TABLE: &str = "astra_transactions";
pub const RESIDENTS_TABLE: &str = "residents";
pub const PROJECTS_TABLE: &str = "shared_projects";
pub const PROPOSALS_TABLE: &str = "dao_proposals";
pub const LOGS_TABLE: &str = "system_logs";

pub const TRANSFER_PROCEDURE: &str = "transfer_astra";
pub const REWARD_PROCEDURE: &str = "reward_astra_activity";
pub const MARKET_STATS_PROCEDURE: &str = "get_astra_market_stats";
pub const VOTE_PROCEDURE: &str = "cast_dao_vote";
pub const CLAIM_PROCEDURE: &str = "claim_astra_to_wallet";

/// Transactions with both counterparties' display names embedded.
const TRANSACTION_SELECT: &str = "*,from:residents!astra_transactions_from_id_fkey(display_name),\
to:residents!astra_transactions_to_id_fkey(display_name)";

type Query = Vec<(&'static str, String)>;

#[derive(Debug, Clone)]
pub struct RestClient {
    config: RestConfig,
    http: reqwest::Client,
}

impl RestClient {
    pub fn new(config: RestConfig) -> Result<Self, AstraError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AstraError::Config(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    /// Session implied by the configured token.
    pub fn session(&self) -> TokenSession {
        TokenSession::from_config(&self.config)
    }

    pub fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.config.rest_root(), table)
    }

    pub fn rpc_url(&self, procedure: &str) -> String {
        format!("{}/rpc/{}", self.config.rest_root(), procedure)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.config.anon_key)
            .header(header::AUTHORIZATION, self.config.bearer())
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, query: Query) -> Result<Vec<T>, RestError> {
        tracing::debug!("GET {} {:?}", table, query);
        let resp = self
            .request(Method::GET, self.table_url(table))
            .query(&query)
            .send()
            .await?;
        let body = read_body(resp).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn call<P: Serialize>(&self, procedure: &str, params: &P) -> Result<String, RestError> {
        tracing::debug!("POST rpc/{}", procedure);
        let resp = self
            .request(Method::POST, self.rpc_url(procedure))
            .json(params)
            .send()
            .await?;
        read_body(resp).await
    }
}

/// Body of a 2xx response, or the backend's error message.
async fn read_body(resp: Response) -> Result<String, RestError> {
    let status = resp.status();
    let body = resp.text().await?;
    if status.is_success() {
        return Ok(body);
    }
    let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
    let message = parsed
        .message
        .filter(|m| !m.trim().is_empty())
        .or(parsed.hint)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
    Err(RestError::Status {
        status: status.as_u16(),
        message,
    })
}

// ---------------------------------------------------------------------------
// Query strings
// ---------------------------------------------------------------------------

pub fn balance_query(resident: ResidentId) -> Query {
    vec![
        ("select", "balance".to_string()),
        ("resident_id", format!("eq.{}", resident)),
    ]
}

pub fn transactions_query(resident: ResidentId, limit: usize) -> Query {
    vec![
        ("select", TRANSACTION_SELECT.to_string()),
        ("or", format!("(from_id.eq.{0},to_id.eq.{0})", resident)),
        ("order", "created_at.desc".to_string()),
        ("limit", limit.to_string()),
    ]
}

pub fn search_query(query: &str, exclude: Option<ResidentId>, limit: usize) -> Query {
    let mut q = vec![
        ("select", "id,display_name,role".to_string()),
        ("display_name", ilike_pattern(query)),
    ];
    if let Some(me) = exclude {
        q.push(("id", format!("neq.{}", me)));
    }
    q.push(("order", "display_name.asc".to_string()));
    q.push(("limit", limit.to_string()));
    q
}

pub fn project_query(project_id: &str) -> Query {
    vec![
        ("select", "created_by".to_string()),
        ("id", format!("eq.{}", project_id)),
        ("limit", "1".to_string()),
    ]
}

pub fn proposals_query() -> Query {
    vec![
        ("select", "*".to_string()),
        ("order", "ends_at.asc".to_string()),
    ]
}

// ---------------------------------------------------------------------------
// Collaborator implementations
// ---------------------------------------------------------------------------

#[async_trait]
impl LedgerStore for RestClient {
    async fn balance(&self, resident: ResidentId) -> Result<Option<Astra>, AstraError> {
        let rows: Vec<BalanceRow> = self.select(BALANCES_TABLE, balance_query(resident)).await?;
        Ok(rows.first().map(|row| Astra::from_astr(row.balance)))
    }

    async fn transactions(
        &self,
        resident: ResidentId,
        limit: usize,
    ) -> Result<Vec<Transaction>, AstraError> {
        let rows: Vec<TransactionRecord> = self
            .select(TRANSACTIONS_TABLE, transactions_query(resident, limit))
            .await?;
        Ok(rows.into_iter().map(Transaction::from).collect())
    }

    async fn project_owner(&self, project_id: &str) -> Result<Option<ResidentId>, AstraError> {
        let rows: Vec<ProjectRecord> = self.select(PROJECTS_TABLE, project_query(project_id)).await?;
        Ok(rows.into_iter().next().and_then(|p| p.created_by))
    }
}

#[async_trait]
impl LedgerProcedures for RestClient {
    async fn transfer(&self, call: TransferCall) -> Result<ProcedureReply, AstraError> {
        let body = self.call(TRANSFER_PROCEDURE, &TransferParams::from(call)).await?;
        decode_reply(&body, false)
    }

    async fn reward(&self, call: RewardCall) -> Result<ProcedureReply, AstraError> {
        // Declared void on the backend: an empty 2xx is the confirmation.
        let body = self.call(REWARD_PROCEDURE, &RewardParams::from(call)).await?;
        decode_reply(&body, true)
    }

    async fn market_stats(&self) -> Result<MarketStats, AstraError> {
        let body = self.call(MARKET_STATS_PROCEDURE, &serde_json::json!({})).await?;
        // Set-returning functions answer with an array of one row.
        let value = match serde_json::from_str::<serde_json::Value>(&body)? {
            serde_json::Value::Array(mut rows) if !rows.is_empty() => rows.swap_remove(0),
            other => other,
        };
        let record: MarketStatsRecord = serde_json::from_value(value)?;
        Ok(record.into())
    }

    async fn cast_vote(&self, call: VoteCall) -> Result<ProcedureReply, AstraError> {
        let body = self.call(VOTE_PROCEDURE, &VoteParams::from(call)).await?;
        decode_reply(&body, false)
    }

    async fn claim_to_wallet(&self, call: ClaimCall) -> Result<ProcedureReply, AstraError> {
        let body = self.call(CLAIM_PROCEDURE, &ClaimParams::from(call)).await?;
        decode_reply(&body, false)
    }
}

#[async_trait]
impl ResidentDirectory for RestClient {
    async fn search(
        &self,
        query: &str,
        exclude: Option<ResidentId>,
        limit: usize,
    ) -> Result<Vec<Resident>, AstraError> {
        let rows: Vec<ResidentRecord> = self
            .select(RESIDENTS_TABLE, search_query(query, exclude, limit))
            .await?;
        Ok(rows.into_iter().map(Resident::from).collect())
    }
}

#[async_trait]
impl ProposalStore for RestClient {
    async fn proposals(&self) -> Result<Vec<Proposal>, AstraError> {
        let rows: Vec<ProposalRecord> = self.select(PROPOSALS_TABLE, proposals_query()).await?;
        Ok(rows.into_iter().map(Proposal::from).collect())
    }
}

#[async_trait]
impl ActivityLog for RestClient {
    async fn record(&self, event: &str, message: &str, metadata: serde_json::Value) {
        let entry = LogEntry::new(event, message, self.config.resident_id, metadata);
        let sent = self
            .request(Method::POST, self.table_url(LOGS_TABLE))
            .header("Prefer", "return=minimal")
            .json(&entry)
            .send()
            .await;
        let outcome = match sent {
            Ok(resp) => read_body(resp).await.map(|_| ()),
            Err(e) => Err(e.into()),
        };
        if let Err(e) = outcome {
            tracing::debug!("Activity log entry {} dropped: {}", event, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use astra_core::SessionProvider;

    fn client() -> RestClient {
        RestClient::new(RestConfig::new("https://ledger.example.co", "anon")).unwrap()
    }

    fn value<'a>(query: &'a Query, key: &str) -> Option<&'a str> {
        query.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_urls() {
        let c = client();
        assert_eq!(
            c.table_url(BALANCES_TABLE),
            "https://ledger.example.co/rest/v1/astra_balances"
        );
        assert_eq!(
            c.rpc_url(TRANSFER_PROCEDURE),
            "https://ledger.example.co/rest/v1/rpc/transfer_astra"
        );
    }

    #[test]
    fn test_transactions_query_matches_either_side() {
        let me = ResidentId::new_v7();
        let q = transactions_query(me, 20);
        assert_eq!(value(&q, "or"), Some(format!("(from_id.eq.{0},to_id.eq.{0})", me).as_str()));
        assert_eq!(value(&q, "order"), Some("created_at.desc"));
        assert_eq!(value(&q, "limit"), Some("20"));
        assert!(value(&q, "select").unwrap().contains("from:residents!"));
    }

    #[test]
    fn test_search_query_excludes_self() {
        let me = ResidentId::new_v7();
        let q = search_query("al", Some(me), 5);
        assert_eq!(value(&q, "display_name"), Some("ilike.*al*"));
        assert_eq!(value(&q, "id"), Some(format!("neq.{}", me).as_str()));
        assert_eq!(value(&q, "limit"), Some("5"));

        assert!(value(&search_query("al", None, 5), "id").is_none());
    }

    #[test]
    fn test_session_from_client() {
        let me = ResidentId::new_v7();
        let c = RestClient::new(RestConfig::new("http://x", "anon").with_access_token("jwt", me)).unwrap();
        assert_eq!(c.session().session().acting_resident(), Some(me));
    }
}
