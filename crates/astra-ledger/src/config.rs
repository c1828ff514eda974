// crates/astra-ledger/src/config.rs
//
// Tunables for the ledger client. Deserializable so hosts can embed it in
// their own configuration files; every field has a default.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use astra_core::Astra;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Upper bound on any mutating remote call, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Quiet period after the last keystroke before a directory search.
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Shortest trimmed query that triggers a search.
    #[serde(default = "default_min_query_len")]
    pub min_query_len: usize,

    /// Maximum number of recipient suggestions.
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,

    /// How many transactions the history view loads.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Balance shown, marked unverified, when the ledger is unreachable.
    #[serde(default = "default_placeholder_balance")]
    pub placeholder_balance_astr: u64,

    /// Credit for publishing a post.
    #[serde(default = "default_post_reward")]
    pub post_reward_astr: u64,

    /// Credit for upvoting a post.
    #[serde(default = "default_upvote_reward")]
    pub upvote_reward_astr: u64,
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_search_debounce_ms() -> u64 {
    300
}

fn default_min_query_len() -> usize {
    2
}

fn default_suggestion_limit() -> usize {
    5
}

fn default_history_limit() -> usize {
    20
}

fn default_placeholder_balance() -> u64 {
    300
}

fn default_post_reward() -> u64 {
    5
}

fn default_upvote_reward() -> u64 {
    1
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            search_debounce_ms: default_search_debounce_ms(),
            min_query_len: default_min_query_len(),
            suggestion_limit: default_suggestion_limit(),
            history_limit: default_history_limit(),
            placeholder_balance_astr: default_placeholder_balance(),
            post_reward_astr: default_post_reward(),
            upvote_reward_astr: default_upvote_reward(),
        }
    }
}

impl LedgerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn placeholder_balance(&self) -> Astra {
        Astra::from_whole(self.placeholder_balance_astr)
    }
}
