// crates/astra-rpc/src/config.rs
//
// Connection settings for the hosted ledger backend.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use astra_core::{ResidentId, Session, SessionProvider};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`. `/rest/v1` is appended.
    pub base_url: String,

    /// Public API key sent as `apikey` on every request.
    pub anon_key: String,

    /// Signed-in user's token. Without one the session is read-only.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Resident the token belongs to.
    #[serde(default)]
    pub resident_id: Option<ResidentId>,

    #[serde(default)]
    pub admin: bool,

    /// Client-level HTTP timeout, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    15
}

impl RestConfig {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            anon_key: anon_key.into(),
            access_token: None,
            resident_id: None,
            admin: false,
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>, resident: ResidentId) -> Self {
        self.access_token = Some(token.into());
        self.resident_id = Some(resident);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `{base_url}/rest/v1`, tolerating a trailing slash.
    pub fn rest_root(&self) -> String {
        format!("{}/rest/v1", self.base_url.trim_end_matches('/'))
    }

    /// Value of the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!(
            "Bearer {}",
            self.access_token.as_deref().unwrap_or(&self.anon_key)
        )
    }
}

/// Session derived from the configured token; it never changes at runtime.
#[derive(Debug, Clone)]
pub struct TokenSession {
    session: Session,
}

impl TokenSession {
    pub fn from_config(config: &RestConfig) -> Self {
        let authenticated = config.access_token.is_some() && config.resident_id.is_some();
        Self {
            session: Session {
                resident_id: config.resident_id,
                authenticated,
                admin: authenticated && config.admin,
            },
        }
    }
}

impl SessionProvider for TokenSession {
    fn session(&self) -> Session {
        self.session.clone()
    }
}
