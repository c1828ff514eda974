// crates/astra-cli/src/config.rs
//
// Configuration for the astra CLI.
// Loaded from a TOML file or populated with sensible defaults.
//
//   log_level = "info"
//   wallet_address = "0x9f2c..."
//
//   [backend]
//   base_url = "https://xyz.supabase.co"
//   anon_key = "..."
//   access_token = "..."
//   resident_id = "0190..."
//
//   [ledger]
//   request_timeout_secs = 15

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use astra_ledger::LedgerConfig;
use astra_rpc::RestConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    /// Overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Hosted backend. Without it the CLI runs degraded: reads show
    /// placeholders and nothing is sent.
    #[serde(default)]
    pub backend: Option<RestConfig>,

    /// On-chain wallet claims are paid out to. Unset means unbound.
    #[serde(default)]
    pub wallet_address: Option<String>,

    #[serde(default)]
    pub ledger: LedgerConfig,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            backend: None,
            wallet_address: None,
            ledger: LedgerConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(expand_home(path))?;
        let config: CliConfig = toml::from_str(&contents)?;
        Ok(config)
    }
}

/// `~/.astra/config.toml`.
pub fn default_path() -> String {
    "~/.astra/config.toml".to_string()
}

/// Resolve a leading `~/` against the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_full_file() {
        let config: CliConfig = toml::from_str(
            r#"
            log_level = "debug"
            wallet_address = "0x9f2c04d1"

            [backend]
            base_url = "https://ledger.example.co"
            anon_key = "anon"
            access_token = "jwt"
            resident_id = "01890a5d-ac96-774b-bcce-b302099a8057"

            [ledger]
            request_timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.wallet_address.as_deref(), Some("0x9f2c04d1"));
        let backend = config.backend.unwrap();
        assert_eq!(backend.rest_root(), "https://ledger.example.co/rest/v1");
        assert!(backend.resident_id.is_some());
        assert_eq!(config.ledger.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.ledger.history_limit, 20);
    }

    #[test]
    fn test_empty_file_is_degraded_default() {
        let config: CliConfig = toml::from_str("").unwrap();
        assert!(config.backend.is_none());
        assert!(config.wallet_address.is_none());
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/etc/astra.toml"), PathBuf::from("/etc/astra.toml"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/.astra/config.toml"), home.join(".astra/config.toml"));
        }
    }
}
