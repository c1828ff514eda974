// crates/astra-rpc/src/error.rs

use thiserror::Error;

use astra_core::AstraError;

/// Failures of a single HTTP exchange with the backend.
#[derive(Debug, Error)]
pub enum RestError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx status, with the backend's message when it sent one.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<RestError> for AstraError {
    fn from(e: RestError) -> Self {
        match e {
            RestError::Http(inner) if inner.is_timeout() => {
                AstraError::Transport(format!("request timed out: {}", inner))
            }
            RestError::Http(inner) => AstraError::Transport(inner.to_string()),
            // The backend explained itself; show that, not the status line.
            RestError::Status { status, message } if (400..500).contains(&status) => {
                AstraError::Remote(message)
            }
            other @ RestError::Status { .. } => AstraError::Transport(other.to_string()),
            RestError::Decode(inner) => AstraError::Serialization(inner.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_carry_backend_message() {
        let e: AstraError = RestError::Status {
            status: 400,
            message: "Insufficient funds".to_string(),
        }
        .into();
        assert!(matches!(e, AstraError::Remote(ref m) if m == "Insufficient funds"));

        let e: AstraError = RestError::Status {
            status: 503,
            message: "upstream down".to_string(),
        }
        .into();
        assert!(matches!(e, AstraError::Transport(_)));
    }
}
