//! Error types for seap-core

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client error types
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Network error - could not reach the server: {0}")]
    Transport(String),

    #[error("Authentication failed (HTTP {status})")]
    AuthenticationFailed { status: u16 },

    #[error("Session expired - please log in again")]
    SessionExpired,

    #[error("Request to {endpoint} failed: HTTP {status}")]
    UnexpectedStatus { endpoint: &'static str, status: u16 },

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Keychain error: {0}")]
    KeychainError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        // reqwest errors can embed the full URL; keep the message generic
        if err.is_decode() {
            ClientError::Transport(format!("invalid response body: {}", err.without_url()))
        } else {
            ClientError::Transport(err.without_url().to_string())
        }
    }
}
