//! Error types for the command-line front end

use seap_core::ClientError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Invalid email or password")]
    LoginRejected,

    #[error("Not logged in - run `seap-alerts login` first")]
    NotLoggedIn,

    #[error("Session expired - please log in again")]
    SessionExpired,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;
