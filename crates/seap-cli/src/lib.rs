//! # seap-cli
//!
//! Command-line front end for SEAP AI Alerts. Covers what the web pages did:
//! login/signup, the protected-route session check, the dashboard greeting,
//! and report search with local refinement.

pub mod app;
pub mod error;
pub mod output;

pub use app::{App, AppOptions};
pub use error::{CliError, Result};
