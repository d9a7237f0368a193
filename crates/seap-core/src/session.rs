//! Single-slot session store
//!
//! Holds at most one bearer credential in a storage backend, keyed the way
//! the web client keyed its cookie: a `jwt` entry scoped to a path.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::credential::Credential;
use crate::error::Result;
use crate::storage::SecureStorage;

/// Name of the credential entry
const CREDENTIAL_KEY: &str = "jwt";

/// Default scope, mirroring the cookie path
pub const DEFAULT_PATH: &str = "/";

/// Session store over a storage backend
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn SecureStorage>,
    key: String,
}

impl SessionStore {
    /// Create a session store scoped to [`DEFAULT_PATH`]
    pub fn new(storage: Arc<dyn SecureStorage>) -> Self {
        Self::with_path(storage, DEFAULT_PATH)
    }

    /// Create a session store scoped to a path
    pub fn with_path(storage: Arc<dyn SecureStorage>, path: &str) -> Self {
        let path = if path.is_empty() { DEFAULT_PATH } else { path };
        let key = if path == DEFAULT_PATH {
            CREDENTIAL_KEY.to_string()
        } else {
            format!("{}@{}", CREDENTIAL_KEY, path)
        };

        Self { storage, key }
    }

    /// Name of the backing storage
    pub fn backend_name(&self) -> &'static str {
        self.storage.backend_name()
    }

    /// Load the stored credential.
    ///
    /// Bytes that are not UTF-8 or hold only whitespace count as no
    /// credential and are removed.
    pub async fn get(&self) -> Result<Option<Credential>> {
        let Some(bytes) = self.storage.retrieve(&self.key).await? else {
            return Ok(None);
        };

        let parsed = String::from_utf8(bytes)
            .ok()
            .and_then(|token| Credential::new(token).ok());

        if parsed.is_none() {
            warn!("Stored credential is malformed, clearing it");
            self.storage.delete(&self.key).await?;
        }

        Ok(parsed)
    }

    /// Store a credential, replacing any previous one
    pub async fn set(&self, credential: &Credential) -> Result<()> {
        self.storage
            .store(&self.key, credential.expose().as_bytes())
            .await?;
        debug!("Stored session credential");
        Ok(())
    }

    /// Remove the stored credential, if any
    pub async fn clear(&self) -> Result<()> {
        self.storage.delete(&self.key).await?;
        debug!("Cleared session credential");
        Ok(())
    }

    /// Whether a credential entry exists, without validating it
    pub async fn has_credential(&self) -> Result<bool> {
        self.storage.exists(&self.key).await
    }
}
