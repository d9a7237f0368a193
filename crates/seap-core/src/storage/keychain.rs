//! OS keychain storage backend
//!
//! Each session slot (`jwt`, or `jwt@<path>` for a scoped session) becomes
//! one keychain entry under the `seap-alerts` service. The token is ASCII,
//! so it is stored as the entry's secret as-is.

use async_trait::async_trait;
use keyring::Entry;
use tracing::debug;

use super::SecureStorage;
use crate::error::{ClientError, Result};

/// Service name used for keychain entries
const SERVICE_NAME: &str = "seap-alerts";

/// Slot written and removed to check that the keychain accepts writes
const AVAILABILITY_SLOT: &str = "__availability__";

/// OS keychain storage backend
pub struct KeychainStorage {
    service: &'static str,
}

impl KeychainStorage {
    /// Open the keychain if the platform has one that accepts writes.
    ///
    /// Headless Linux boxes often have no secret service running; `None`
    /// lets the caller pick another backend.
    pub fn detect() -> Option<Self> {
        let storage = Self {
            service: SERVICE_NAME,
        };

        let entry = storage.entry(AVAILABILITY_SLOT).ok()?;
        entry.set_password("check").ok()?;
        let _ = entry.delete_password();

        debug!("Keychain available");
        Some(storage)
    }

    fn entry(&self, slot: &str) -> Result<Entry> {
        Entry::new(self.service, slot).map_err(keychain_error)
    }
}

fn keychain_error(err: keyring::Error) -> ClientError {
    ClientError::KeychainError(err.to_string())
}

#[async_trait]
impl SecureStorage for KeychainStorage {
    async fn store(&self, key: &str, value: &[u8]) -> Result<()> {
        let token = std::str::from_utf8(value).map_err(|_| {
            ClientError::StorageError("keychain values must be UTF-8".to_string())
        })?;

        self.entry(key)?
            .set_password(token)
            .map_err(keychain_error)?;

        debug!("Stored {} in keychain", key);
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.entry(key)?.get_password() {
            Ok(token) => Ok(Some(token.into_bytes())),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(keychain_error(e)),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(keychain_error(e)),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.retrieve(key).await?.is_some())
    }

    fn backend_name(&self) -> &'static str {
        #[cfg(target_os = "macos")]
        return "macOS Keychain";

        #[cfg(target_os = "windows")]
        return "Windows Credential Manager";

        #[cfg(target_os = "linux")]
        return "Linux Secret Service";

        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        return "System Keychain";
    }
}
