//! Storage trait definitions

use crate::error::Result;
use async_trait::async_trait;

/// Trait for credential storage backends
#[async_trait]
pub trait SecureStorage: Send + Sync {
    /// Store a value with the given key
    async fn store(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Retrieve a value by key
    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a value by key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a key exists
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Get a human-readable name for this storage backend
    fn backend_name(&self) -> &'static str;
}
