//! File storage backend
//!
//! Keeps entries in a single JSON file in the user's data directory, the
//! command-line equivalent of the browser cookie jar. Values are stored as
//! UTF-8 text; the transport is the only protection, same as a cookie.

use async_trait::async_trait;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::SecureStorage;
use crate::error::{ClientError, Result};

/// Name of the storage file inside the storage directory
const STORAGE_FILE: &str = "session.json";

/// File storage backend
pub struct FileStorage {
    /// Directory for storage files
    storage_dir: PathBuf,
    /// In-memory copy of the file contents
    cache: RwLock<HashMap<String, String>>,
}

/// File format for persistent storage
#[derive(Debug, Serialize, Deserialize)]
struct StorageFile {
    version: u32,
    entries: HashMap<String, String>,
}

impl FileStorage {
    /// Create a file storage in the given directory and load it
    pub async fn open_in(storage_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(storage_dir).await?;

        let storage = Self {
            storage_dir: storage_dir.to_path_buf(),
            cache: RwLock::new(HashMap::new()),
        };
        storage.load().await?;

        debug!("File storage initialized at: {:?}", storage.storage_dir);
        Ok(storage)
    }

    fn storage_file_path(&self) -> PathBuf {
        self.storage_dir.join(STORAGE_FILE)
    }

    /// Read entries from disk. A corrupt file is discarded.
    async fn load(&self) -> Result<()> {
        let path = self.storage_file_path();

        if !path.exists() {
            debug!("No existing storage file found");
            return Ok(());
        }

        let contents = tokio::fs::read_to_string(&path).await?;
        let entries = match serde_json::from_str::<StorageFile>(&contents) {
            Ok(file) => file.entries,
            Err(e) => {
                warn!("Discarding unreadable storage file {:?}: {}", path, e);
                HashMap::new()
            }
        };

        let mut cache = self.cache.write().await;
        *cache = entries;

        debug!("Loaded {} entries from storage", cache.len());
        Ok(())
    }

    /// Write the current entries to disk
    async fn save(&self, entries: &HashMap<String, String>) -> Result<()> {
        let file = StorageFile {
            version: 1,
            entries: entries.clone(),
        };

        let contents = serde_json::to_string_pretty(&file)?;
        let path = self.storage_file_path();

        // Write atomically using a temp file
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &path).await?;

        debug!("Saved {} entries to storage", entries.len());
        Ok(())
    }
}

/// Default per-user data directory
pub fn default_data_dir() -> Result<PathBuf> {
    ProjectDirs::from("ro", "seap-ai-alerts", "seap-alerts")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| {
            ClientError::StorageError("Could not determine data directory".to_string())
        })
}

#[async_trait]
impl SecureStorage for FileStorage {
    async fn store(&self, key: &str, value: &[u8]) -> Result<()> {
        let value = String::from_utf8(value.to_vec())
            .map_err(|_| ClientError::StorageError("value is not valid UTF-8".to_string()))?;

        let mut cache = self.cache.write().await;
        cache.insert(key.to_string(), value);
        self.save(&cache).await?;

        debug!("Stored key: {}", key);
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let cache = self.cache.read().await;
        Ok(cache.get(key).map(|v| v.clone().into_bytes()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut cache = self.cache.write().await;

        if cache.remove(key).is_some() {
            self.save(&cache).await?;
            debug!("Deleted key: {}", key);
        }

        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.cache.read().await.contains_key(key))
    }

    fn backend_name(&self) -> &'static str {
        "File Storage"
    }
}
