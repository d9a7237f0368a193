//! Client settings
//!
//! Stored as plain JSON next to the session file. Nothing here is secret.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::{ClientError, Result};
use crate::reports::DEFAULT_PAGE_SIZE;
use crate::session::DEFAULT_PATH;

/// Backend origin used when nothing else is configured
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Environment variable overriding the backend origin
pub const API_BASE_ENV: &str = "SEAP_API_BASE";

/// Where the session credential is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    File,
    Keychain,
    Memory,
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(StorageKind::File),
            "keychain" => Ok(StorageKind::Keychain),
            "memory" => Ok(StorageKind::Memory),
            other => Err(format!(
                "unknown storage '{}': expected file, keychain or memory",
                other
            )),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StorageKind::File => "file",
            StorageKind::Keychain => "keychain",
            StorageKind::Memory => "memory",
        })
    }
}

/// Client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Settings file version
    pub version: u32,
    /// Backend origin, e.g. "http://localhost:8000"
    pub api_base: String,
    /// Per-request timeout in seconds (None = wait indefinitely)
    pub request_timeout_secs: Option<u64>,
    /// Credential storage backend
    pub storage: StorageKind,
    /// Scope of the stored credential
    pub cookie_path: String,
    /// Deals requested per search
    pub page_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: 1,
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout_secs: None,
            storage: StorageKind::File,
            cookie_path: DEFAULT_PATH.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Settings {
    /// Parsed and checked backend origin
    pub fn api_base_url(&self) -> Result<Url> {
        parse_api_base(&self.api_base)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Apply `SEAP_API_BASE` if it is set and non-empty
    pub fn apply_env(&mut self) {
        if let Ok(base) = std::env::var(API_BASE_ENV) {
            if !base.trim().is_empty() {
                debug!("Using API base from {}", API_BASE_ENV);
                self.api_base = base.trim().to_string();
            }
        }
    }
}

/// Parse a backend origin, which must be an absolute http(s) URL
pub fn parse_api_base(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| ClientError::ConfigError(format!("invalid API base '{}': {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::ConfigError(format!(
            "API base must use http or https, got '{}'",
            url.scheme()
        )));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(ClientError::ConfigError(format!(
            "API base '{}' has no host",
            raw
        )));
    }

    Ok(url)
}

/// Settings manager
pub struct SettingsManager {
    settings_file: PathBuf,
    settings: Settings,
}

impl SettingsManager {
    /// Load settings from `settings.json` in the given directory, falling back to defaults
    pub fn new(storage_dir: &Path) -> Self {
        let settings_file = storage_dir.join("settings.json");
        let settings = Self::load_from_file(&settings_file).unwrap_or_default();

        Self {
            settings_file,
            settings,
        }
    }

    fn load_from_file(path: &Path) -> Result<Settings> {
        if !path.exists() {
            debug!("No settings file found, using defaults");
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&contents)?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to file
    async fn save(&self) -> Result<()> {
        if let Some(parent) = self.settings_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = serde_json::to_string_pretty(&self.settings)?;

        // Write atomically using temp file
        let temp_path = self.settings_file.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &self.settings_file).await?;

        debug!("Saved settings to {:?}", self.settings_file);
        Ok(())
    }

    /// Get current settings
    pub fn get(&self) -> &Settings {
        &self.settings
    }

    /// Update settings and save
    pub async fn update(&mut self, settings: Settings) -> Result<()> {
        settings.api_base_url()?;
        self.settings = settings;
        self.save().await
    }

    /// Reset settings to defaults and delete the settings file
    pub async fn reset(&mut self) -> Result<()> {
        self.settings = Settings::default();

        if self.settings_file.exists() {
            tokio::fs::remove_file(&self.settings_file).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_settings_default() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(temp_dir.path());

        let settings = manager.get();
        assert_eq!(settings.api_base, "http://localhost:8000");
        assert_eq!(settings.storage, StorageKind::File);
        assert_eq!(settings.page_size, 50);
        assert!(settings.request_timeout().is_none());
    }

    #[tokio::test]
    async fn test_settings_persistence() {
        let temp_dir = TempDir::new().unwrap();

        {
            let mut manager = SettingsManager::new(temp_dir.path());
            let settings = Settings {
                api_base: "https://api.seap-alerts.ro".to_string(),
                request_timeout_secs: Some(15),
                storage: StorageKind::Keychain,
                ..Settings::default()
            };
            manager.update(settings).await.unwrap();
        }

        {
            let manager = SettingsManager::new(temp_dir.path());
            assert_eq!(manager.get().api_base, "https://api.seap-alerts.ro");
            assert_eq!(manager.get().request_timeout(), Some(Duration::from_secs(15)));
            assert_eq!(manager.get().storage, StorageKind::Keychain);
        }
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("settings.json"),
            r#"{"apiBase": "http://10.0.0.5:8000"}"#,
        )
        .unwrap();

        let manager = SettingsManager::new(temp_dir.path());
        assert_eq!(manager.get().api_base, "http://10.0.0.5:8000");
        assert_eq!(manager.get().cookie_path, "/");
    }

    #[tokio::test]
    async fn test_update_rejects_bad_base() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = SettingsManager::new(temp_dir.path());

        let settings = Settings {
            api_base: "ftp://example.com".to_string(),
            ..Settings::default()
        };
        assert!(manager.update(settings).await.is_err());
        assert_eq!(manager.get().api_base, DEFAULT_API_BASE);
    }

    #[tokio::test]
    async fn test_reset() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = SettingsManager::new(temp_dir.path());
        let settings = Settings {
            page_size: 10,
            ..Settings::default()
        };
        manager.update(settings).await.unwrap();

        manager.reset().await.unwrap();
        assert_eq!(manager.get().page_size, 50);
        assert!(!temp_dir.path().join("settings.json").exists());
    }

    #[test]
    fn test_parse_api_base() {
        assert!(parse_api_base("http://localhost:8000").is_ok());
        assert!(parse_api_base("localhost:8000").is_err());
        assert!(parse_api_base("not a url").is_err());
        assert!(parse_api_base("mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_storage_kind_parse() {
        assert_eq!("Keychain".parse::<StorageKind>().unwrap(), StorageKind::Keychain);
        assert!("cookie".parse::<StorageKind>().is_err());
    }
}
