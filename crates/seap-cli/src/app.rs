//! Wiring of settings, storage and the API client for one invocation

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use seap_core::storage::default_data_dir;
use seap_core::{
    ApiClient, FileStorage, KeychainStorage, MemoryStorage, SecureStorage, SessionStore,
    Settings, SettingsManager, StorageKind,
};

use crate::error::Result;

/// Overrides given on the command line
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    pub api_base: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub storage: Option<StorageKind>,
}

/// Everything a command needs
pub struct App {
    pub data_dir: PathBuf,
    pub settings: SettingsManager,
    effective: Settings,
    session: SessionStore,
}

impl App {
    /// Load settings, apply overrides and open the session store.
    ///
    /// Precedence: command-line flag, then `SEAP_API_BASE`, then `settings.json`.
    /// The API base is not checked here, so a bad one never locks the user out
    /// of `logout` or `config`.
    pub async fn open(options: AppOptions) -> Result<Self> {
        let data_dir = match options.data_dir.clone() {
            Some(dir) => dir,
            None => default_data_dir()?,
        };

        let settings = SettingsManager::new(&data_dir);
        let effective = effective_settings(settings.get(), &options);

        let storage = open_storage(effective.storage, &data_dir).await?;
        let session = SessionStore::with_path(storage, &effective.cookie_path);
        debug!("Session storage: {}", session.backend_name());

        Ok(Self {
            data_dir,
            settings,
            effective,
            session,
        })
    }

    /// Settings after environment and command-line overrides
    pub fn effective(&self) -> &Settings {
        &self.effective
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Client for commands that talk to the backend. Fails on a bad API base.
    pub fn client(&self) -> Result<ApiClient> {
        let client = ApiClient::from_settings(&self.effective, self.session.clone())?;
        debug!("Using API at {}", client.base_url());
        Ok(client)
    }

    /// Forget the stored session. Needs no backend.
    pub async fn logout(&self) -> Result<()> {
        self.session.clear().await?;
        info!("Logged out");
        Ok(())
    }
}

fn effective_settings(saved: &Settings, options: &AppOptions) -> Settings {
    let mut settings = saved.clone();
    settings.apply_env();

    if let Some(base) = &options.api_base {
        settings.api_base = base.clone();
    }
    if let Some(kind) = options.storage {
        settings.storage = kind;
    }

    settings
}

async fn open_storage(kind: StorageKind, data_dir: &Path) -> Result<Arc<dyn SecureStorage>> {
    let storage: Arc<dyn SecureStorage> = match kind {
        StorageKind::File => Arc::new(FileStorage::open_in(data_dir).await?),
        StorageKind::Memory => Arc::new(MemoryStorage::new()),
        StorageKind::Keychain => match KeychainStorage::detect() {
            Some(keychain) => Arc::new(keychain),
            None => {
                warn!("Keychain unavailable, keeping the session in a file instead");
                Arc::new(FileStorage::open_in(data_dir).await?)
            }
        },
    };
    Ok(storage)
}
