//! # seap-core
//!
//! Client library for SEAP AI Alerts including:
//! - Single-slot bearer credential storage (file, OS keychain or memory)
//! - Auth client with verify, single-shot refresh on 401, and logout
//! - Report feed types with client-side filtering and sorting
//! - JSON settings with environment overrides

pub mod client;
pub mod credential;
pub mod error;
pub mod reports;
pub mod session;
pub mod settings;
pub mod storage;

pub use client::{ApiClient, AuthRequest};
pub use credential::{Claims, Credential};
pub use error::{ClientError, Result};
pub use reports::{
    board, Deal, Lot, ReportFilter, ReportQuery, ReportsResponse, SortField, SortOption,
    SortOrder, Urgency, ValueChip, DEFAULT_PAGE_SIZE,
};
pub use session::SessionStore;
pub use settings::{Settings, SettingsManager, StorageKind};
pub use storage::{FileStorage, KeychainStorage, MemoryStorage, SecureStorage};
