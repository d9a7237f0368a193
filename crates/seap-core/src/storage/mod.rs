//! Storage backends for the session credential
//!
//! Three backends are provided:
//! 1. Plain JSON file in the user's data directory (the cookie jar)
//! 2. OS Keychain
//! 3. In-memory map (ephemeral sessions and tests)

mod traits;
mod keychain;
mod file;
mod memory;

pub use traits::SecureStorage;
pub use keychain::KeychainStorage;
pub use file::{default_data_dir, FileStorage};
pub use memory::MemoryStorage;
