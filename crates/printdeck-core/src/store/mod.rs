// ── Durable key-value storage ──
//
// The registry persists through a plain string-keyed store with no
// transactions. Two backends: in-memory and one-file-per-key on disk.

mod file;
mod memory;
mod persistence;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use persistence::{ACTIVE_KEY, PROFILES_KEY, Persistence};

use crate::error::CoreError;

/// String-keyed durable storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), CoreError>;
    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), CoreError>;
}
