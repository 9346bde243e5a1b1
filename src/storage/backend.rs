//! # Key-Value Backend Trait

use super::errors::StorageResult;

/// String-keyed, string-valued persistent store.
///
/// Mirrors a browser's local storage: each `set_item` replaces the whole
/// value atomically, reads of missing keys return `None`.
pub trait KeyValueBackend: Send + Sync + std::fmt::Debug {
    /// Read the raw value at key
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Write the raw value at key, replacing any prior value
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Delete key; missing keys are not an error
    fn remove_item(&self, key: &str) -> StorageResult<()>;

    /// All keys currently stored, in no particular order
    fn keys(&self) -> StorageResult<Vec<String>>;
}
