//! # In-Memory Backend

use std::collections::HashMap;
use std::sync::RwLock;

use super::backend::KeyValueBackend;
use super::errors::{StorageError, StorageResult};

/// Volatile backend, also used when no storage directory is configured.
///
/// An optional quota bounds the total of key and value lengths, the way a
/// browser bounds local storage per origin.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    items: RwLock<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryBackend {
    /// Create an unbounded backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend limited to `quota` bytes
    pub fn with_quota(quota: usize) -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            quota: Some(quota),
        }
    }

    /// Bytes currently used
    pub fn used_bytes(&self) -> usize {
        self.items
            .read()
            .map(|items| items.iter().map(|(k, v)| k.len() + v.len()).sum())
            .unwrap_or(0)
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.items.read().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let items = self
            .items
            .read()
            .map_err(|_| StorageError::Internal("Lock poisoned".into()))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut items = self
            .items
            .write()
            .map_err(|_| StorageError::Internal("Lock poisoned".into()))?;

        if let Some(quota) = self.quota {
            let current: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = current + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }

        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let mut items = self
            .items
            .write()
            .map_err(|_| StorageError::Internal("Lock poisoned".into()))?;
        items.remove(key);
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let items = self
            .items
            .read()
            .map_err(|_| StorageError::Internal("Lock poisoned".into()))?;
        Ok(items.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let backend = MemoryBackend::new();
        backend.set_item("a", "1").unwrap();
        assert_eq!(backend.get_item("a").unwrap(), Some("1".to_string()));

        backend.remove_item("a").unwrap();
        assert_eq!(backend.get_item("a").unwrap(), None);

        // removing again is fine
        backend.remove_item("a").unwrap();
    }

    #[test]
    fn test_quota_rejects_and_keeps_prior_value() {
        let backend = MemoryBackend::with_quota(8);
        backend.set_item("k", "1234").unwrap();

        let result = backend.set_item("k", "123456789");
        assert!(matches!(result, Err(StorageError::QuotaExceeded { .. })));
        assert_eq!(backend.get_item("k").unwrap(), Some("1234".to_string()));
    }

    #[test]
    fn test_quota_counts_replacement_not_sum() {
        let backend = MemoryBackend::with_quota(6);
        backend.set_item("k", "12345").unwrap();
        backend.set_item("k", "54321").unwrap();
        assert_eq!(backend.used_bytes(), 6);
    }
}
