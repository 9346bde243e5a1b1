//! # Storage Adapter
//!
//! Namespaced JSON access on top of a [`KeyValueBackend`]. Reads never
//! fail: a missing, unreadable or unparsable payload is simply absent.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::observability::{log_event_with_fields, Event};

use super::backend::KeyValueBackend;
use super::errors::StorageResult;

/// Namespace used when none is configured
pub const DEFAULT_NAMESPACE: &str = "devbar";

/// Separator between namespace, tool id and suffix
pub const KEY_SEPARATOR: char = ':';

/// What a tool-scoped key holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageSuffix {
    Overrides,
    ViewState,
}

impl StorageSuffix {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageSuffix::Overrides => "overrides",
            StorageSuffix::ViewState => "view-state",
        }
    }
}

impl fmt::Display for StorageSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JSON storage scoped to one namespace
#[derive(Debug, Clone)]
pub struct StorageAdapter {
    backend: Arc<dyn KeyValueBackend>,
    namespace: String,
}

impl StorageAdapter {
    /// Create an adapter over `backend` using `namespace` as key prefix
    pub fn new(backend: Arc<dyn KeyValueBackend>, namespace: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
        }
    }

    /// Adapter with the default namespace
    pub fn with_default_namespace(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self::new(backend, DEFAULT_NAMESPACE)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Full key for a tool's data: `{namespace}:{tool_id}:{suffix}`
    pub fn storage_key(&self, tool_id: &str, suffix: StorageSuffix) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.namespace,
            tool_id,
            suffix,
            sep = KEY_SEPARATOR
        )
    }

    /// Split a full key back into `(tool_id, suffix)`.
    ///
    /// Returns `None` for keys outside the namespace or with an unknown
    /// suffix. Tool ids may themselves contain the separator.
    pub fn parse_key(&self, key: &str) -> Option<(String, StorageSuffix)> {
        let rest = key
            .strip_prefix(self.namespace.as_str())?
            .strip_prefix(KEY_SEPARATOR)?;
        let (tool_id, suffix) = rest.rsplit_once(KEY_SEPARATOR)?;
        if tool_id.is_empty() {
            return None;
        }
        let suffix = match suffix {
            "overrides" => StorageSuffix::Overrides,
            "view-state" => StorageSuffix::ViewState,
            _ => return None,
        };
        Some((tool_id.to_string(), suffix))
    }

    /// Read the JSON value at `key`
    pub fn get(&self, key: &str) -> Option<Value> {
        let raw = match self.backend.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                log_event_with_fields(
                    Event::StorageReadFailed,
                    &[("key", key), ("error", e.to_string().as_str())],
                );
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log_event_with_fields(
                    Event::StorageReadCorrupt,
                    &[("key", key), ("error", e.to_string().as_str())],
                );
                None
            }
        }
    }

    /// Read and decode the value at `key`; a shape mismatch reads as absent
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                log_event_with_fields(
                    Event::StorageReadCorrupt,
                    &[("key", key), ("error", e.to_string().as_str())],
                );
                None
            }
        }
    }

    /// Serialize and write `value` at `key`, replacing any prior value.
    ///
    /// Failures are logged and returned; they are never fatal.
    pub fn set(&self, key: &str, value: &Value) -> StorageResult<()> {
        let raw = serde_json::to_string(value)?;
        self.backend.set_item(key, &raw).map_err(|e| {
            log_event_with_fields(
                Event::StorageWriteFailed,
                &[("key", key), ("error", e.to_string().as_str())],
            );
            e
        })
    }

    /// Encode `value` with serde and write it at `key`
    pub fn set_as<T: Serialize>(&self, key: &str, value: &T) -> StorageResult<()> {
        let value = serde_json::to_value(value)?;
        self.set(key, &value)
    }

    /// Delete `key`; a missing key is a no-op
    pub fn remove(&self, key: &str) -> StorageResult<()> {
        self.backend.remove_item(key).map_err(|e| {
            log_event_with_fields(
                Event::StorageRemoveFailed,
                &[("key", key), ("error", e.to_string().as_str())],
            );
            e
        })
    }

    /// Keys that belong to this namespace
    pub fn namespaced_keys(&self) -> Vec<String> {
        let prefix = format!("{}{}", self.namespace, KEY_SEPARATOR);
        match self.backend.keys() {
            Ok(keys) => keys.into_iter().filter(|k| k.starts_with(&prefix)).collect(),
            Err(e) => {
                log_event_with_fields(
                    Event::StorageReadFailed,
                    &[("key", "*"), ("error", e.to_string().as_str())],
                );
                Vec::new()
            }
        }
    }

    /// Tool ids with data persisted under `suffix`, sorted
    pub fn tool_ids(&self, suffix: StorageSuffix) -> Vec<String> {
        let mut ids: Vec<String> = self
            .namespaced_keys()
            .iter()
            .filter_map(|k| self.parse_key(k))
            .filter(|(_, s)| *s == suffix)
            .map(|(tool_id, _)| tool_id)
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Every parsable namespaced key with its decoded value
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.namespaced_keys()
            .into_iter()
            .filter_map(|k| self.get(&k).map(|v| (k, v)))
            .collect()
    }

    /// Remove every key in the namespace, leaving host keys untouched.
    ///
    /// Returns the number of keys removed.
    pub fn clear_namespace(&self) -> StorageResult<usize> {
        let keys = self.namespaced_keys();
        for key in &keys {
            self.remove(key)?;
        }
        Ok(keys.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;
    use serde_json::json;

    fn adapter() -> (Arc<MemoryBackend>, StorageAdapter) {
        let backend = Arc::new(MemoryBackend::new());
        let adapter = StorageAdapter::with_default_namespace(backend.clone());
        (backend, adapter)
    }

    #[test]
    fn test_storage_key_layout() {
        let (_, adapter) = adapter();
        assert_eq!(
            adapter.storage_key("feature-flags", StorageSuffix::Overrides),
            "devbar:feature-flags:overrides"
        );
        assert_eq!(
            adapter.storage_key("language", StorageSuffix::ViewState),
            "devbar:language:view-state"
        );
    }

    #[test]
    fn test_parse_key() {
        let (_, adapter) = adapter();
        assert_eq!(
            adapter.parse_key("devbar:feature-flags:overrides"),
            Some(("feature-flags".to_string(), StorageSuffix::Overrides))
        );
        assert_eq!(
            adapter.parse_key("devbar:a:b:view-state"),
            Some(("a:b".to_string(), StorageSuffix::ViewState))
        );
        assert_eq!(adapter.parse_key("other:x:overrides"), None);
        assert_eq!(adapter.parse_key("devbar:x:unknown"), None);
        assert_eq!(adapter.parse_key("devbar::overrides"), None);
        assert_eq!(adapter.parse_key("devbarx:y:overrides"), None);
    }

    #[test]
    fn test_set_get_deep_equal() {
        let (_, adapter) = adapter();
        let value = json!({"a": [1, 2.5, null, {"b": "c"}], "d": true});
        adapter.set("devbar:t:overrides", &value).unwrap();
        assert_eq!(adapter.get("devbar:t:overrides"), Some(value));
    }

    #[test]
    fn test_corrupt_payload_reads_as_absent() {
        let (backend, adapter) = adapter();
        backend.set_item("devbar:t:overrides", "{not json").unwrap();
        assert_eq!(adapter.get("devbar:t:overrides"), None);
    }

    #[test]
    fn test_shape_mismatch_reads_as_absent() {
        let (_, adapter) = adapter();
        adapter.set("k", &json!("a string")).unwrap();
        let decoded: Option<Vec<u32>> = adapter.get_as("k");
        assert!(decoded.is_none());
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let (_, adapter) = adapter();
        adapter.remove("devbar:never:overrides").unwrap();
    }

    #[test]
    fn test_write_failure_is_reported_not_panicking() {
        let backend = Arc::new(MemoryBackend::with_quota(4));
        let adapter = StorageAdapter::with_default_namespace(backend);
        let result = adapter.set("devbar:t:overrides", &json!({"big": true}));
        assert!(result.is_err());
        assert_eq!(adapter.get("devbar:t:overrides"), None);
    }

    #[test]
    fn test_snapshot_and_clear_leave_host_keys() {
        let (backend, adapter) = adapter();
        backend.set_item("host-session", "abc").unwrap();
        adapter.set("devbar:a:overrides", &json!({})).unwrap();
        adapter.set("devbar:b:view-state", &json!({"filter": "all"})).unwrap();

        let snapshot = adapter.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains_key("devbar:a:overrides"));

        assert_eq!(adapter.clear_namespace().unwrap(), 2);
        assert!(adapter.snapshot().is_empty());
        assert_eq!(backend.get_item("host-session").unwrap(), Some("abc".to_string()));
    }

    #[test]
    fn test_tool_ids_by_suffix() {
        let (_, adapter) = adapter();
        adapter.set("devbar:b:overrides", &json!({})).unwrap();
        adapter.set("devbar:a:overrides", &json!({})).unwrap();
        adapter.set("devbar:c:view-state", &json!({})).unwrap();

        assert_eq!(adapter.tool_ids(StorageSuffix::Overrides), vec!["a", "b"]);
        assert_eq!(adapter.tool_ids(StorageSuffix::ViewState), vec!["c"]);
    }
}
