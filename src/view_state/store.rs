//! # View-State Store
//!
//! Remembers each panel's search, filter and sort across reloads.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::observability::{log_event_with_fields, Event};
use crate::storage::{StorageAdapter, StorageResult, StorageSuffix};

use super::state::{ToolViewState, ViewStatePatch};

/// Per-tool view state backed by the storage adapter
#[derive(Debug)]
pub struct ViewStateStore {
    adapter: StorageAdapter,
    cache: RwLock<HashMap<String, ToolViewState>>,
}

impl ViewStateStore {
    pub fn new(adapter: StorageAdapter) -> Self {
        Self {
            adapter,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Stored state of `tool_id`, or the default when none exists or the
    /// stored payload is unreadable
    pub fn get_view_state(&self, tool_id: &str) -> ToolViewState {
        if let Some(state) = self.cache.read().ok().and_then(|c| c.get(tool_id).cloned()) {
            return state;
        }

        let key = self.adapter.storage_key(tool_id, StorageSuffix::ViewState);
        let state = self
            .adapter
            .get_as::<ToolViewState>(&key)
            .unwrap_or_default();

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(tool_id.to_string(), state.clone());
        }
        state
    }

    /// Merge `patch` into the current state and persist the result.
    ///
    /// The merged state is returned and cached even if the write fails;
    /// use [`ViewStateStore::try_set_view_state`] to see the failure.
    pub fn set_view_state(&self, tool_id: &str, patch: ViewStatePatch) -> ToolViewState {
        match self.try_set_view_state(tool_id, patch) {
            Ok(state) => state,
            Err(_) => self.get_view_state(tool_id),
        }
    }

    /// Like `set_view_state`, but reports a failed storage write
    pub fn try_set_view_state(
        &self,
        tool_id: &str,
        patch: ViewStatePatch,
    ) -> StorageResult<ToolViewState> {
        let mut state = self.get_view_state(tool_id);
        state.merge(patch);

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(tool_id.to_string(), state.clone());
        }

        let key = self.adapter.storage_key(tool_id, StorageSuffix::ViewState);
        self.adapter.set_as(&key, &state)?;

        log_event_with_fields(
            Event::ViewStateSaved,
            &[
                ("filter", state.filter.as_str()),
                ("sort_order", state.sort_order.as_str()),
                ("tool", tool_id),
            ],
        );
        Ok(state)
    }

    /// Forget the stored state so the next read returns the default
    pub fn reset_view_state(&self, tool_id: &str) -> StorageResult<()> {
        if let Ok(mut cache) = self.cache.write() {
            cache.remove(tool_id);
        }
        let key = self.adapter.storage_key(tool_id, StorageSuffix::ViewState);
        self.adapter.remove(&key)
    }

    /// Tools with persisted view state
    pub fn tool_ids(&self) -> Vec<String> {
        self.adapter.tool_ids(StorageSuffix::ViewState)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueBackend, MemoryBackend};
    use crate::view_state::SortOrder;
    use std::sync::Arc;

    fn store() -> (Arc<MemoryBackend>, ViewStateStore) {
        let backend = Arc::new(MemoryBackend::new());
        let adapter = StorageAdapter::with_default_namespace(backend.clone());
        (backend, ViewStateStore::new(adapter))
    }

    #[test]
    fn test_default_for_unknown_tool() {
        let (_, store) = store();
        let state = store.get_view_state("never-opened");
        assert_eq!(state.search_query, "");
        assert_eq!(state.filter, "all");
        assert_eq!(state.sort_order, SortOrder::Asc);
    }

    #[test]
    fn test_partial_merge_preserves_other_fields() {
        let (_, store) = store();
        store.set_view_state(
            "feature-flags",
            ViewStatePatch::new()
                .search_query("dark")
                .sort_order(SortOrder::Desc),
        );
        store.set_view_state("feature-flags", ViewStatePatch::new().filter("enabled"));

        let state = store.get_view_state("feature-flags");
        assert_eq!(state.search_query, "dark");
        assert_eq!(state.filter, "enabled");
        assert_eq!(state.sort_order, SortOrder::Desc);
    }

    #[test]
    fn test_persisted_across_store_instances() {
        let backend = Arc::new(MemoryBackend::new());
        {
            let store =
                ViewStateStore::new(StorageAdapter::with_default_namespace(backend.clone()));
            store.set_view_state("language", ViewStatePatch::new().search_query("fr"));
        }
        let store = ViewStateStore::new(StorageAdapter::with_default_namespace(backend));
        assert_eq!(store.get_view_state("language").search_query, "fr");
    }

    #[test]
    fn test_opaque_filter_accepted() {
        let (_, store) = store();
        let state = store.set_view_state("t", ViewStatePatch::new().filter("¯\\_(ツ)_/¯"));
        assert_eq!(state.filter, "¯\\_(ツ)_/¯");
    }

    #[test]
    fn test_corrupt_state_reads_as_default() {
        let (backend, store) = store();
        backend
            .set_item("devbar:t:view-state", r#"{"searchQuery": 12}"#)
            .unwrap();
        assert_eq!(store.get_view_state("t"), ToolViewState::default());
    }

    #[test]
    fn test_write_failure_keeps_memory_state() {
        let backend = Arc::new(MemoryBackend::with_quota(5));
        let store = ViewStateStore::new(StorageAdapter::with_default_namespace(backend));

        let result = store.try_set_view_state("t", ViewStatePatch::new().filter("enabled"));
        assert!(result.is_err());
        assert_eq!(store.get_view_state("t").filter, "enabled");
    }

    #[test]
    fn test_reset_returns_default() {
        let (backend, store) = store();
        store.set_view_state("t", ViewStatePatch::new().search_query("x"));
        store.reset_view_state("t").unwrap();

        assert_eq!(store.get_view_state("t"), ToolViewState::default());
        assert_eq!(backend.get_item("devbar:t:view-state").unwrap(), None);
    }
}
