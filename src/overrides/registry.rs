//! # Override Registry
//!
//! Authoritative in-memory set of overrides for every tool. Each tool owns
//! a replay-one [`Subject`] carrying its entries sorted by key; panels
//! subscribe to it and are notified synchronously on every change.
//!
//! Writes go memory first, subscribers second, storage last. A storage
//! failure leaves the registry working in memory and is retried on the
//! next flush.
//!
//! Several registries (tabs) may share one backend. Before a tool is
//! written, the stored map is merged in per key: stored entries that are
//! strictly newer, or unknown here, are adopted, except keys this registry
//! cleared and has not yet written.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::observability::{log_event_with_fields, Event};
use crate::storage::{StorageAdapter, StorageSuffix};

use super::catalog::{ToolCatalog, ToolDefinition};
use super::entry::OverrideEntry;
use super::errors::{OverrideError, OverrideResult};
use super::subject::{Subject, Subscription};

/// When a change reaches storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistMode {
    /// Written right after subscribers are notified
    #[default]
    Immediate,
    /// Batched until `flush` or drop
    Deferred,
}

/// What happened to a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Applied and stored
    Persisted,
    /// Applied, storage write waiting for flush
    Pending,
    /// Applied in memory, storage write failed
    MemoryOnly,
    /// Nothing to do, or lost to a newer write
    Unchanged,
}

impl WriteOutcome {
    /// Whether in-memory state changed
    pub fn is_applied(&self) -> bool {
        !matches!(self, WriteOutcome::Unchanged)
    }
}

#[derive(Debug)]
struct ToolOverrides {
    entries: BTreeMap<String, OverrideEntry>,
    /// Keys removed here whose removal has not reached storage yet
    cleared: BTreeSet<String>,
    subject: Subject<Vec<OverrideEntry>>,
}

impl ToolOverrides {
    fn new(entries: BTreeMap<String, OverrideEntry>) -> Self {
        let snapshot = entries.values().cloned().collect();
        Self {
            entries,
            cleared: BTreeSet::new(),
            subject: Subject::new(snapshot),
        }
    }

    fn empty() -> Self {
        Self::new(BTreeMap::new())
    }

    fn snapshot(&self) -> Vec<OverrideEntry> {
        self.entries.values().cloned().collect()
    }

    /// Take stored entries that are newer than ours or unknown here.
    ///
    /// Returns how many entries were adopted.
    fn adopt_stored(&mut self, stored: &BTreeMap<String, OverrideEntry>) -> usize {
        let mut adopted = 0;
        for (key, incoming) in stored {
            if self.cleared.contains(key) {
                continue;
            }
            let take = match self.entries.get(key) {
                Some(current) => incoming.updated_at > current.updated_at,
                None => true,
            };
            if take {
                self.entries.insert(key.clone(), incoming.clone());
                adopted += 1;
            }
        }
        adopted
    }
}

/// Registry of developer-forced values, one namespace per tool
#[derive(Debug)]
pub struct OverrideRegistry {
    adapter: StorageAdapter,
    catalog: RwLock<ToolCatalog>,
    mode: PersistMode,
    tools: RwLock<HashMap<String, ToolOverrides>>,
    dirty: RwLock<BTreeSet<String>>,
}

fn poisoned() -> OverrideError {
    OverrideError::Internal("Lock poisoned".into())
}

fn validate_ids(tool_id: &str, key: &str) -> OverrideResult<()> {
    if tool_id.trim().is_empty() {
        return Err(OverrideError::InvalidIdentifier("tool id is empty".into()));
    }
    if key.trim().is_empty() {
        return Err(OverrideError::InvalidIdentifier(format!(
            "key is empty for tool {}",
            tool_id
        )));
    }
    Ok(())
}

impl OverrideRegistry {
    /// Create an empty registry without reading storage
    pub fn new(adapter: StorageAdapter, mode: PersistMode) -> Self {
        Self {
            adapter,
            catalog: RwLock::new(ToolCatalog::new()),
            mode,
            tools: RwLock::new(HashMap::new()),
            dirty: RwLock::new(BTreeSet::new()),
        }
    }

    /// Create a registry whose initial state is everything persisted
    pub fn hydrate(adapter: StorageAdapter, mode: PersistMode) -> Self {
        let registry = Self::new(adapter, mode);

        let mut tool_count = 0usize;
        let mut entry_count = 0usize;
        let mut loaded = HashMap::new();
        for tool_id in registry.adapter.tool_ids(StorageSuffix::Overrides) {
            let entries = registry.load_tool(&tool_id);
            if entries.is_empty() {
                continue;
            }
            tool_count += 1;
            entry_count += entries.len();
            loaded.insert(tool_id, ToolOverrides::new(entries));
        }

        if let Ok(mut tools) = registry.tools.write() {
            *tools = loaded;
        }

        log_event_with_fields(
            Event::RegistryHydrated,
            &[
                ("entries", entry_count.to_string().as_str()),
                ("namespace", registry.adapter.namespace()),
                ("tools", tool_count.to_string().as_str()),
            ],
        );
        registry
    }

    /// Persist mode in effect
    pub fn mode(&self) -> PersistMode {
        self.mode
    }

    /// Declare a tool's known keys and defaults
    pub fn register_tool(&self, definition: ToolDefinition) {
        if let Ok(mut catalog) = self.catalog.write() {
            catalog.register(definition);
        }
    }

    /// Copy of the host catalog
    pub fn catalog(&self) -> ToolCatalog {
        self.catalog.read().map(|c| c.clone()).unwrap_or_default()
    }

    /// Force `value` for `key` in `tool_id`, stamped now
    pub fn set_override(
        &self,
        tool_id: &str,
        key: &str,
        value: Value,
    ) -> OverrideResult<WriteOutcome> {
        self.apply(OverrideEntry::new(tool_id, key, value))
    }

    /// Apply a fully formed entry under last-write-wins.
    ///
    /// An existing entry with a strictly newer `updated_at` wins and the
    /// call returns `WriteOutcome::Unchanged`.
    pub fn apply(&self, entry: OverrideEntry) -> OverrideResult<WriteOutcome> {
        validate_ids(&entry.tool_id, &entry.key)?;
        self.catalog
            .read()
            .map_err(|_| poisoned())?
            .check(&entry.tool_id, &entry.key, &entry.value)?;

        let (subject, snapshot) = {
            let mut tools = self.tools.write().map_err(|_| poisoned())?;
            let tool = tools
                .entry(entry.tool_id.clone())
                .or_insert_with(ToolOverrides::empty);

            if let Some(existing) = tool.entries.get(&entry.key) {
                if !entry.supersedes(existing) {
                    log_event_with_fields(
                        Event::OverrideStale,
                        &[("key", entry.key.as_str()), ("tool", entry.tool_id.as_str())],
                    );
                    return Ok(WriteOutcome::Unchanged);
                }
            }

            tool.cleared.remove(&entry.key);
            tool.entries.insert(entry.key.clone(), entry.clone());
            (tool.subject.clone(), tool.snapshot())
        };

        log_event_with_fields(
            Event::OverrideSet,
            &[("key", entry.key.as_str()), ("tool", entry.tool_id.as_str())],
        );
        subject.publish(snapshot);

        Ok(self.persist_or_defer(&entry.tool_id))
    }

    /// Remove the override for `key`; unknown keys are `Unchanged`
    pub fn clear_override(&self, tool_id: &str, key: &str) -> OverrideResult<WriteOutcome> {
        validate_ids(tool_id, key)?;

        let (subject, snapshot) = {
            let mut tools = self.tools.write().map_err(|_| poisoned())?;
            let Some(tool) = tools.get_mut(tool_id) else {
                return Ok(WriteOutcome::Unchanged);
            };
            if tool.entries.remove(key).is_none() {
                return Ok(WriteOutcome::Unchanged);
            }
            tool.cleared.insert(key.to_string());
            (tool.subject.clone(), tool.snapshot())
        };

        log_event_with_fields(Event::OverrideCleared, &[("key", key), ("tool", tool_id)]);
        subject.publish(snapshot);

        Ok(self.persist_or_defer(tool_id))
    }

    /// Remove every override of one tool
    pub fn reset_tool(&self, tool_id: &str) -> OverrideResult<WriteOutcome> {
        if tool_id.trim().is_empty() {
            return Err(OverrideError::InvalidIdentifier("tool id is empty".into()));
        }

        let stored = self.load_tool(tool_id);
        let (subject, removed) = {
            let mut tools = self.tools.write().map_err(|_| poisoned())?;
            let Some(tool) = tools.get_mut(tool_id) else {
                return Ok(WriteOutcome::Unchanged);
            };
            if tool.entries.is_empty() {
                return Ok(WriteOutcome::Unchanged);
            }
            let removed = tool.entries.len();
            let keys: Vec<String> = tool.entries.keys().chain(stored.keys()).cloned().collect();
            tool.cleared.extend(keys);
            tool.entries.clear();
            (tool.subject.clone(), removed)
        };

        log_event_with_fields(
            Event::ToolReset,
            &[("removed", removed.to_string().as_str()), ("tool", tool_id)],
        );
        subject.publish(Vec::new());

        Ok(self.persist_or_defer(tool_id))
    }

    /// Remove every override of every tool; returns tools affected
    pub fn reset_all(&self) -> OverrideResult<usize> {
        let mut affected = 0;
        for tool_id in self.tool_ids() {
            if self.reset_tool(&tool_id)?.is_applied() {
                affected += 1;
            }
        }
        Ok(affected)
    }

    /// Subscribe to a tool's overrides.
    ///
    /// `callback` receives the current entries immediately (empty for a
    /// tool with nothing set), then the full list after every change.
    pub fn get_overrides<F>(&self, tool_id: &str, callback: F) -> OverrideResult<Subscription>
    where
        F: Fn(&Vec<OverrideEntry>) + Send + Sync + 'static,
    {
        let subject = {
            let mut tools = self.tools.write().map_err(|_| poisoned())?;
            tools
                .entry(tool_id.to_string())
                .or_insert_with(ToolOverrides::empty)
                .subject
                .clone()
        };
        Ok(subject.subscribe(callback))
    }

    /// Current entries of a tool, sorted by key
    pub fn overrides(&self, tool_id: &str) -> Vec<OverrideEntry> {
        self.tools
            .read()
            .ok()
            .and_then(|tools| tools.get(tool_id).map(|t| t.snapshot()))
            .unwrap_or_default()
    }

    /// Forced value for one key
    pub fn get_override(&self, tool_id: &str, key: &str) -> Option<Value> {
        let tools = self.tools.read().ok()?;
        tools
            .get(tool_id)?
            .entries
            .get(key)
            .map(|e| e.value.clone())
    }

    /// Override if set, otherwise the host-declared default
    pub fn effective_value(&self, tool_id: &str, key: &str) -> Option<Value> {
        self.get_override(tool_id, key).or_else(|| {
            self.catalog
                .read()
                .ok()?
                .default_value(tool_id, key)
                .cloned()
        })
    }

    /// Tools with at least one override, sorted
    pub fn tool_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .tools
            .read()
            .map(|tools| {
                tools
                    .iter()
                    .filter(|(_, t)| !t.entries.is_empty())
                    .map(|(id, _)| id.clone())
                    .collect()
            })
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Merge changes another tab made to storage.
    ///
    /// Persisted entries win when at least as new as the in-memory ones,
    /// except keys cleared here and not yet written. In-memory entries
    /// missing from storage are dropped unless the tool has unflushed
    /// local changes. Returns the number of tools changed.
    pub fn sync_from_storage(&self) -> usize {
        let dirty: BTreeSet<String> = self.dirty.read().map(|d| d.clone()).unwrap_or_default();

        let mut ids: BTreeSet<String> = self
            .adapter
            .tool_ids(StorageSuffix::Overrides)
            .into_iter()
            .collect();
        if let Ok(tools) = self.tools.read() {
            ids.extend(tools.keys().cloned());
        }

        let mut changed_tools = 0;
        for tool_id in ids {
            let persisted = self.load_tool(&tool_id);

            let update = {
                let Ok(mut tools) = self.tools.write() else {
                    break;
                };
                let tool = tools
                    .entry(tool_id.clone())
                    .or_insert_with(ToolOverrides::empty);
                let mut changed = false;

                for (key, incoming) in &persisted {
                    if tool.cleared.contains(key) {
                        continue;
                    }
                    let take = match tool.entries.get(key) {
                        Some(current) => current != incoming && incoming.supersedes(current),
                        None => true,
                    };
                    if take {
                        tool.entries.insert(key.clone(), incoming.clone());
                        changed = true;
                    }
                }

                if !dirty.contains(&tool_id) {
                    let before = tool.entries.len();
                    tool.entries.retain(|key, _| persisted.contains_key(key));
                    changed |= tool.entries.len() != before;
                }

                changed.then(|| (tool.subject.clone(), tool.snapshot()))
            };

            if let Some((subject, snapshot)) = update {
                subject.publish(snapshot);
                changed_tools += 1;
            }
        }

        log_event_with_fields(
            Event::RegistrySynced,
            &[("changed_tools", changed_tools.to_string().as_str())],
        );
        changed_tools
    }

    /// Write every tool with unflushed changes.
    ///
    /// Returns `true` when all writes succeeded; failed tools stay pending.
    pub fn flush(&self) -> bool {
        let pending: Vec<String> = match self.dirty.write() {
            Ok(mut dirty) => std::mem::take(&mut *dirty).into_iter().collect(),
            Err(_) => return false,
        };

        let mut all_ok = true;
        for tool_id in pending {
            if self.persist_tool(&tool_id) != WriteOutcome::Persisted {
                self.mark_dirty(&tool_id);
                all_ok = false;
            }
        }
        all_ok
    }

    /// Number of tools waiting to be written
    pub fn pending_writes(&self) -> usize {
        self.dirty.read().map(|d| d.len()).unwrap_or(0)
    }

    fn mark_dirty(&self, tool_id: &str) {
        if let Ok(mut dirty) = self.dirty.write() {
            dirty.insert(tool_id.to_string());
        }
    }

    fn persist_or_defer(&self, tool_id: &str) -> WriteOutcome {
        match self.mode {
            PersistMode::Deferred => {
                self.mark_dirty(tool_id);
                WriteOutcome::Pending
            }
            PersistMode::Immediate => {
                let outcome = self.persist_tool(tool_id);
                if outcome == WriteOutcome::MemoryOnly {
                    self.mark_dirty(tool_id);
                }
                outcome
            }
        }
    }

    fn persist_tool(&self, tool_id: &str) -> WriteOutcome {
        let key = self.adapter.storage_key(tool_id, StorageSuffix::Overrides);
        let stored = self.load_tool(tool_id);

        let (entries, written_clears, update) = {
            let Ok(mut tools) = self.tools.write() else {
                return WriteOutcome::MemoryOnly;
            };
            let tool = tools
                .entry(tool_id.to_string())
                .or_insert_with(ToolOverrides::empty);
            let adopted = tool.adopt_stored(&stored);
            let update =
                (adopted > 0).then(|| (tool.subject.clone(), tool.snapshot(), adopted));
            (tool.entries.clone(), tool.cleared.clone(), update)
        };

        let result = if entries.is_empty() {
            self.adapter.remove(&key)
        } else {
            self.adapter.set_as(&key, &entries)
        };

        if result.is_ok() {
            if let Ok(mut tools) = self.tools.write() {
                if let Some(tool) = tools.get_mut(tool_id) {
                    tool.cleared.retain(|k| !written_clears.contains(k));
                }
            }
        }

        if let Some((subject, snapshot, adopted)) = update {
            log_event_with_fields(
                Event::OverrideAdopted,
                &[("adopted", adopted.to_string().as_str()), ("tool", tool_id)],
            );
            subject.publish(snapshot);
        }

        match result {
            Ok(()) => WriteOutcome::Persisted,
            Err(_) => WriteOutcome::MemoryOnly,
        }
    }

    fn load_tool(&self, tool_id: &str) -> BTreeMap<String, OverrideEntry> {
        let key = self.adapter.storage_key(tool_id, StorageSuffix::Overrides);
        let Some(raw) = self.adapter.get_as::<BTreeMap<String, Value>>(&key) else {
            return BTreeMap::new();
        };

        let mut entries = BTreeMap::new();
        for (entry_key, value) in raw {
            match serde_json::from_value::<OverrideEntry>(value) {
                Ok(entry) if entry.tool_id == tool_id && entry.key == entry_key => {
                    entries.insert(entry_key, entry);
                }
                _ => {
                    log_event_with_fields(
                        Event::OverrideDiscarded,
                        &[("key", entry_key.as_str()), ("tool", tool_id)],
                    );
                }
            }
        }
        entries
    }
}

impl Drop for OverrideRegistry {
    fn drop(&mut self) {
        if self.pending_writes() > 0 {
            self.flush();
        }
    }
}
