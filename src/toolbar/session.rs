//! Toolbar session
//!
//! One session per application run. It owns the storage adapter, the
//! override registry and the view-state store, and is handed to each
//! panel explicitly; there is no global instance.

use std::sync::Arc;

use uuid::Uuid;

use crate::observability::{log_event_with_fields, Event};
use crate::overrides::OverrideRegistry;
use crate::storage::{KeyValueBackend, LocalBackend, MemoryBackend, StorageAdapter};
use crate::view_state::ViewStateStore;

use super::config::{ConfigResult, ToolbarConfig};

/// Handle shared by every panel of one toolbar
#[derive(Debug, Clone)]
pub struct ToolbarSession {
    id: Uuid,
    config: ToolbarConfig,
    persistent: bool,
    adapter: StorageAdapter,
    registry: Arc<OverrideRegistry>,
    view_states: Arc<ViewStateStore>,
}

impl ToolbarSession {
    /// Open a session, hydrating overrides from storage.
    ///
    /// If the storage directory cannot be opened the session falls back
    /// to memory-only storage instead of failing.
    pub fn open(config: ToolbarConfig) -> ConfigResult<Self> {
        config.validate()?;

        let memory = || -> Arc<dyn KeyValueBackend> { Arc::new(MemoryBackend::new()) };
        let (backend, persistent) = match &config.storage_dir {
            Some(dir) => match LocalBackend::open(dir) {
                Ok(backend) => (Arc::new(backend) as Arc<dyn KeyValueBackend>, true),
                Err(e) => {
                    log_event_with_fields(
                        Event::StorageReadFailed,
                        &[
                            ("dir", dir.display().to_string().as_str()),
                            ("error", e.to_string().as_str()),
                        ],
                    );
                    (memory(), false)
                }
            },
            None => (memory(), false),
        };

        Ok(Self::assemble(config, backend, persistent))
    }

    /// Open a session over a caller-supplied backend
    pub fn with_backend(
        config: ToolbarConfig,
        backend: Arc<dyn KeyValueBackend>,
    ) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self::assemble(config, backend, true))
    }

    fn assemble(config: ToolbarConfig, backend: Arc<dyn KeyValueBackend>, persistent: bool) -> Self {
        let adapter = StorageAdapter::new(backend, config.namespace.clone());
        let registry = OverrideRegistry::hydrate(adapter.clone(), config.persist_mode);
        let view_states = ViewStateStore::new(adapter.clone());
        let id = Uuid::new_v4();

        log_event_with_fields(
            Event::SessionOpen,
            &[
                ("namespace", config.namespace.as_str()),
                ("persistent", if persistent { "true" } else { "false" }),
                ("session", id.to_string().as_str()),
            ],
        );

        Self {
            id,
            config,
            persistent,
            adapter,
            registry: Arc::new(registry),
            view_states: Arc::new(view_states),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &ToolbarConfig {
        &self.config
    }

    /// Whether data outlives the session
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn storage(&self) -> &StorageAdapter {
        &self.adapter
    }

    pub fn overrides(&self) -> &Arc<OverrideRegistry> {
        &self.registry
    }

    pub fn view_states(&self) -> &Arc<ViewStateStore> {
        &self.view_states
    }

    /// Flush pending writes and end the session.
    ///
    /// Returns `false` if some override could not be written.
    pub fn close(self) -> bool {
        let flushed = self.registry.flush();
        log_event_with_fields(
            Event::SessionClose,
            &[
                ("flushed", if flushed { "true" } else { "false" }),
                ("session", self.id.to_string().as_str()),
            ],
        );
        flushed
    }
}
