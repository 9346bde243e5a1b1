//! Toolbar configuration
//!
//! Loaded from a JSON file; every field has a default so `{}` is a valid
//! configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{log_event_with_fields, Event};
use crate::overrides::PersistMode;
use crate::storage::{DEFAULT_NAMESPACE, KEY_SEPARATOR};

/// Result type for configuration
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {message}")]
    Read { path: String, message: String },

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Toolbar session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolbarConfig {
    /// Prefix of every storage key
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// When override changes reach storage
    #[serde(default)]
    pub persist_mode: PersistMode,

    /// Directory for persistent storage; memory-only when absent
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

impl Default for ToolbarConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            persist_mode: PersistMode::default(),
            storage_dir: None,
        }
    }
}

impl ToolbarConfig {
    /// Memory-only configuration
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Configuration persisting under `dir`
    pub fn persistent(dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: Some(dir.into()),
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_persist_mode(mut self, mode: PersistMode) -> Self {
        self.persist_mode = mode;
        self
    }

    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let config = Self::from_json(&content)?;
        log_event_with_fields(
            Event::ConfigLoaded,
            &[("namespace", config.namespace.as_str())],
        );
        Ok(config)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: ToolbarConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Namespace must be non-empty and must not contain the key separator
    pub fn validate(&self) -> ConfigResult<()> {
        if self.namespace.trim().is_empty() {
            return Err(ConfigError::Invalid("namespace must not be empty".into()));
        }
        if self.namespace.contains(KEY_SEPARATOR) {
            return Err(ConfigError::Invalid(format!(
                "namespace '{}' must not contain '{}'",
                self.namespace, KEY_SEPARATOR
            )));
        }
        Ok(())
    }
}
