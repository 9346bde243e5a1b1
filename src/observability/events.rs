//! Toolbar lifecycle events
//!
//! Every log line emitted by the crate names one of these events.

use std::fmt;

use super::logger::Severity;

/// Observable events in the toolbar core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Session
    /// Toolbar session opened
    SessionOpen,
    /// Toolbar session closed, pending writes flushed
    SessionClose,
    /// Configuration loaded from disk
    ConfigLoaded,

    // Override registry
    /// Registry rebuilt from persisted snapshot
    RegistryHydrated,
    /// Override written
    OverrideSet,
    /// Override ignored because a newer write exists
    OverrideStale,
    /// Override removed
    OverrideCleared,
    /// All overrides of a tool removed
    ToolReset,
    /// Persisted entry disagrees with its storage location
    OverrideDiscarded,
    /// Changes from another tab merged in
    RegistrySynced,
    /// Newer stored entries taken over before a write
    OverrideAdopted,

    // View state
    /// View state merged and stored
    ViewStateSaved,

    // Storage
    /// Stored payload could not be parsed
    StorageReadCorrupt,
    /// Backend read failed
    StorageReadFailed,
    /// Backend write failed
    StorageWriteFailed,
    /// Backend remove failed
    StorageRemoveFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::SessionOpen => "SESSION_OPEN",
            Event::SessionClose => "SESSION_CLOSE",
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::RegistryHydrated => "REGISTRY_HYDRATED",
            Event::OverrideSet => "OVERRIDE_SET",
            Event::OverrideStale => "OVERRIDE_STALE",
            Event::OverrideCleared => "OVERRIDE_CLEARED",
            Event::ToolReset => "TOOL_RESET",
            Event::OverrideDiscarded => "OVERRIDE_DISCARDED",
            Event::RegistrySynced => "REGISTRY_SYNCED",
            Event::OverrideAdopted => "OVERRIDE_ADOPTED",

            Event::ViewStateSaved => "VIEW_STATE_SAVED",

            Event::StorageReadCorrupt => "STORAGE_READ_CORRUPT",
            Event::StorageReadFailed => "STORAGE_READ_FAILED",
            Event::StorageWriteFailed => "STORAGE_WRITE_FAILED",
            Event::StorageRemoveFailed => "STORAGE_REMOVE_FAILED",
        }
    }

    /// Default severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::StorageWriteFailed | Event::StorageRemoveFailed => Severity::Error,
            Event::StorageReadCorrupt
            | Event::StorageReadFailed
            | Event::OverrideDiscarded => Severity::Warn,
            Event::SessionOpen
            | Event::SessionClose
            | Event::ConfigLoaded
            | Event::RegistryHydrated
            | Event::ToolReset
            | Event::RegistrySynced
            | Event::OverrideAdopted => Severity::Info,
            Event::OverrideSet
            | Event::OverrideStale
            | Event::OverrideCleared
            | Event::ViewStateSaved => Severity::Trace,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_screaming_snake() {
        let events = [
            Event::SessionOpen,
            Event::RegistryHydrated,
            Event::OverrideSet,
            Event::StorageReadCorrupt,
            Event::StorageWriteFailed,
        ];
        for event in events {
            assert!(event
                .as_str()
                .chars()
                .all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_storage_failures_are_errors() {
        assert_eq!(Event::StorageWriteFailed.severity(), Severity::Error);
        assert_eq!(Event::StorageReadCorrupt.severity(), Severity::Warn);
        assert_eq!(Event::OverrideSet.severity(), Severity::Trace);
    }
}
