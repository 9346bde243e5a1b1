//! Observability for the toolbar core
//!
//! Structured JSON log lines, one per lifecycle event. Logging never
//! fails and never affects the outcome of the operation being logged.

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event with fields at its default severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
