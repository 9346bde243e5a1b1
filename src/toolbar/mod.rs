//! # Toolbar
//!
//! Session wiring: configuration, then storage, overrides and view state
//! assembled into one explicitly passed handle.

pub mod config;
pub mod session;

pub use config::{ConfigError, ConfigResult, ToolbarConfig};
pub use session::ToolbarSession;
