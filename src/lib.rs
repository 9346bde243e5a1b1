//! devbar - override and view-state core of a development-time toolbar
//!
//! Tool panels (feature flags, language, permissions, ...) force values
//! over the host application's state and remember their own search,
//! filter and sort settings across reloads.
//!
//! - `storage`: namespaced JSON over a key-value backend
//! - `overrides`: observable registry of forced values
//! - `view_state`: per-panel UI preferences
//! - `licensing`: read-only feature feed from the host
//! - `toolbar`: configuration and the session handle passed to panels

pub mod cli;
pub mod licensing;
pub mod observability;
pub mod overrides;
pub mod storage;
pub mod toolbar;
pub mod view_state;
