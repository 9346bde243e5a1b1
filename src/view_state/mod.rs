//! # View State
//!
//! Transient per-panel UI preferences persisted for convenience.

pub mod query;
pub mod state;
pub mod store;

pub use query::{apply_view_state, PanelItem};
pub use state::{SortOrder, ToolViewState, ViewStatePatch, DEFAULT_FILTER};
pub use store::ViewStateStore;
