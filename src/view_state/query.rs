//! # Panel List Query
//!
//! Applies a panel's view state to the rows it displays.

use serde::{Deserialize, Serialize};

use super::state::{SortOrder, ToolViewState};

/// Built-in filter names panels understand
pub const FILTER_ALL: &str = "all";
pub const FILTER_ENABLED: &str = "enabled";
pub const FILTER_DISABLED: &str = "disabled";
pub const FILTER_OVERRIDDEN: &str = "overridden";

/// One row of a tool panel (a flag, a locale, a permission, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelItem {
    pub id: String,
    pub label: String,
    /// Effective state after overrides
    pub enabled: bool,
    /// Whether a developer override is active for this row
    pub overridden: bool,
}

impl PanelItem {
    pub fn new(id: impl Into<String>, label: impl Into<String>, enabled: bool) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            enabled,
            overridden: false,
        }
    }

    pub fn overridden(mut self, overridden: bool) -> Self {
        self.overridden = overridden;
        self
    }

    fn matches_search(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.id.to_lowercase().contains(needle)
            || self.label.to_lowercase().contains(needle)
    }

    fn matches_filter(&self, filter: &str) -> bool {
        match filter {
            FILTER_ENABLED => self.enabled,
            FILTER_DISABLED => !self.enabled,
            FILTER_OVERRIDDEN => self.overridden,
            FILTER_ALL => true,
            // stored by a newer panel
            _ => true,
        }
    }
}

/// Rows visible under `state`: searched, filtered, then sorted by id
pub fn apply_view_state(items: &[PanelItem], state: &ToolViewState) -> Vec<PanelItem> {
    let needle = state.search_query.trim().to_lowercase();

    let mut visible: Vec<PanelItem> = items
        .iter()
        .filter(|item| item.matches_search(&needle))
        .filter(|item| item.matches_filter(&state.filter))
        .cloned()
        .collect();

    visible.sort_by(|a, b| a.id.cmp(&b.id));
    if state.sort_order == SortOrder::Desc {
        visible.reverse();
    }
    visible
}
