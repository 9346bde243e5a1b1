//! # Tool View State

use std::fmt;

use serde::{Deserialize, Serialize};

/// Filter value a fresh panel starts with
pub const DEFAULT_FILTER: &str = super::query::FILTER_ALL;

/// Sort direction of a panel list.
///
/// Panels currently only sort ascending; `Desc` is kept so stored state
/// written by a newer panel still decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order '{}', expected asc or desc", other)),
        }
    }
}

/// UI preferences of one tool panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolViewState {
    pub search_query: String,
    /// Opaque to the store; the panel interprets it
    pub filter: String,
    pub sort_order: SortOrder,
}

impl Default for ToolViewState {
    fn default() -> Self {
        Self {
            search_query: String::new(),
            filter: DEFAULT_FILTER.to_string(),
            sort_order: SortOrder::Asc,
        }
    }
}

impl ToolViewState {
    /// Shallow merge: every field present in `patch` replaces ours
    pub fn merge(&mut self, patch: ViewStatePatch) {
        if let Some(search_query) = patch.search_query {
            self.search_query = search_query;
        }
        if let Some(filter) = patch.filter {
            self.filter = filter;
        }
        if let Some(sort_order) = patch.sort_order {
            self.sort_order = sort_order;
        }
    }
}

/// Partial update of a [`ToolViewState`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewStatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

impl ViewStatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search_query(mut self, query: impl Into<String>) -> Self {
        self.search_query = Some(query.into());
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = Some(order);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.search_query.is_none() && self.filter.is_none() && self.sort_order.is_none()
    }
}
