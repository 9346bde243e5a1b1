//! # Licensing Feed
//!
//! The host's licensing / feature service pushes `{ id, enabled }` records.
//! The toolbar only reads them, to decide which overrides name a feature
//! the service knows about and are therefore worth displaying.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::overrides::{OverrideEntry, OverrideRegistry, OverrideResult, Subject, Subscription};

/// One feature as reported by the licensing service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub id: String,
    pub enabled: bool,
}

impl FeatureRecord {
    pub fn new(id: impl Into<String>, enabled: bool) -> Self {
        Self {
            id: id.into(),
            enabled,
        }
    }
}

/// Push-based stream of the service's current feature list
#[derive(Debug, Clone)]
pub struct FeatureFeed {
    subject: Subject<Vec<FeatureRecord>>,
}

impl Default for FeatureFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureFeed {
    pub fn new() -> Self {
        Self {
            subject: Subject::new(Vec::new()),
        }
    }

    /// Replace the feature list; called by the host integration
    pub fn push(&self, records: Vec<FeatureRecord>) {
        self.subject.publish(records);
    }

    /// Latest feature list
    pub fn current(&self) -> Vec<FeatureRecord> {
        self.subject.current().unwrap_or_default()
    }

    /// Replay-one subscription to the feature list
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Vec<FeatureRecord>) + Send + Sync + 'static,
    {
        self.subject.subscribe(callback)
    }

    /// Number of attached consumers
    pub fn subscriber_count(&self) -> usize {
        self.subject.subscriber_count()
    }
}

/// Overrides whose key names a feature the service reports, enabled or not
pub fn eligible_overrides(
    entries: &[OverrideEntry],
    records: &[FeatureRecord],
) -> Vec<OverrideEntry> {
    let known: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
    entries
        .iter()
        .filter(|e| known.contains(e.key.as_str()))
        .cloned()
        .collect()
}

#[derive(Debug, Default)]
struct EligibilityState {
    records: Vec<FeatureRecord>,
    entries: Vec<OverrideEntry>,
    eligible: Vec<OverrideEntry>,
}

impl EligibilityState {
    fn recompute(&mut self) {
        self.eligible = eligible_overrides(&self.entries, &self.records);
    }
}

/// Live intersection of one tool's overrides with the feature feed.
///
/// Detaches from both streams when dropped.
#[derive(Debug)]
pub struct EligibilityView {
    state: Arc<RwLock<EligibilityState>>,
    _feed_subscription: Subscription,
    _override_subscription: Subscription,
}

impl EligibilityView {
    pub fn new(
        registry: &OverrideRegistry,
        tool_id: &str,
        feed: &FeatureFeed,
    ) -> OverrideResult<Self> {
        let state = Arc::new(RwLock::new(EligibilityState::default()));

        let feed_state = Arc::clone(&state);
        let feed_subscription = feed.subscribe(move |records| {
            if let Ok(mut state) = feed_state.write() {
                state.records = records.clone();
                state.recompute();
            }
        });

        let override_state = Arc::clone(&state);
        let override_subscription = registry.get_overrides(tool_id, move |entries| {
            if let Ok(mut state) = override_state.write() {
                state.entries = entries.clone();
                state.recompute();
            }
        })?;

        Ok(Self {
            state,
            _feed_subscription: feed_subscription,
            _override_subscription: override_subscription,
        })
    }

    /// Overrides currently eligible for display
    pub fn eligible(&self) -> Vec<OverrideEntry> {
        self.state
            .read()
            .map(|s| s.eligible.clone())
            .unwrap_or_default()
    }

    /// Whether the service currently reports `feature_id` as enabled
    pub fn is_enabled(&self, feature_id: &str) -> Option<bool> {
        let state = self.state.read().ok()?;
        state
            .records
            .iter()
            .find(|r| r.id == feature_id)
            .map(|r| r.enabled)
    }
}
