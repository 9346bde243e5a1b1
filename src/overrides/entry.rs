//! # Override Entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A developer-forced value for one (tool, key) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideEntry {
    /// Owning tool
    pub tool_id: String,

    /// Setting being overridden within the tool
    pub key: String,

    /// Forced value
    pub value: Value,

    /// Wall-clock time of the write, used for last-write-wins
    pub updated_at: DateTime<Utc>,
}

impl OverrideEntry {
    /// Create an entry stamped with the current time
    pub fn new(tool_id: impl Into<String>, key: impl Into<String>, value: Value) -> Self {
        Self::at(tool_id, key, value, Utc::now())
    }

    /// Create an entry with an explicit timestamp
    pub fn at(
        tool_id: impl Into<String>,
        key: impl Into<String>,
        value: Value,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            tool_id: tool_id.into(),
            key: key.into(),
            value,
            updated_at,
        }
    }

    /// Whether this entry should replace `existing` under last-write-wins.
    ///
    /// Ties go to the incoming write.
    pub fn supersedes(&self, existing: &OverrideEntry) -> bool {
        self.updated_at >= existing.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn test_camel_case_wire_format() {
        let ts = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let entry = OverrideEntry::at("feature-flags", "dark-mode", json!(true), ts);

        let encoded = serde_json::to_value(&entry).unwrap();
        assert_eq!(encoded["toolId"], "feature-flags");
        assert_eq!(encoded["key"], "dark-mode");
        assert_eq!(encoded["value"], true);
        assert_eq!(encoded["updatedAt"], "2024-05-01T10:00:00Z");
    }

    #[test]
    fn test_supersedes() {
        let now = Utc::now();
        let older = OverrideEntry::at("t", "k", json!(1), now - Duration::seconds(5));
        let newer = OverrideEntry::at("t", "k", json!(2), now);

        assert!(newer.supersedes(&older));
        assert!(!older.supersedes(&newer));
        assert!(newer.supersedes(&newer.clone()));
    }
}
