//! # Tool Catalog
//!
//! Keys and defaults the host application declares per tool. The registry
//! uses them for a basic JSON type check and for effective values; it does
//! not validate anything further.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{OverrideError, OverrideResult};

/// Coarse JSON value kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonKind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl JsonKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => JsonKind::Null,
            Value::Bool(_) => JsonKind::Bool,
            Value::Number(_) => JsonKind::Number,
            Value::String(_) => JsonKind::String,
            Value::Array(_) => JsonKind::Array,
            Value::Object(_) => JsonKind::Object,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JsonKind::Null => "null",
            JsonKind::Bool => "bool",
            JsonKind::Number => "number",
            JsonKind::String => "string",
            JsonKind::Array => "array",
            JsonKind::Object => "object",
        }
    }
}

impl fmt::Display for JsonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A key the host knows about, with the value the app computes by default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownOption {
    pub key: String,
    pub default: Value,
}

impl KnownOption {
    pub fn new(key: impl Into<String>, default: Value) -> Self {
        Self {
            key: key.into(),
            default,
        }
    }
}

/// One toolbar panel as declared by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub id: String,
    #[serde(default)]
    pub options: Vec<KnownOption>,
}

impl ToolDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            options: Vec::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, default: Value) -> Self {
        self.options.push(KnownOption::new(key, default));
        self
    }

    pub fn option(&self, key: &str) -> Option<&KnownOption> {
        self.options.iter().find(|o| o.key == key)
    }
}

/// Host-declared tools by id
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: HashMap<String, ToolDefinition>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a tool definition
    pub fn register(&mut self, definition: ToolDefinition) {
        self.tools.insert(definition.id.clone(), definition);
    }

    pub fn get(&self, tool_id: &str) -> Option<&ToolDefinition> {
        self.tools.get(tool_id)
    }

    /// Declared default for a key, if any
    pub fn default_value(&self, tool_id: &str, key: &str) -> Option<&Value> {
        self.get(tool_id)?.option(key).map(|o| &o.default)
    }

    /// Registered tool ids, sorted
    pub fn tool_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.tools.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Basic type check of `value` against the declared default.
    ///
    /// Undeclared tools and keys pass. A `null` default accepts anything,
    /// and `null` is always accepted as a value.
    pub fn check(&self, tool_id: &str, key: &str, value: &Value) -> OverrideResult<()> {
        let Some(default) = self.default_value(tool_id, key) else {
            return Ok(());
        };

        let expected = JsonKind::of(default);
        let found = JsonKind::of(value);
        if expected == JsonKind::Null || found == JsonKind::Null || expected == found {
            return Ok(());
        }

        Err(OverrideError::TypeMismatch {
            tool_id: tool_id.to_string(),
            key: key.to_string(),
            expected,
            found,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> ToolCatalog {
        let mut catalog = ToolCatalog::new();
        catalog.register(
            ToolDefinition::new("feature-flags")
                .with_option("dark-mode", json!(false))
                .with_option("beta", Value::Null),
        );
        catalog.register(ToolDefinition::new("language").with_option("locale", json!("en")));
        catalog
    }

    #[test]
    fn test_json_kind() {
        assert_eq!(JsonKind::of(&json!(1.5)), JsonKind::Number);
        assert_eq!(JsonKind::of(&json!([1])), JsonKind::Array);
        assert_eq!(JsonKind::of(&json!({})), JsonKind::Object);
    }

    #[test]
    fn test_check_accepts_matching_kind() {
        let catalog = catalog();
        assert!(catalog.check("feature-flags", "dark-mode", &json!(true)).is_ok());
        assert!(catalog.check("language", "locale", &json!("de")).is_ok());
    }

    #[test]
    fn test_check_rejects_mismatch() {
        let catalog = catalog();
        let err = catalog
            .check("feature-flags", "dark-mode", &json!("yes"))
            .unwrap_err();
        assert!(matches!(
            err,
            OverrideError::TypeMismatch {
                expected: JsonKind::Bool,
                found: JsonKind::String,
                ..
            }
        ));
    }

    #[test]
    fn test_check_passes_unknown_and_null() {
        let catalog = catalog();
        assert!(catalog.check("unknown-tool", "x", &json!(1)).is_ok());
        assert!(catalog.check("feature-flags", "undeclared", &json!(1)).is_ok());
        assert!(catalog.check("feature-flags", "beta", &json!([1, 2])).is_ok());
        assert!(catalog.check("feature-flags", "dark-mode", &Value::Null).is_ok());
    }

    #[test]
    fn test_tool_definition_deserializes_without_options() {
        let def: ToolDefinition = serde_json::from_value(json!({"id": "permissions"})).unwrap();
        assert!(def.options.is_empty());
    }
}
