//! # Override Errors

use thiserror::Error;

use super::catalog::JsonKind;

/// Result type for override operations
pub type OverrideResult<T> = Result<T, OverrideError>;

/// Override registry errors.
///
/// Storage failures are not represented here: they degrade the registry
/// to memory-only behaviour and surface through `WriteOutcome` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverrideError {
    /// Tool id or key is empty
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Value kind disagrees with the host-declared default
    #[error("Type mismatch for {tool_id}/{key}: expected {expected}, found {found}")]
    TypeMismatch {
        tool_id: String,
        key: String,
        expected: JsonKind,
        found: JsonKind,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}
