//! CLI-specific error types

use std::fmt;
use std::io;

use crate::overrides::OverrideError;
use crate::storage::StorageError;
use crate::toolbar::ConfigError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdout)
    IoError,
    /// Override refused by the registry
    OverrideRejected,
    /// Storage write failed
    StorageError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "DEVBAR_CLI_CONFIG_ERROR",
            Self::IoError => "DEVBAR_CLI_IO_ERROR",
            Self::OverrideRejected => "DEVBAR_CLI_OVERRIDE_REJECTED",
            Self::StorageError => "DEVBAR_CLI_STORAGE_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<OverrideError> for CliError {
    fn from(e: OverrideError) -> Self {
        Self::new(CliErrorCode::OverrideRejected, e.to_string())
    }
}

impl From<StorageError> for CliError {
    fn from(e: StorageError) -> Self {
        Self::new(CliErrorCode::StorageError, e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code() {
        let err = CliError::config_error("bad namespace");
        assert_eq!(err.to_string(), "DEVBAR_CLI_CONFIG_ERROR: bad namespace");
    }

    #[test]
    fn test_override_error_maps_to_rejected() {
        let err: CliError = OverrideError::InvalidIdentifier("tool id is empty".into()).into();
        assert_eq!(err.code(), &CliErrorCode::OverrideRejected);
    }
}
