//! Errors raised while building or querying a campaign config.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Construction and lookup failures.
///
/// Incompleteness of an otherwise well-formed document is *not* an error at
/// construction time; it is reported by [`crate::Config::validate_config`] and
/// only becomes [`ConfigError::Incomplete`] when a caller tries to process rows
/// against the config.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("column {0:?} is not declared in this config")]
    UnknownColumn(String),

    #[error("config is incomplete, missing: {}", .0.join(", "))]
    Incomplete(Vec<&'static str>),

    #[error("invalid row: {0}")]
    InvalidRow(String),
}

impl ConfigError {
    /// Stable error code for structured reporting.
    pub fn code(&self) -> u32 {
        match self {
            ConfigError::Io { .. } => 60,
            ConfigError::Parse(_) => 61,
            ConfigError::MissingField(_) => 62,
            ConfigError::InvalidPattern { .. } => 63,
            ConfigError::UnknownColumn(_) => 64,
            ConfigError::Incomplete(_) => 65,
            ConfigError::InvalidRow(_) => 66,
        }
    }

    /// True for caller contract violations rather than document problems.
    pub fn is_lookup(&self) -> bool {
        matches!(self, ConfigError::UnknownColumn(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_message_lists_fields() {
        let err = ConfigError::Incomplete(vec!["separator", "version"]);
        assert_eq!(
            err.to_string(),
            "config is incomplete, missing: separator, version"
        );
        assert_eq!(err.code(), 65);
    }

    #[test]
    fn test_unknown_column_is_lookup() {
        assert!(ConfigError::UnknownColumn("Foo".into()).is_lookup());
        assert!(!ConfigError::MissingField("columns").is_lookup());
    }
}
