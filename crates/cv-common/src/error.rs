//! Error types for campaign validation.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for automation
//! - Remediation suggestions for humans
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Incomplete Configuration
//!   Reason: config is incomplete, missing: version
//!   Fix: Fill in the missing fields and run 'cv-core check' again.
//! ```
//!
//! # Machine-Facing Output
//!
//! ```json
//! {
//!   "code": 11,
//!   "category": "config",
//!   "message": "config is incomplete, missing: version",
//!   "recoverable": true,
//!   "context": { "missing": ["version"] }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for campaign validation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Config document errors (missing, malformed, incomplete).
    Config,
    /// Row input errors.
    Rows,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Rows => write!(f, "rows"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("config is incomplete, missing: {}", .missing.join(", "))]
    ConfigIncomplete { missing: Vec<String> },

    #[error("no config document found")]
    ConfigNotFound,

    #[error("column {column:?} is not declared in this config")]
    UnknownColumn { column: String },

    // Row errors (20-29)
    #[error("invalid row at line {line}: {message}")]
    InvalidRow { line: usize, message: String },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Row errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::ConfigIncomplete { .. } => 11,
            Error::ConfigNotFound => 12,
            Error::UnknownColumn { .. } => 13,
            Error::InvalidRow { .. } => 20,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_)
            | Error::ConfigIncomplete { .. }
            | Error::ConfigNotFound
            | Error::UnknownColumn { .. } => ErrorCategory::Config,

            Error::InvalidRow { .. } => ErrorCategory::Rows,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable.
    ///
    /// None of these represent a process fault; the distinction is whether
    /// fixing input alone resolves them.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) => true,
            Error::ConfigIncomplete { .. } => true,
            Error::ConfigNotFound => true,
            // Caller bug: the column must be checked before lookup
            Error::UnknownColumn { .. } => false,
            Error::InvalidRow { .. } => true,
            Error::Io(_) => true,
            Error::Json(_) => true,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => {
                "Check the config document syntax and that every pattern is a string."
            }
            Error::ConfigIncomplete { .. } => {
                "Fill in the missing fields and run 'cv-core check' again."
            }
            Error::ConfigNotFound => {
                "Pass --config, or set CV_CONFIG / CV_CONFIG_DIR to the tenant config."
            }
            Error::UnknownColumn { .. } => {
                "Check the header against the config with exists_column before validating it."
            }
            Error::InvalidRow { .. } => {
                "Each line of the rows file must be one flat JSON object of column to value."
            }
            Error::Io(_) => "Check that the file exists and is readable.",
            Error::Json(_) => "Invalid JSON. Check syntax with 'jq . <file>'.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::ConfigIncomplete { .. } => "Incomplete Configuration",
            Error::ConfigNotFound => "Configuration Not Found",
            Error::UnknownColumn { .. } => "Unknown Column",
            Error::InvalidRow { .. } => "Invalid Row",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Additional structured context.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::ConfigIncomplete { missing } => {
                context.insert("missing".to_string(), serde_json::json!(missing));
            }
            Error::UnknownColumn { column } => {
                context.insert("column".to_string(), serde_json::json!(column));
            }
            Error::InvalidRow { line, .. } => {
                context.insert("line".to_string(), serde_json::json!(line));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}
