//! Campaign validation common types and errors.
//!
//! This crate provides foundational types shared by the CLI and any other
//! front end of the validation engine:
//! - The unified error type with stable codes
//! - Output formats for CLI payloads

pub mod error;
pub mod output;

pub use error::{format_error_human, Error, ErrorCategory, Result, StructuredError};
pub use output::OutputFormat;
