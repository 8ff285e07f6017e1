//! Campaign validation contract.
//!
//! This crate provides:
//! - Typed documents for a tenant's column and dependency rules
//! - The [`Config`] facade with per-column and cross-column validation
//! - Row validation on top of those primitives
//! - Semantic validation, config discovery, and snapshots

pub mod config;
pub mod dependency;
pub mod document;
pub mod error;
pub mod pattern;
pub mod resolve;
pub mod row;
pub mod rules;
pub mod snapshot;
pub mod validate;

pub use config::{AnalyticsTool, AnalyticsTools, Config};
pub use dependency::{DependencyIndex, DependencyRule};
pub use document::{AnalyticsToolsDocument, ConfigDocument, DependencyRuleDocument};
pub use error::{ConfigError, Result};
pub use pattern::{normalize_column, MatchKind, Pattern};
pub use resolve::{resolve_config_path, ConfigSource, ResolvedPath};
pub use row::{CellMatch, Row, RowReport, RowValidator, Violation, ViolationKind};
pub use rules::{RuleOutcome, RuleSet};
pub use snapshot::ConfigSnapshot;
pub use validate::{ValidationError, ValidationReport};
