//! Semantic validation of a loaded config.
//!
//! [`Config::validate_config`] only answers whether the required fields are
//! present. This module gives the full picture: hard errors for missing
//! fields, plus warnings for dependency rules that can never engage or that
//! point at undeclared columns.

use serde::Serialize;
use thiserror::Error;

use crate::config::Config;

/// Problems found in a config.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Dependency rule {rule} references undeclared {field} column {column:?}")]
    DanglingReference {
        rule: usize,
        field: &'static str,
        column: String,
    },

    #[error("Dependency rule {rule} has no reference values and never applies")]
    NeverApplies { rule: usize },

    #[error("Column {column:?} collides with earlier column {first:?}")]
    AmbiguousColumn { column: String, first: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::MissingField(_) => 70,
            ValidationError::DanglingReference { .. } => 71,
            ValidationError::NeverApplies { .. } => 72,
            ValidationError::AmbiguousColumn { .. } => 73,
        }
    }

    /// Only missing fields make a config unusable.
    pub fn severity(&self) -> Severity {
        match self {
            ValidationError::MissingField(_) => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Serializable form of one finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub code: u32,
    pub severity: Severity,
    pub message: String,
}

impl From<&ValidationError> for Issue {
    fn from(err: &ValidationError) -> Self {
        Issue {
            code: err.code(),
            severity: err.severity(),
            message: err.to_string(),
        }
    }
}

/// All findings for one config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Every finding, in a stable order: missing fields, column collisions,
/// then dependency rules in declaration order.
pub fn collect_issues(config: &Config) -> Vec<ValidationError> {
    let mut issues: Vec<ValidationError> = config
        .missing_fields()
        .into_iter()
        .map(ValidationError::MissingField)
        .collect();

    for (column, first) in config.validation_rules().collisions() {
        issues.push(ValidationError::AmbiguousColumn {
            column: column.to_string(),
            first: first.to_string(),
        });
    }

    for (position, rule) in config.dependencies().rules().iter().enumerate() {
        if !config.exists_column(rule.column_reference()) {
            issues.push(ValidationError::DanglingReference {
                rule: position,
                field: "reference",
                column: rule.column_reference().to_string(),
            });
        }
        if !config.exists_column(rule.column_destiny()) {
            issues.push(ValidationError::DanglingReference {
                rule: position,
                field: "destination",
                column: rule.column_destiny().to_string(),
            });
        }
        if rule.values_reference().is_empty() {
            issues.push(ValidationError::NeverApplies { rule: position });
        }
    }

    issues
}

/// Build the full report.
pub fn validate_config(config: &Config) -> ValidationReport {
    let (errors, warnings): (Vec<_>, Vec<_>) = collect_issues(config)
        .iter()
        .map(Issue::from)
        .partition(|issue| issue.severity == Severity::Error);

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete(columns: serde_json::Value, deps: serde_json::Value) -> Config {
        Config::from_value(json!({
            "separator": "_",
            "spaceSeparator": "-",
            "insertTime": "2024-01-01",
            "version": 1,
            "analyticsTools": { "ga": {} },
            "columns": columns,
            "dependenciesConfig": deps
        }))
        .unwrap()
    }

    #[test]
    fn test_complete_config_has_no_issues() {
        let config = complete(json!({"A": [], "B": []}), json!([]));
        let report = validate_config(&config);
        assert!(report.is_valid());
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_missing_field_is_an_error() {
        let config = Config::from_value(json!({
            "separator": "_",
            "analyticsTools": { "ga": {} },
            "columns": {}
        }))
        .unwrap();
        assert_eq!(
            collect_issues(&config).first(),
            Some(&ValidationError::MissingField("spaceSeparator"))
        );

        let report = validate_config(&config);
        assert!(!report.is_valid());
        assert_eq!(report.errors.len(), 3);
        assert_eq!(report.errors[0].code, 70);
        assert_eq!(report.errors[0].severity, Severity::Error);
    }

    #[test]
    fn test_dependency_warnings() {
        let config = complete(
            json!({"State": []}),
            json!([
                {
                    "columnReference": "Country",
                    "valuesReference": [],
                    "hasMatch": true,
                    "columnDestiny": "State",
                    "matches": ["CA"]
                }
            ]),
        );

        let issues = collect_issues(&config);
        assert_eq!(
            issues,
            vec![
                ValidationError::DanglingReference {
                    rule: 0,
                    field: "reference",
                    column: "Country".into(),
                },
                ValidationError::NeverApplies { rule: 0 },
            ]
        );

        let report = validate_config(&config);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn test_ambiguous_column_warning() {
        let config = complete(json!({"Media": [], "MEDIA": []}), json!([]));
        let issues = collect_issues(&config);
        assert_eq!(
            issues,
            vec![ValidationError::AmbiguousColumn {
                column: "MEDIA".into(),
                first: "Media".into(),
            }]
        );
    }
}
