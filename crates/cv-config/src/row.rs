//! CSV rows as normalized column→value mappings, and per-row validation.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::pattern::{normalize_column, MatchKind};
use crate::rules::RuleOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Cell {
    header: String,
    value: String,
}

/// One tokenized CSV row.
///
/// Keys are stored in [`normalize_column`] form, so lookups agree with
/// [`Config::exists_column`] regardless of how the header was cased. The
/// original header spelling is kept for reporting. Insertion order is kept;
/// a repeated header replaces the earlier value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: IndexMap<String, Cell>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell, replacing any cell whose header normalizes the same way.
    pub fn insert(&mut self, header: impl Into<String>, value: impl Into<String>) {
        let header = header.into();
        let key = normalize_column(&header);
        self.cells.insert(
            key,
            Cell {
                header,
                value: value.into(),
            },
        );
    }

    /// Build a row from a JSON object.
    ///
    /// Strings are taken as-is, numbers and booleans are rendered as text and
    /// `null` becomes an empty cell. Nested arrays or objects are rejected.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| ConfigError::InvalidRow("expected a JSON object".to_string()))?;

        let mut row = Row::new();
        for (header, cell) in object {
            let text = match cell {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(ConfigError::InvalidRow(format!(
                        "column {:?} holds a nested value",
                        header
                    )))
                }
            };
            row.insert(header.clone(), text);
        }
        Ok(row)
    }

    /// Value of a column, looked up by normalized name.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .get(&normalize_column(column))
            .map(|cell| cell.value.as_str())
    }

    /// `(header, value)` pairs in insertion order, with original header spelling.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells
            .values()
            .map(|cell| (cell.header.as_str(), cell.value.as_str()))
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cells.values().map(|cell| cell.header.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (header, value) in iter {
            row.insert(header, value);
        }
        row
    }
}

/// Which check rejected a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// The value matched none of the column's patterns.
    Rule,
    /// An applicable dependency rule rejected the value.
    Dependency,
}

/// A rejected cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub column: String,
    pub value: String,
    pub kind: ViolationKind,
    /// Reference column of the failing dependency rule, for `Dependency` only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// A cell accepted by one of its column's patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellMatch {
    pub column: String,
    pub pattern: String,
    pub kind: MatchKind,
}

/// Outcome of validating one row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowReport {
    /// Headers not declared in the config; these cells were not checked.
    pub unrecognized: Vec<String>,
    pub violations: Vec<Violation>,
    /// Cells of restricted columns that passed, with the pattern that let them.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<CellMatch>,
}

impl RowReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Runs the per-cell checks of a [`Config`] over whole rows.
///
/// Can only be built from a complete config, so rows are never processed
/// against an invalid one.
#[derive(Debug, Clone, Copy)]
pub struct RowValidator<'a> {
    config: &'a Config,
}

impl<'a> RowValidator<'a> {
    pub fn new(config: &'a Config) -> Result<Self> {
        let missing = config.missing_fields();
        if !missing.is_empty() {
            return Err(ConfigError::Incomplete(missing));
        }
        Ok(RowValidator { config })
    }

    pub fn config(&self) -> &'a Config {
        self.config
    }

    /// Headers the config does not declare, in the order given.
    pub fn unrecognized_headers<'h, I>(&self, headers: I) -> Vec<&'h str>
    where
        I: IntoIterator<Item = &'h str>,
    {
        headers
            .into_iter()
            .filter(|h| !self.config.exists_column(h))
            .collect()
    }

    /// Check every cell: recognized column first, then rules, then dependencies.
    pub fn validate(&self, row: &Row) -> RowReport {
        let mut report = RowReport::default();

        for (header, value) in row.iter() {
            let Some(outcome) = self.config.validation_rules().check(header, value) else {
                trace!(column = header, "skipping unrecognized column");
                report.unrecognized.push(header.to_string());
                continue;
            };

            match outcome {
                RuleOutcome::Unrestricted => {}
                RuleOutcome::Matched { pattern, kind } => report.matches.push(CellMatch {
                    column: header.to_string(),
                    pattern: pattern.as_str().to_string(),
                    kind,
                }),
                RuleOutcome::Rejected => report.violations.push(Violation {
                    column: header.to_string(),
                    value: value.to_string(),
                    kind: ViolationKind::Rule,
                    reference: None,
                }),
            }

            let failing = self
                .config
                .dependencies()
                .first_failing(row, header, value);
            if let Some(rule) = failing {
                report.violations.push(Violation {
                    column: header.to_string(),
                    value: value.to_string(),
                    kind: ViolationKind::Dependency,
                    reference: Some(rule.column_reference().to_string()),
                });
            }
        }

        if !report.is_valid() {
            debug!(
                violations = report.violations.len(),
                unrecognized = report.unrecognized.len(),
                "row rejected"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> Config {
        Config::from_value(json!({
            "separator": "_",
            "spaceSeparator": "-",
            "insertTime": "2024-01-01T00:00:00Z",
            "version": 1,
            "analyticsTools": { "ga": { "utm_source": ["source"] } },
            "columns": {
                "Url": [],
                "Country": ["US", "CA", "FR"],
                "State": []
            },
            "dependenciesConfig": [
                {
                    "columnReference": "Country",
                    "valuesReference": ["US"],
                    "hasMatch": true,
                    "columnDestiny": "State",
                    "matches": ["CA", "NY"]
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_row_lookup_is_normalized() {
        let row: Row = [("  Media  Type", "display")].into_iter().collect();
        assert_eq!(row.get("media type"), Some("display"));
        assert_eq!(row.get("MEDIA TYPE"), Some("display"));
        assert_eq!(row.headers().collect::<Vec<_>>(), vec!["  Media  Type"]);
    }

    #[test]
    fn test_row_insert_replaces_same_normalized_header() {
        let mut row = Row::new();
        row.insert("Country", "US");
        row.insert("country", "CA");
        assert_eq!(row.len(), 1);
        assert_eq!(row.get("Country"), Some("CA"));
    }

    #[test]
    fn test_row_from_json() {
        let row = Row::from_json(&json!({"A": "x", "B": 3, "C": null, "D": true})).unwrap();
        assert_eq!(row.get("a"), Some("x"));
        assert_eq!(row.get("b"), Some("3"));
        assert_eq!(row.get("c"), Some(""));
        assert_eq!(row.get("d"), Some("true"));

        assert!(Row::from_json(&json!(["x"])).is_err());
        assert!(Row::from_json(&json!({"A": {"nested": 1}})).is_err());
    }

    #[test]
    fn test_validator_refuses_incomplete_config() {
        let incomplete = Config::from_value(json!({
            "analyticsTools": {},
            "columns": {}
        }))
        .unwrap();
        let err = RowValidator::new(&incomplete).unwrap_err();
        assert!(matches!(err, ConfigError::Incomplete(_)));
    }

    #[test]
    fn test_valid_row() {
        let config = config();
        let validator = RowValidator::new(&config).unwrap();
        let row: Row = [("Url", "https://example.com"), ("country", "us"), ("STATE", "ny")]
            .into_iter()
            .collect();
        let report = validator.validate(&row);
        assert!(report.is_valid(), "{:?}", report);
        assert!(report.unrecognized.is_empty());
    }

    #[test]
    fn test_rule_and_dependency_violations() {
        let config = config();
        let validator = RowValidator::new(&config).unwrap();

        let row: Row = [("Country", "BR"), ("State", "SP")].into_iter().collect();
        let report = validator.validate(&row);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, ViolationKind::Rule);
        assert_eq!(report.violations[0].column, "Country");

        let row: Row = [("Country", "US"), ("State", "TX")].into_iter().collect();
        let report = validator.validate(&row);
        assert_eq!(
            report.violations,
            vec![Violation {
                column: "State".into(),
                value: "TX".into(),
                kind: ViolationKind::Dependency,
                reference: Some("Country".into()),
            }]
        );
    }

    #[test]
    fn test_matches_record_pattern_and_kind() {
        let config = config();
        let validator = RowValidator::new(&config).unwrap();
        let row: Row = [("Url", "https://example.com"), ("Country", "ca"), ("State", "ON")]
            .into_iter()
            .collect();
        let report = validator.validate(&row);
        assert_eq!(
            report.matches,
            vec![CellMatch {
                column: "Country".into(),
                pattern: "CA".into(),
                kind: MatchKind::Exact,
            }]
        );

        let row: Row = [("Country", "Russia")].into_iter().collect();
        let report = validator.validate(&row);
        assert!(report.is_valid());
        assert_eq!(report.matches[0].pattern, "US");
        assert_eq!(report.matches[0].kind, MatchKind::Contains);
    }

    #[test]
    fn test_unknown_header_is_never_a_rule_violation() {
        let config = config();
        let validator = RowValidator::new(&config).unwrap();
        let row: Row = [("Region", "nowhere")].into_iter().collect();
        let report = validator.validate(&row);
        assert!(report.violations.is_empty());
        assert!(report.matches.is_empty());
        assert_eq!(report.unrecognized, vec!["Region".to_string()]);
    }

    #[test]
    fn test_unrecognized_columns_are_skipped() {
        let config = config();
        let validator = RowValidator::new(&config).unwrap();
        let row: Row = [("Campaign", "x"), ("Country", "FR")].into_iter().collect();
        let report = validator.validate(&row);
        assert!(report.is_valid());
        assert_eq!(report.unrecognized, vec!["Campaign".to_string()]);

        assert_eq!(
            validator.unrecognized_headers(["url", "Campaign", "STATE"]),
            vec!["Campaign"]
        );
    }
}
