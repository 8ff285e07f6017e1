//! Per-column value rules.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{trace, warn};

use crate::error::{ConfigError, Result};
use crate::pattern::{first_match, normalize_column, MatchKind, Pattern};

/// How a column's rules treated one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome<'a> {
    /// The column declares no patterns.
    Unrestricted,
    /// The first pattern the value satisfied.
    Matched {
        pattern: &'a Pattern,
        kind: MatchKind,
    },
    Rejected,
}

impl RuleOutcome<'_> {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, RuleOutcome::Rejected)
    }
}

/// Column name → acceptable value patterns, in declaration order.
///
/// Column lookups are case-insensitive. If two declared names normalize to the
/// same key, the first declaration answers lookups.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: IndexMap<String, Vec<Pattern>>,
    index: HashMap<String, usize>,
}

impl RuleSet {
    /// Build from a `columns` document. `None` pattern lists become empty.
    pub fn from_document(columns: &IndexMap<String, Option<Vec<String>>>) -> Result<Self> {
        let mut rules = IndexMap::with_capacity(columns.len());
        let mut index = HashMap::with_capacity(columns.len());

        for (name, patterns) in columns {
            let compiled = match patterns {
                Some(raw) => Pattern::compile_all(raw)?,
                None => Vec::new(),
            };
            let (position, _) = rules.insert_full(name.clone(), compiled);

            let key = normalize_column(name);
            if index.contains_key(&key) {
                warn!(column = %name, "column name collides with an earlier declaration");
            } else {
                index.insert(key, position);
            }
        }

        Ok(RuleSet { rules, index })
    }

    /// Declared column names, in declaration order.
    pub fn column_names(&self) -> Vec<&str> {
        self.rules.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Case-insensitive membership test.
    pub fn exists_column(&self, name: &str) -> bool {
        self.index.contains_key(&normalize_column(name))
    }

    /// The declared spelling of a column, if it exists.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let position = *self.index.get(&normalize_column(name))?;
        self.rules
            .get_index(position)
            .map(|(declared, _)| declared.as_str())
    }

    /// Patterns for a declared column.
    pub fn patterns_for(&self, column: &str) -> Result<&[Pattern]> {
        self.index
            .get(&normalize_column(column))
            .and_then(|&position| self.rules.get_index(position))
            .map(|(_, patterns)| patterns.as_slice())
            .ok_or_else(|| ConfigError::UnknownColumn(column.to_string()))
    }

    /// True if `column` has at least one pattern.
    pub fn has_rules_for(&self, column: &str) -> Result<bool> {
        Ok(!self.patterns_for(column)?.is_empty())
    }

    /// Run `value` through the column's patterns, first match wins.
    ///
    /// `None` for an undeclared column.
    pub fn check(&self, column: &str, value: &str) -> Option<RuleOutcome<'_>> {
        let patterns = self.patterns_for(column).ok()?;
        if patterns.is_empty() {
            return Some(RuleOutcome::Unrestricted);
        }

        let outcome = match first_match(Some(value), patterns) {
            Some((position, kind)) => RuleOutcome::Matched {
                pattern: &patterns[position],
                kind,
            },
            None => {
                trace!(column, value, "value rejected by column rules");
                RuleOutcome::Rejected
            }
        };
        Some(outcome)
    }

    /// Accept when the column has no patterns, or when `value` matches any.
    ///
    /// Fails with [`ConfigError::UnknownColumn`] for an undeclared column;
    /// callers check [`RuleSet::exists_column`] first.
    pub fn validate_rules_for(&self, column: &str, value: &str) -> Result<bool> {
        self.check(column, value)
            .map(|outcome| outcome.is_accepted())
            .ok_or_else(|| ConfigError::UnknownColumn(column.to_string()))
    }

    /// Declared column name pairs that collapse to the same normalized key.
    pub fn collisions(&self) -> Vec<(&str, &str)> {
        self.rules
            .keys()
            .enumerate()
            .filter_map(|(position, name)| {
                let first = *self.index.get(&normalize_column(name))?;
                (first != position)
                    .then(|| self.rules.get_index(first))
                    .flatten()
                    .map(|(winner, _)| (name.as_str(), winner.as_str()))
            })
            .collect()
    }

    /// Back to the `columns` document shape.
    pub fn to_document(&self) -> IndexMap<String, Vec<String>> {
        self.rules
            .iter()
            .map(|(name, patterns)| {
                (
                    name.clone(),
                    patterns.iter().map(|p| p.as_str().to_string()).collect(),
                )
            })
            .collect()
    }
}
