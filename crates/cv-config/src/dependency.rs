//! Cross-column dependency rules.
//!
//! A rule engages only when the row's value in its reference column matches
//! one of its reference patterns. Every engaged rule on a destination column
//! must pass for the destination value to be accepted.

use std::collections::HashMap;

use tracing::trace;

use crate::document::DependencyRuleDocument;
use crate::error::Result;
use crate::pattern::{matches_any, normalize_column, Pattern};
use crate::row::Row;

/// A compiled dependency rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRule {
    column_reference: String,
    values_reference: Vec<Pattern>,
    column_destiny: String,
    has_match: bool,
    matches: Vec<Pattern>,
}

impl DependencyRule {
    pub fn from_document(doc: &DependencyRuleDocument) -> Result<Self> {
        Ok(DependencyRule {
            column_reference: doc.column_reference.clone(),
            values_reference: Pattern::compile_all(&doc.values_reference)?,
            column_destiny: doc.column_destiny.clone(),
            has_match: doc.has_match,
            matches: Pattern::compile_all(&doc.matches)?,
        })
    }

    pub fn column_reference(&self) -> &str {
        &self.column_reference
    }

    pub fn values_reference(&self) -> &[Pattern] {
        &self.values_reference
    }

    pub fn column_destiny(&self) -> &str {
        &self.column_destiny
    }

    pub fn has_match(&self) -> bool {
        self.has_match
    }

    pub fn matches(&self) -> &[Pattern] {
        &self.matches
    }

    /// Whether the row satisfies this rule's reference condition.
    pub fn applies_to(&self, row: &Row) -> bool {
        matches_any(row.get(&self.column_reference), &self.values_reference)
    }

    /// Whether `value` passes this rule, assuming it applies.
    pub fn accepts(&self, value: &str) -> bool {
        let matched = matches_any(Some(value), &self.matches);
        if self.has_match {
            matched
        } else {
            !matched
        }
    }

    pub fn to_document(&self) -> DependencyRuleDocument {
        DependencyRuleDocument {
            column_reference: self.column_reference.clone(),
            values_reference: raw(&self.values_reference),
            has_match: self.has_match,
            column_destiny: self.column_destiny.clone(),
            matches: raw(&self.matches),
        }
    }
}

fn raw(patterns: &[Pattern]) -> Vec<String> {
    patterns.iter().map(|p| p.as_str().to_string()).collect()
}

/// Dependency rules indexed by normalized destination column.
#[derive(Debug, Clone, Default)]
pub struct DependencyIndex {
    rules: Vec<DependencyRule>,
    by_destination: HashMap<String, Vec<usize>>,
}

impl DependencyIndex {
    /// Build from the optional `dependenciesConfig` list. `None` is empty.
    pub fn from_document(docs: Option<&[DependencyRuleDocument]>) -> Result<Self> {
        let rules = docs
            .unwrap_or_default()
            .iter()
            .map(DependencyRule::from_document)
            .collect::<Result<Vec<_>>>()?;

        let mut by_destination: HashMap<String, Vec<usize>> = HashMap::new();
        for (position, rule) in rules.iter().enumerate() {
            by_destination
                .entry(normalize_column(&rule.column_destiny))
                .or_default()
                .push(position);
        }

        Ok(DependencyIndex {
            rules,
            by_destination,
        })
    }

    /// All rules, in declaration order.
    pub fn rules(&self) -> &[DependencyRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules targeting `destination`, in declaration order. Never fails.
    pub fn dependencies_for(&self, destination: &str) -> Vec<&DependencyRule> {
        self.by_destination
            .get(&normalize_column(destination))
            .map(|positions| positions.iter().map(|&i| &self.rules[i]).collect())
            .unwrap_or_default()
    }

    /// First applicable rule on `destination` that rejects `value`.
    pub fn first_failing(
        &self,
        row: &Row,
        destination: &str,
        value: &str,
    ) -> Option<&DependencyRule> {
        self.dependencies_for(destination)
            .into_iter()
            .filter(|rule| rule.applies_to(row))
            .find(|rule| !rule.accepts(value))
    }

    /// Accept iff every applicable rule on `destination` accepts `value`.
    ///
    /// No rules, or no applicable rules, means accepted.
    pub fn validate(&self, row: &Row, destination: &str, value: &str) -> bool {
        match self.first_failing(row, destination, value) {
            Some(rule) => {
                trace!(
                    destination,
                    value,
                    reference = %rule.column_reference,
                    "value rejected by dependency rule"
                );
                false
            }
            None => true,
        }
    }

    pub fn to_document(&self) -> Vec<DependencyRuleDocument> {
        self.rules.iter().map(DependencyRule::to_document).collect()
    }
}
