//! Value patterns and column-name normalization.
//!
//! A single matching primitive is shared by column rules and dependency rules
//! so both always agree on what "matches" means.
//!
//! # Pattern forms
//!
//! | Form                     | Matches                                              |
//! |--------------------------|------------------------------------------------------|
//! | `*`                      | every value, including the empty string              |
//! | text containing `*`      | anchored glob, `*` stands for any run of characters  |
//! | empty string             | only an empty value                                  |
//! | any other text           | equal to the value, or contained in it               |
//!
//! All comparisons are case-insensitive and ignore surrounding whitespace on
//! both the pattern and the value.
//!
//! Containment makes short literals loose: `US` also accepts `Russia`, since
//! the value contains `us`. Only globs are anchored at both ends.

use regex::{Regex, RegexBuilder};
use serde::{Serialize, Serializer};

use crate::error::{ConfigError, Result};

/// The wildcard token.
pub const WILDCARD: char = '*';

/// How a value satisfied a pattern.
///
/// When more than one interpretation applies the first in declaration order
/// wins: a literal that equals the value reports `Exact`, never `Contains`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Wildcard,
    Contains,
}

#[derive(Debug, Clone)]
enum Matcher {
    Any,
    Glob(Regex),
    Literal(String),
}

/// A compiled value pattern. Keeps its source text for serialization.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    matcher: Matcher,
}

impl Pattern {
    /// Compile a pattern from its document form.
    pub fn compile(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let matcher = if trimmed.len() == 1 && trimmed.starts_with(WILDCARD) {
            Matcher::Any
        } else if trimmed.contains(WILDCARD) {
            Matcher::Glob(compile_glob(trimmed).map_err(|source| {
                ConfigError::InvalidPattern {
                    pattern: raw.to_string(),
                    source,
                }
            })?)
        } else {
            Matcher::Literal(trimmed.to_lowercase())
        };

        Ok(Pattern {
            raw: raw.to_string(),
            matcher,
        })
    }

    /// Compile every pattern in a list, keeping order.
    pub fn compile_all<S: AsRef<str>>(raw: &[S]) -> Result<Vec<Self>> {
        raw.iter().map(|p| Pattern::compile(p.as_ref())).collect()
    }

    /// The pattern exactly as it appeared in the document.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns how `value` matched, or `None` if it did not.
    pub fn match_kind(&self, value: &str) -> Option<MatchKind> {
        let value = value.trim();
        match &self.matcher {
            Matcher::Any => Some(MatchKind::Wildcard),
            Matcher::Glob(re) => re.is_match(value).then_some(MatchKind::Wildcard),
            Matcher::Literal(lit) => {
                let value = value.to_lowercase();
                if value == *lit {
                    Some(MatchKind::Exact)
                } else if !lit.is_empty() && value.contains(lit.as_str()) {
                    Some(MatchKind::Contains)
                } else {
                    None
                }
            }
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        self.match_kind(value).is_some()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Pattern {}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

fn compile_glob(glob: &str) -> std::result::Result<Regex, regex::Error> {
    let body = glob
        .split(WILDCARD)
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    RegexBuilder::new(&format!("^{}$", body))
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
}

/// True when `value` is present and matches at least one pattern.
///
/// An absent value (a reference column missing from the row) never matches.
pub fn matches_any(value: Option<&str>, patterns: &[Pattern]) -> bool {
    first_match(value, patterns).is_some()
}

/// Index and kind of the first pattern that `value` satisfies.
pub fn first_match(value: Option<&str>, patterns: &[Pattern]) -> Option<(usize, MatchKind)> {
    let value = value?;
    patterns
        .iter()
        .enumerate()
        .find_map(|(idx, p)| p.match_kind(value).map(|kind| (idx, kind)))
}

/// Canonical form of a column name: trimmed, inner whitespace collapsed to a
/// single space, lowercased.
pub fn normalize_column(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
