//! The tenant config facade.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::dependency::{DependencyIndex, DependencyRule};
use crate::document::{AnalyticsToolsDocument, ConfigDocument, ToolSettings};
use crate::error::{ConfigError, Result};
use crate::row::Row;
use crate::rules::RuleSet;

/// Delimiter used for header templates when no `csvSeparator` is declared.
pub const DEFAULT_CSV_SEPARATOR: &str = ",";

/// Leading column of every CSV header template.
pub const URL_COLUMN: &str = "Url";

/// Supported analytics tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyticsTool {
    Ga,
    Adobe,
}

impl AnalyticsTool {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsTool::Ga => "ga",
            AnalyticsTool::Adobe => "adobe",
        }
    }
}

impl std::fmt::Display for AnalyticsTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Enabled analytics tools and their settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyticsTools {
    ga: Option<ToolSettings>,
    adobe: Option<ToolSettings>,
}

impl AnalyticsTools {
    fn from_document(doc: &AnalyticsToolsDocument) -> Self {
        AnalyticsTools {
            ga: doc.ga.clone(),
            adobe: doc.adobe.clone(),
        }
    }

    pub fn get(&self, tool: AnalyticsTool) -> Option<&ToolSettings> {
        match tool {
            AnalyticsTool::Ga => self.ga.as_ref(),
            AnalyticsTool::Adobe => self.adobe.as_ref(),
        }
    }

    /// Present tools, always in `ga`, `adobe` order.
    pub fn names(&self) -> Vec<AnalyticsTool> {
        [AnalyticsTool::Ga, AnalyticsTool::Adobe]
            .into_iter()
            .filter(|tool| self.get(*tool).is_some())
            .collect()
    }

    /// Present tools as their document keys.
    pub fn wire_names(&self) -> Vec<&'static str> {
        self.names().into_iter().map(|tool| tool.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.ga.is_none() && self.adobe.is_none()
    }

    fn to_document(&self) -> AnalyticsToolsDocument {
        AnalyticsToolsDocument {
            ga: self.ga.clone(),
            adobe: self.adobe.clone(),
        }
    }
}

/// A tenant's validation contract.
///
/// Built once from a [`ConfigDocument`] and immutable afterwards, except for
/// the provenance fields `insertTime` and `version`.
#[derive(Debug, Clone)]
pub struct Config {
    separator: Option<String>,
    space_separator: Option<String>,
    csv_separator: Option<Vec<String>>,
    insert_time: Option<String>,
    version: Option<Number>,
    analytics_tools: AnalyticsTools,
    media_taxonomy: Option<Value>,
    rules: RuleSet,
    dependencies: DependencyIndex,
}

impl Config {
    /// Build from a parsed document.
    ///
    /// Fails when `columns` or `analyticsTools` is absent, or when a pattern
    /// cannot be compiled. Other missing fields are tolerated here and
    /// reported by [`Config::validate_config`].
    pub fn from_document(doc: ConfigDocument) -> Result<Self> {
        let columns = doc
            .columns
            .as_ref()
            .ok_or(ConfigError::MissingField("columns"))?;
        let tools = doc
            .analytics_tools
            .as_ref()
            .ok_or(ConfigError::MissingField("analyticsTools"))?;

        let rules = RuleSet::from_document(columns)?;
        let dependencies = DependencyIndex::from_document(doc.dependencies_config.as_deref())?;
        let analytics_tools = AnalyticsTools::from_document(tools);

        debug!(
            columns = rules.len(),
            dependencies = dependencies.len(),
            tools = %analytics_tools.wire_names().join(","),
            "built campaign config"
        );

        Ok(Config {
            separator: doc.separator,
            space_separator: doc.space_separator,
            csv_separator: doc.csv_separator,
            insert_time: doc.insert_time,
            version: doc.version,
            analytics_tools,
            media_taxonomy: doc.media_taxonomy,
            rules,
            dependencies,
        })
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Self::from_document(serde_json::from_value(value)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Self::from_document(serde_json::from_str(s)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Self::from_document(serde_json::from_slice(bytes)?)
    }

    /// Load a config document from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Required fields that are absent or falsy, in a fixed order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !is_present(self.separator.as_deref()) {
            missing.push("separator");
        }
        if !is_present(self.space_separator.as_deref()) {
            missing.push("spaceSeparator");
        }
        if !is_present(self.insert_time.as_deref()) {
            missing.push("insertTime");
        }
        if !self.version.as_ref().is_some_and(is_nonzero) {
            missing.push("version");
        }
        if self.analytics_tools.is_empty() {
            missing.push("analyticsTools");
        }
        missing
    }

    /// Structural completeness check. Does not look at any row data.
    pub fn validate_config(&self) -> bool {
        self.missing_fields().is_empty()
    }

    // ------------------------------------------------------------------
    // Validation API
    // ------------------------------------------------------------------

    /// Case-insensitive test for a declared column.
    pub fn exists_column(&self, column: &str) -> bool {
        self.rules.exists_column(column)
    }

    /// Column rule check. See [`RuleSet::validate_rules_for`].
    pub fn validate_rules_for(&self, column: &str, value: &str) -> Result<bool> {
        self.rules.validate_rules_for(column, value)
    }

    /// Dependency rules whose destination is `column`, in declaration order.
    pub fn dependencies_for(&self, column: &str) -> Vec<&DependencyRule> {
        self.dependencies.dependencies_for(column)
    }

    /// Dependency check for one cell of `row`.
    ///
    /// Fails with [`ConfigError::UnknownColumn`] when `column` is not declared.
    pub fn validate_dependency_rules_for(
        &self,
        row: &Row,
        column: &str,
        value: &str,
    ) -> Result<bool> {
        if !self.rules.exists_column(column) {
            return Err(ConfigError::UnknownColumn(column.to_string()));
        }
        Ok(self.dependencies.validate(row, column, value))
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    /// Header line: `Url` followed by every declared column.
    pub fn to_csv_template(&self) -> String {
        let separator = self
            .csv_separator
            .as_ref()
            .and_then(|seps| seps.first())
            .map(String::as_str)
            .unwrap_or(DEFAULT_CSV_SEPARATOR);

        std::iter::once(URL_COLUMN)
            .chain(self.rules.column_names())
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Persistence document.
    ///
    /// `columns` is always emitted, `dependenciesConfig` only when non-empty,
    /// and every other field only when it is truthy: present and not an empty
    /// string, zero, `false`, empty list or empty object.
    pub fn to_json(&self) -> Result<Value> {
        let mut out = Map::new();

        if let Some(separator) = self.separator.as_deref().filter(|s| !s.is_empty()) {
            out.insert("separator".into(), Value::from(separator));
        }
        if let Some(space) = self
            .space_separator
            .as_deref()
            .filter(|s| !s.is_empty())
        {
            out.insert("spaceSeparator".into(), Value::from(space));
        }
        if let Some(seps) = self.csv_separator.as_ref().filter(|s| !s.is_empty()) {
            out.insert("csvSeparator".into(), Value::from(seps.clone()));
        }
        if let Some(time) = self.insert_time.as_deref().filter(|s| !s.is_empty()) {
            out.insert("insertTime".into(), Value::from(time));
        }
        if let Some(version) = self.version.as_ref().filter(|n| is_nonzero(n)) {
            out.insert("version".into(), Value::Number(version.clone()));
        }
        if !self.analytics_tools.is_empty() {
            out.insert(
                "analyticsTools".into(),
                to_value(&self.analytics_tools.to_document())?,
            );
        }
        if let Some(media) = self.media_taxonomy.as_ref().filter(|v| is_truthy(v)) {
            out.insert("mediaTaxonomy".into(), media.clone());
        }
        out.insert("columns".into(), to_value(&self.rules.to_document())?);
        if !self.dependencies.is_empty() {
            out.insert(
                "dependenciesConfig".into(),
                to_value(&self.dependencies.to_document())?,
            );
        }

        Ok(Value::Object(out))
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn separator(&self) -> Option<&str> {
        self.separator.as_deref()
    }

    pub fn space_separator(&self) -> Option<&str> {
        self.space_separator.as_deref()
    }

    pub fn csv_separator(&self) -> Option<&[String]> {
        self.csv_separator.as_deref()
    }

    pub fn insert_time(&self) -> Option<&str> {
        self.insert_time.as_deref()
    }

    pub fn set_insert_time(&mut self, insert_time: impl Into<String>) {
        self.insert_time = Some(insert_time.into());
    }

    /// Set `insertTime` to `now` in RFC 3339 with millisecond precision.
    pub fn stamp(&mut self, now: DateTime<Utc>) {
        self.set_insert_time(now.to_rfc3339_opts(SecondsFormat::Millis, true));
    }

    pub fn version(&self) -> Option<&Number> {
        self.version.as_ref()
    }

    pub fn set_version(&mut self, version: impl Into<Number>) {
        self.version = Some(version.into());
    }

    pub fn analytics_tools(&self) -> &AnalyticsTools {
        &self.analytics_tools
    }

    pub fn analytics_tool_names(&self) -> Vec<AnalyticsTool> {
        self.analytics_tools.names()
    }

    pub fn media_taxonomy(&self) -> Option<&Value> {
        self.media_taxonomy.as_ref()
    }

    pub fn validation_rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.rules.column_names()
    }

    pub fn dependencies(&self) -> &DependencyIndex {
        &self.dependencies
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let json = self.to_json().map_err(|_| std::fmt::Error)?;
        write!(f, "{}", json)
    }
}

impl TryFrom<ConfigDocument> for Config {
    type Error = ConfigError;

    fn try_from(doc: ConfigDocument) -> Result<Self> {
        Config::from_document(doc)
    }
}

fn is_present(s: Option<&str>) -> bool {
    s.is_some_and(|s| !s.is_empty())
}

fn is_nonzero(n: &Number) -> bool {
    n.as_f64().is_some_and(|v| v != 0.0)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => is_nonzero(n),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn to_value<T: Serialize>(doc: &T) -> Result<Value> {
    Ok(serde_json::to_value(doc)?)
}
