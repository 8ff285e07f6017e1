//! Raw config document types.
//!
//! These mirror the JSON exchanged with the persistence layer field for field.
//! They carry no behavior; [`crate::Config`] is built from them.

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Per-tool analytics settings: parameter name to accepted values.
pub type ToolSettings = IndexMap<String, Vec<String>>;

/// Top-level tenant config document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    /// Separator between composed values inside one cell.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,

    /// Replacement token for spaces inside values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_separator: Option<String>,

    /// CSV delimiters; the first one is used for header templates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_separator: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Number>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analytics_tools: Option<AnalyticsToolsDocument>,

    /// Column name to acceptable value patterns, in declaration order.
    /// A `null` list behaves like an empty one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<IndexMap<String, Option<Vec<String>>>>,

    /// Opaque media taxonomy, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_taxonomy: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies_config: Option<Vec<DependencyRuleDocument>>,
}

/// Analytics tool settings. Either tool may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalyticsToolsDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ga: Option<ToolSettings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adobe: Option<ToolSettings>,
}

/// One cross-column dependency rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DependencyRuleDocument {
    /// Column whose value gates the rule.
    pub column_reference: String,

    /// Patterns the reference value must match for the rule to apply.
    #[serde(default)]
    pub values_reference: Vec<String>,

    /// `true`: destination must match `matches`; `false`: must match none.
    #[serde(default)]
    pub has_match: bool,

    /// Column constrained by the rule.
    pub column_destiny: String,

    #[serde(default)]
    pub matches: Vec<String>,
}
