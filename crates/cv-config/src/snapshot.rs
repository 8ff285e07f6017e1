//! Config snapshots for job records and audit.
//!
//! A snapshot captures which config version a job ran against, so a batch of
//! row reports can be traced back to the exact contract that produced them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::Config;
use crate::error::Result;
use crate::resolve::ConfigSource;

/// A frozen summary of one config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Where the config was loaded from.
    pub source: String,

    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub version: Option<serde_json::Number>,

    #[serde(default)]
    pub insert_time: Option<String>,

    /// SHA-256 of the canonical document string.
    pub content_hash: String,

    pub column_count: usize,
    pub dependency_count: usize,
    pub analytics_tools: Vec<String>,
    pub complete: bool,
}

impl ConfigSnapshot {
    pub fn new(config: &Config, source: &ConfigSource, path: Option<&str>) -> Result<Self> {
        let canonical = serde_json::to_string(&config.to_json()?)?;
        Ok(ConfigSnapshot {
            timestamp: Utc::now(),
            source: source.to_string(),
            path: path.map(str::to_string),
            version: config.version().cloned(),
            insert_time: config.insert_time().map(str::to_string),
            content_hash: hash_content(&canonical),
            column_count: config.validation_rules().len(),
            dependency_count: config.dependencies().len(),
            analytics_tools: config
                .analytics_tools()
                .wire_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            complete: config.validate_config(),
        })
    }

    /// Whether two snapshots describe the same document.
    pub fn same_content(&self, other: &ConfigSnapshot) -> bool {
        self.content_hash == other.content_hash
    }
}

/// SHA-256 hex digest.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
