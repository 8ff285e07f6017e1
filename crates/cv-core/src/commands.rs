//! Subcommand implementations.
//!
//! Each command writes its payload to the given writer and returns the exit
//! code. Failures come back as [`cv_common::Error`] for `main` to render.

use chrono::Utc;
use cv_common::{Error, OutputFormat, Result};
use cv_config::validate::{validate_config, ValidationReport};
use cv_config::{
    resolve_config_path, Config, ConfigDocument, ConfigError, ConfigSnapshot, ConfigSource,
    ResolvedPath, Row, RowReport, RowValidator, ViolationKind,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::exit_codes::ExitCode;

/// Per-invocation settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub format: OutputFormat,
    pub run_id: String,
}

/// A config together with where it came from.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    pub path: PathBuf,
    pub source: ConfigSource,
}

impl LoadedConfig {
    pub fn snapshot(&self) -> Result<ConfigSnapshot> {
        let path = self.path.display().to_string();
        ConfigSnapshot::new(&self.config, &self.source, Some(&path)).map_err(map_config_error)
    }
}

/// Validation result of one input line.
#[derive(Debug, Clone, Serialize)]
pub struct RowOutcome {
    /// 1-based line number in the rows file.
    pub line: usize,
    pub valid: bool,
    #[serde(flatten)]
    pub report: RowReport,
}

/// Convert an engine error into the CLI's error type.
pub fn map_config_error(err: ConfigError) -> Error {
    match err {
        ConfigError::Io { path, source } => Error::Io(with_path(&path, source)),
        ConfigError::UnknownColumn(column) => Error::UnknownColumn { column },
        ConfigError::Incomplete(missing) => Error::ConfigIncomplete {
            missing: missing.into_iter().map(str::to_string).collect(),
        },
        ConfigError::InvalidRow(message) => Error::InvalidRow { line: 0, message },
        other @ (ConfigError::Parse(_)
        | ConfigError::MissingField(_)
        | ConfigError::InvalidPattern { .. }) => Error::Config(other.to_string()),
    }
}

fn with_path(path: &Path, source: std::io::Error) -> std::io::Error {
    std::io::Error::new(source.kind(), format!("{}: {}", path.display(), source))
}

/// Load the config named on the command line, or discover one.
///
/// An explicit path must exist; discovery falls back through the
/// environment, XDG and system locations.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let (path, source) = match explicit {
        Some(path) => (path.to_path_buf(), ConfigSource::CliArgument),
        None => match resolve_config_path(None) {
            ResolvedPath {
                path: Some(path),
                source,
            } => (path, source),
            ResolvedPath { path: None, .. } => return Err(Error::ConfigNotFound),
        },
    };

    let config = Config::from_file(&path).map_err(map_config_error)?;
    info!(
        path = %path.display(),
        source = %source,
        columns = config.validation_rules().len(),
        dependencies = config.dependencies().len(),
        "config loaded"
    );

    Ok(LoadedConfig {
        config,
        path,
        source,
    })
}

fn write_payload<T: Serialize + ?Sized>(
    out: &mut dyn Write,
    format: OutputFormat,
    payload: &T,
) -> Result<()> {
    match format {
        OutputFormat::Jsonl => writeln!(out, "{}", serde_json::to_string(payload)?)?,
        OutputFormat::Json | OutputFormat::Human => {
            writeln!(out, "{}", serde_json::to_string_pretty(payload)?)?
        }
    }
    Ok(())
}

fn envelope(ctx: &Context, status: &str) -> serde_json::Map<String, Value> {
    let mut map = serde_json::Map::new();
    map.insert("run_id".to_string(), json!(ctx.run_id));
    map.insert("generated_at".to_string(), json!(Utc::now().to_rfc3339()));
    map.insert("status".to_string(), json!(status));
    map
}

/// `cv-core check`: completeness plus the semantic report.
pub fn check(ctx: &Context, loaded: &LoadedConfig, out: &mut dyn Write) -> Result<ExitCode> {
    let report = validate_config(&loaded.config);
    let snapshot = loaded.snapshot()?;

    for issue in &report.warnings {
        warn!(code = issue.code, "{}", issue.message);
    }

    let (status, exit) = if report.is_valid() {
        ("valid", ExitCode::Clean)
    } else {
        ("invalid", ExitCode::ConfigInvalid)
    };

    match ctx.format {
        OutputFormat::Human => write_check_human(out, loaded, &report, &snapshot)?,
        OutputFormat::Json | OutputFormat::Jsonl => {
            let mut payload = envelope(ctx, status);
            payload.insert("report".to_string(), serde_json::to_value(&report)?);
            payload.insert("snapshot".to_string(), serde_json::to_value(&snapshot)?);
            write_payload(out, ctx.format, &payload)?;
        }
    }

    Ok(exit)
}

fn write_check_human(
    out: &mut dyn Write,
    loaded: &LoadedConfig,
    report: &ValidationReport,
    snapshot: &ConfigSnapshot,
) -> Result<()> {
    writeln!(out, "# Config Check")?;
    writeln!(out)?;
    if report.is_valid() {
        writeln!(out, "Status: ✓ Valid")?;
    } else {
        writeln!(out, "Status: ✗ Invalid")?;
    }
    writeln!(out, "Config: {} ({})", loaded.path.display(), loaded.source)?;
    match &snapshot.version {
        Some(version) => writeln!(out, "Version: {}", version)?,
        None => writeln!(out, "Version: -")?,
    }
    writeln!(
        out,
        "Insert time: {}",
        snapshot.insert_time.as_deref().unwrap_or("-")
    )?;
    writeln!(out, "Columns: {}", snapshot.column_count)?;
    writeln!(out, "Dependency rules: {}", snapshot.dependency_count)?;
    writeln!(
        out,
        "Analytics tools: {}",
        if snapshot.analytics_tools.is_empty() {
            "-".to_string()
        } else {
            snapshot.analytics_tools.join(", ")
        }
    )?;
    writeln!(out, "Content hash: {}", snapshot.content_hash)?;

    if !report.errors.is_empty() {
        writeln!(out)?;
        writeln!(out, "Errors:")?;
        for issue in &report.errors {
            writeln!(out, "  [{}] {}", issue.code, issue.message)?;
        }
    }
    if !report.warnings.is_empty() {
        writeln!(out)?;
        writeln!(out, "Warnings:")?;
        for issue in &report.warnings {
            writeln!(out, "  [{}] {}", issue.code, issue.message)?;
        }
    }
    Ok(())
}

/// `cv-core template`: the CSV header line.
pub fn template(ctx: &Context, loaded: &LoadedConfig, out: &mut dyn Write) -> Result<ExitCode> {
    let header = loaded.config.to_csv_template();
    match ctx.format {
        OutputFormat::Human => writeln!(out, "{}", header)?,
        OutputFormat::Json | OutputFormat::Jsonl => {
            let payload = json!({
                "template": header,
                "columns": loaded.config.column_names(),
            });
            write_payload(out, ctx.format, &payload)?;
        }
    }
    Ok(ExitCode::Clean)
}

/// `cv-core show`: the canonical persisted document.
pub fn show(ctx: &Context, loaded: &LoadedConfig, out: &mut dyn Write) -> Result<ExitCode> {
    let document = loaded.config.to_json().map_err(map_config_error)?;
    write_payload(out, ctx.format, &document)?;
    Ok(ExitCode::Clean)
}

/// `cv-core schema`: JSON Schema of the config document.
pub fn schema(ctx: &Context, out: &mut dyn Write) -> Result<ExitCode> {
    let schema = schemars::schema_for!(ConfigDocument);
    write_payload(out, ctx.format, &schema)?;
    Ok(ExitCode::Clean)
}

/// Parse a JSON Lines rows file. Blank lines are skipped.
pub fn parse_rows(content: &str) -> Result<Vec<(usize, Row)>> {
    let mut rows = Vec::new();
    for (index, text) in content.lines().enumerate() {
        let line = index + 1;
        if text.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(text).map_err(|e| Error::InvalidRow {
            line,
            message: e.to_string(),
        })?;
        let row = Row::from_json(&value).map_err(|e| match e {
            ConfigError::InvalidRow(message) => Error::InvalidRow { line, message },
            other => map_config_error(other),
        })?;
        rows.push((line, row));
    }
    Ok(rows)
}

/// `cv-core rows`: validate every row of a JSON Lines file.
pub fn rows(
    ctx: &Context,
    loaded: &LoadedConfig,
    rows_path: &Path,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    let validator = RowValidator::new(&loaded.config).map_err(map_config_error)?;
    let content =
        std::fs::read_to_string(rows_path).map_err(|e| Error::Io(with_path(rows_path, e)))?;
    let parsed = parse_rows(&content)?;
    debug!(rows = parsed.len(), path = %rows_path.display(), "rows parsed");

    let outcomes: Vec<RowOutcome> = parsed
        .iter()
        .map(|(line, row)| {
            let report = validator.validate(row);
            RowOutcome {
                line: *line,
                valid: report.is_valid(),
                report,
            }
        })
        .collect();
    let invalid = outcomes.iter().filter(|o| !o.valid).count();
    info!(total = outcomes.len(), invalid, "rows validated");

    let exit = if invalid == 0 {
        ExitCode::Clean
    } else {
        ExitCode::RowsInvalid
    };

    match ctx.format {
        OutputFormat::Json => {
            let mut payload = envelope(ctx, if invalid == 0 { "valid" } else { "invalid" });
            payload.insert("config".to_string(), json!(loaded.path.display().to_string()));
            payload.insert("rows_path".to_string(), json!(rows_path.display().to_string()));
            payload.insert("total".to_string(), json!(outcomes.len()));
            payload.insert("invalid".to_string(), json!(invalid));
            payload.insert("rows".to_string(), serde_json::to_value(&outcomes)?);
            write_payload(out, ctx.format, &payload)?;
        }
        OutputFormat::Jsonl => {
            for outcome in &outcomes {
                write_payload(out, ctx.format, outcome)?;
            }
        }
        OutputFormat::Human => write_rows_human(out, &outcomes, invalid)?,
    }

    Ok(exit)
}

fn write_rows_human(out: &mut dyn Write, outcomes: &[RowOutcome], invalid: usize) -> Result<()> {
    for outcome in outcomes {
        if outcome.valid {
            writeln!(out, "line {}: ✓", outcome.line)?;
            continue;
        }
        for violation in &outcome.report.violations {
            let why = match (violation.kind, violation.reference.as_deref()) {
                (ViolationKind::Dependency, Some(reference)) => {
                    format!("dependency on {}", reference)
                }
                (ViolationKind::Dependency, None) => "dependency".to_string(),
                (ViolationKind::Rule, _) => "rule".to_string(),
            };
            writeln!(
                out,
                "line {}: ✗ {}={:?} ({})",
                outcome.line, violation.column, violation.value, why
            )?;
        }
    }
    writeln!(out, "{} of {} rows invalid", invalid, outcomes.len())?;
    Ok(())
}

/// `cv-core stamp`: set `insertTime` to now and optionally the version.
///
/// Writes the stamped document to `output` when given, otherwise prints it.
pub fn stamp(
    ctx: &Context,
    mut loaded: LoadedConfig,
    version: Option<u64>,
    output: Option<&Path>,
    out: &mut dyn Write,
) -> Result<ExitCode> {
    loaded.config.stamp(Utc::now());
    if let Some(version) = version {
        loaded.config.set_version(version);
    }
    let document = loaded.config.to_json().map_err(map_config_error)?;

    let Some(target) = output else {
        write_payload(out, ctx.format, &document)?;
        return Ok(ExitCode::Clean);
    };

    let mut text = serde_json::to_string_pretty(&document)?;
    text.push('\n');
    std::fs::write(target, text).map_err(|e| Error::Io(with_path(target, e)))?;
    info!(path = %target.display(), "stamped config written");

    match ctx.format {
        OutputFormat::Human => writeln!(out, "Wrote {}", target.display())?,
        OutputFormat::Json | OutputFormat::Jsonl => {
            let mut payload = envelope(ctx, "written");
            payload.insert("path".to_string(), json!(target.display().to_string()));
            payload.insert("insertTime".to_string(), json!(loaded.config.insert_time()));
            payload.insert("version".to_string(), json!(loaded.config.version()));
            write_payload(out, ctx.format, &payload)?;
        }
    }
    Ok(ExitCode::Clean)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../test/fixtures/config")
            .join(name)
    }

    fn ctx(format: OutputFormat) -> Context {
        Context {
            format,
            run_id: "run-test".to_string(),
        }
    }

    fn run<F>(f: F) -> (ExitCode, String)
    where
        F: FnOnce(&mut dyn Write) -> Result<ExitCode>,
    {
        let mut buf = Vec::new();
        let exit = f(&mut buf).unwrap();
        (exit, String::from_utf8(buf).unwrap())
    }

    #[test]
    fn test_load_explicit_missing_is_io() {
        let err = load_config(Some(fixture("nope.json").as_path())).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("nope.json"));
    }

    #[test]
    fn test_map_config_error() {
        let err = map_config_error(ConfigError::Incomplete(vec!["version"]));
        assert!(matches!(err, Error::ConfigIncomplete { ref missing } if missing == &["version"]));
        let err = map_config_error(ConfigError::MissingField("columns"));
        assert!(matches!(err, Error::Config(_)));
        let err = map_config_error(ConfigError::UnknownColumn("Url".into()));
        assert!(matches!(err, Error::UnknownColumn { ref column } if column == "Url"));
    }

    #[test]
    fn test_check_valid_json() {
        let loaded = load_config(Some(fixture("valid_config.json").as_path())).unwrap();
        let (exit, out) = run(|w| check(&ctx(OutputFormat::Json), &loaded, w));
        assert_eq!(exit, ExitCode::Clean);

        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["status"], "valid");
        assert_eq!(value["run_id"], "run-test");
        assert_eq!(value["snapshot"]["column_count"], 6);
        assert_eq!(value["snapshot"]["source"], "CLI argument");
    }

    #[test]
    fn test_check_incomplete_human() {
        let loaded = load_config(Some(fixture("incomplete_config.json").as_path())).unwrap();
        let (exit, out) = run(|w| check(&ctx(OutputFormat::Human), &loaded, w));
        assert_eq!(exit, ExitCode::ConfigInvalid);
        assert!(out.contains("Status: ✗ Invalid"));
        assert!(out.contains("[70] Missing required field: version"));
    }

    #[test]
    fn test_template_formats() {
        let loaded = load_config(Some(fixture("valid_config.json").as_path())).unwrap();
        let (_, out) = run(|w| template(&ctx(OutputFormat::Human), &loaded, w));
        assert_eq!(out, "Url;Campaign;Country;State;Media;Format;Vehicle\n");

        let (_, out) = run(|w| template(&ctx(OutputFormat::Jsonl), &loaded, w));
        let value: Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(value["columns"][0], "Campaign");
    }

    #[test]
    fn test_show_is_canonical_document() {
        let loaded = load_config(Some(fixture("valid_config.json").as_path())).unwrap();
        let (_, out) = run(|w| show(&ctx(OutputFormat::Json), &loaded, w));
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value, loaded.config.to_json().unwrap());
    }

    #[test]
    fn test_schema_describes_columns() {
        let (_, out) = run(|w| schema(&ctx(OutputFormat::Json), w));
        let value: Value = serde_json::from_str(&out).unwrap();
        assert!(value["properties"].get("columns").is_some());
        assert!(value["properties"].get("dependenciesConfig").is_some());
    }

    #[test]
    fn test_parse_rows_reports_line() {
        let rows = parse_rows("{\"A\": \"1\"}\n\n{\"A\": 2}\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].0, 3);
        assert_eq!(rows[1].1.get("a"), Some("2"));

        let err = parse_rows("{\"A\": \"1\"}\n[1, 2]\n").unwrap_err();
        assert!(matches!(err, Error::InvalidRow { line: 2, .. }));

        let err = parse_rows("{not json").unwrap_err();
        assert!(matches!(err, Error::InvalidRow { line: 1, .. }));
    }

    #[test]
    fn test_rows_mixed_json() {
        let loaded = load_config(Some(fixture("valid_config.json").as_path())).unwrap();
        let rows_path = fixture("rows_mixed.jsonl");
        let (exit, out) = run(|w| rows(&ctx(OutputFormat::Json), &loaded, &rows_path, w));
        assert_eq!(exit, ExitCode::RowsInvalid);

        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["total"], 3);
        assert_eq!(value["invalid"], 2);
        assert_eq!(value["rows"][2]["line"], 4);
        assert_eq!(value["rows"][2]["valid"], true);
        assert_eq!(value["rows"][0]["violations"][0]["kind"], "dependency");
    }

    #[test]
    fn test_rows_valid_human() {
        let loaded = load_config(Some(fixture("valid_config.json").as_path())).unwrap();
        let rows_path = fixture("rows_valid.jsonl");
        let (exit, out) = run(|w| rows(&ctx(OutputFormat::Human), &loaded, &rows_path, w));
        assert_eq!(exit, ExitCode::Clean);
        assert!(out.ends_with("0 of 2 rows invalid\n"));
    }

    #[test]
    fn test_rows_refuses_incomplete_config() {
        let loaded = load_config(Some(fixture("incomplete_config.json").as_path())).unwrap();
        let rows_path = fixture("rows_valid.jsonl");
        let mut buf = Vec::new();
        let err = rows(&ctx(OutputFormat::Json), &loaded, &rows_path, &mut buf).unwrap_err();
        assert!(matches!(err, Error::ConfigIncomplete { .. }));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_stamp_writes_file() {
        let loaded = load_config(Some(fixture("valid_config.json").as_path())).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("stamped.json");

        let (exit, out) =
            run(|w| stamp(&ctx(OutputFormat::Json), loaded, Some(9), Some(target.as_path()), w));
        assert_eq!(exit, ExitCode::Clean);
        let payload: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(payload["version"], 9);

        let written = Config::from_file(&target).unwrap();
        assert_eq!(written.version().and_then(|v| v.as_u64()), Some(9));
        assert_ne!(written.insert_time(), Some("2024-05-10T09:30:00.000Z"));
    }
}
