//! Structured logging for cv-core.
//!
//! Provides dual-mode logging:
//! - Human-readable console output for interactive use
//! - JSON lines for pipelines that ingest stderr
//!
//! stdout is reserved for command payloads; all log output goes to stderr.

pub mod config;

pub use config::{LogConfig, LogFormat, LogLevel};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global subscriber.
///
/// `config.directives` (from `RUST_LOG`) are used verbatim when present and
/// parseable; otherwise the filter is built from `config.level` for the
/// workspace crates.
pub fn init_logging(config: &LogConfig) -> Result<(), TryInitError> {
    let filter = build_filter(config);

    match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi);

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
            }
        }
        LogFormat::Jsonl => {
            let json_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(false);
            tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .try_init()
        }
    }
}

fn build_filter(config: &LogConfig) -> EnvFilter {
    config
        .directives
        .as_deref()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(config.filter_directive()))
}

/// Generate a unique run ID for this invocation.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    // First 12 hex chars are enough to correlate one run's log lines
    format!("run-{}", &uuid.simple().to_string()[..12])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_run_id_shape() {
        let id = generate_run_id();
        assert!(id.starts_with("run-"));
        assert_eq!(id.len(), 16);
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_filter_follows_explicit_level() {
        let config = LogConfig {
            directives: Some("error".to_string()),
            ..LogConfig::default()
        }
        .with_level(LogLevel::Debug);
        assert_eq!(build_filter(&config).max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_filter_keeps_rust_log_directives() {
        let config = LogConfig {
            directives: Some("cv_config=trace".to_string()),
            ..LogConfig::default()
        };
        assert_eq!(build_filter(&config).max_level_hint(), Some(LevelFilter::TRACE));
    }

    #[test]
    fn test_run_ids_differ() {
        assert_ne!(generate_run_id(), generate_run_id());
    }
}
