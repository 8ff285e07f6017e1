//! Campaign Validation Core
//!
//! The entry point for cv-core, handling:
//! - Config document checks and canonical output
//! - CSV header templates
//! - Row validation against column and dependency rules

use clap::{Args, Parser, Subcommand};
use cv_common::{format_error_human, Error, OutputFormat, StructuredError};
use cv_core::commands::{self, Context};
use cv_core::exit_codes::ExitCode;
use cv_core::logging::{generate_run_id, init_logging, LogConfig, LogFormat, LogLevel};
use std::io::{IsTerminal, Write};
use std::path::PathBuf;

/// Campaign Validation - column rules and cross-column dependencies for campaign CSVs
#[derive(Parser)]
#[command(name = "cv-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

#[derive(Args)]
struct GlobalOpts {
    /// Path to the tenant config document (otherwise CV_CONFIG, CV_CONFIG_DIR, XDG, /etc)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr (human or jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a config document for completeness and consistency
    Check,

    /// Print the CSV header template (Url first, then declared columns)
    Template,

    /// Print the canonical form of a config document
    Show,

    /// Validate rows (one JSON object per line) against a config
    Rows(RowsArgs),

    /// Print the JSON Schema of the config document
    Schema,

    /// Set insertTime to now and optionally the version
    Stamp(StampArgs),
}

#[derive(Args)]
struct RowsArgs {
    /// JSON Lines file of rows, keyed by CSV header
    #[arg(long)]
    rows: PathBuf,
}

#[derive(Args)]
struct StampArgs {
    /// New version number
    #[arg(long = "set-version", value_name = "N")]
    set_version: Option<u64>,

    /// Write the stamped document here instead of stdout
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // --help and --version also arrive here and go to stdout
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            std::process::exit(code.as_i32());
        }
    };

    let cli_level = if cli.global.quiet || cli.global.verbose > 0 {
        Some(LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet))
    } else {
        None
    };
    let log_config = LogConfig::from_env(cli_level, cli.global.log_format);
    if let Err(err) = init_logging(&log_config) {
        eprintln!("warning: logging not initialized: {}", err);
    }

    let ctx = Context {
        format: cli.global.format,
        run_id: generate_run_id(),
    };
    let span = tracing::info_span!("run", run_id = %ctx.run_id);
    let _guard = span.enter();

    let exit_code = match run(cli.command, &cli.global, &ctx) {
        Ok(code) => code,
        Err(err) => {
            tracing::debug!(code = err.code(), "command failed");
            report_error(&cli.global, &err);
            ExitCode::from(&err)
        }
    };

    std::process::exit(exit_code.as_i32());
}

fn run(command: Commands, global: &GlobalOpts, ctx: &Context) -> cv_common::Result<ExitCode> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let config_path = global.config.as_deref();

    let result = match command {
        Commands::Check => {
            let loaded = commands::load_config(config_path)?;
            commands::check(ctx, &loaded, &mut out)
        }
        Commands::Template => {
            let loaded = commands::load_config(config_path)?;
            commands::template(ctx, &loaded, &mut out)
        }
        Commands::Show => {
            let loaded = commands::load_config(config_path)?;
            commands::show(ctx, &loaded, &mut out)
        }
        Commands::Rows(args) => {
            let loaded = commands::load_config(config_path)?;
            commands::rows(ctx, &loaded, &args.rows, &mut out)
        }
        Commands::Schema => commands::schema(ctx, &mut out),
        Commands::Stamp(args) => {
            let loaded = commands::load_config(config_path)?;
            commands::stamp(
                ctx,
                loaded,
                args.set_version,
                args.output.as_deref(),
                &mut out,
            )
        }
    };

    out.flush()?;
    result
}

/// Render an error on stderr in the selected format.
fn report_error(global: &GlobalOpts, err: &Error) {
    match global.format {
        OutputFormat::Human => {
            let use_color = !global.no_color && std::io::stderr().is_terminal();
            eprintln!("{}", format_error_human(err, use_color));
        }
        OutputFormat::Json | OutputFormat::Jsonl => {
            eprintln!("{}", StructuredError::from(err).to_json());
        }
    }
}
