// crates/db-test-cli/src/main.rs
// ============================================================================
// Module: db-test CLI Entry Point
// Description: Argument parsing and exit codes for the db-test runner.
// Purpose: Run a declarative database test suite from the command line.
// Dependencies: clap, db-test-cli, db-test-config, db-test-core, thiserror
// ============================================================================

//! ## Overview
//! `db-test` loads `db-test.toml` (when present), applies command-line
//! overrides, and runs the suite. Exit codes: `0` when every test passed,
//! `2` when no test could be registered, `1` for failed tests and every
//! other fatal error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::IsTerminal;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Parser;
use clap::ValueEnum;
use db_test_cli::RunSettings;
use db_test_cli::TerminalReporter;
use db_test_cli::run_suite;
use db_test_cli::summary_exit_code;
use db_test_config::DatabaseEntry;
use db_test_config::DbTestConfig;
use db_test_config::ReportFormat;
use db_test_core::JsonLinesReporter;
use db_test_core::RunReporter;
use db_test_core::TestId;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "db-test", version, about = "Run declarative database tests")]
struct Cli {
    /// Attach error text, statements, and diffs to failures.
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
    /// Database to create, as `db_name:db_dir` (repeatable).
    #[arg(short = 'd', value_name = "DB_NAME:DB_DIR", action = ArgAction::Append)]
    databases: Vec<DatabaseEntry>,
    /// Directory with test definitions (`tests/`) and fixtures (`data/`).
    #[arg(short = 't', value_name = "TEST_DIR")]
    test_dir: Option<PathBuf>,
    /// Path to `db-test.toml` (overrides `DB_TEST_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Do not drop the databases on exit.
    #[arg(short, long, action = ArgAction::SetTrue)]
    save: bool,
    /// Stop before running this test.
    #[arg(short, long = "break-before", value_name = "TEST_ID")]
    break_before: Option<String>,
    /// Directory that receives the per-run database files.
    #[arg(long, value_name = "DIR")]
    work_dir: Option<PathBuf>,
    /// Output format for run events.
    #[arg(long, value_enum, value_name = "FORMAT")]
    format: Option<FormatArg>,
}

/// Output format selection.
#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    /// Colored terminal lines.
    Text,
    /// One JSON object per line.
    Json,
}

impl From<FormatArg> for ReportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Loads configuration, runs the suite, and maps the outcome to an exit code.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config = resolve_config(cli)?;
    let format = config.run.report_format;
    let settings = RunSettings::from_config(config)
        .map_err(|err| CliError::new(format!("db-test: {err}")))?;

    let reporter: Box<dyn RunReporter> = match format {
        ReportFormat::Text => {
            let color = std::io::stdout().is_terminal();
            Box::new(TerminalReporter::new(std::io::stdout(), color))
        }
        ReportFormat::Json => Box::new(JsonLinesReporter::new(std::io::stdout())),
    };

    match run_suite(&settings, reporter.as_ref()) {
        Ok(summary) => Ok(ExitCode::from(summary_exit_code(&summary))),
        Err(err) => {
            let _ = write_stderr_line(&format!("db-test: {err}"));
            Ok(ExitCode::from(err.exit_code()))
        }
    }
}

/// Loads the configuration file and applies command-line overrides.
fn resolve_config(cli: Cli) -> CliResult<DbTestConfig> {
    let mut config = DbTestConfig::load(cli.config.as_deref())
        .map_err(|err| CliError::new(format!("db-test: {err}")))?;
    if cli.verbose {
        config.run.verbose = true;
    }
    if cli.save {
        config.run.keep_databases = true;
    }
    if let Some(test_dir) = cli.test_dir {
        config.test_dir = Some(test_dir);
    }
    if let Some(break_before) = cli.break_before {
        config.run.break_before = Some(TestId::new(break_before));
    }
    if let Some(work_dir) = cli.work_dir {
        config.sqlite.work_dir = work_dir;
    }
    if let Some(format) = cli.format {
        config.run.report_format = format.into();
    }
    for entry in cli.databases {
        config.upsert_database(entry);
    }
    config.validate().map_err(|err| CliError::new(format!("db-test: {err}")))?;
    Ok(config)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
