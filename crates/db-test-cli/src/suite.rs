// crates/db-test-cli/src/suite.rs
// ============================================================================
// Module: Suite Runner
// Description: End-to-end flow from configuration to run summary.
// Purpose: Load, validate, set up, run, and tear down one test suite.
// Dependencies: db-test-authoring, db-test-config, db-test-core, db-test-store-sqlite
// ============================================================================

//! ## Overview
//! [`run_suite`] drives one invocation: sources are loaded from
//! `<test_dir>/tests`, registered and validated, databases are created, the
//! runnable cases execute, and the databases are torn down. Broken records
//! and warnings are reported before anything runs. Load-time registry
//! failures map to exit code 2; every other fatal error maps to 1.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use db_test_authoring::AuthoringError;
use db_test_authoring::load_test_sources;
use db_test_config::DbTestConfig;
use db_test_core::BrokenTest;
use db_test_core::Params;
use db_test_core::Registration;
use db_test_core::RegistryError;
use db_test_core::RunEvent;
use db_test_core::RunOptions;
use db_test_core::RunOrchestrator;
use db_test_core::RunReporter;
use db_test_core::RunSummary;
use db_test_core::Severity;
use db_test_core::TestRegistry;
use db_test_core::ValidationIssue;
use db_test_store_sqlite::DatabaseSpec;
use db_test_store_sqlite::SqliteGateway;
use db_test_store_sqlite::SqliteGatewayConfig;
use db_test_store_sqlite::SqliteGatewayError;
use thiserror::Error;

// ============================================================================
// SECTION: Exit Codes
// ============================================================================

/// Exit code when every test passed.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit code for failed tests and fatal runtime errors.
pub const EXIT_FAILURE: u8 = 1;
/// Exit code for load-time registry failures.
pub const EXIT_NO_RUNNABLE_TESTS: u8 = 2;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Fatal suite errors.
#[derive(Debug, Error)]
pub enum SuiteError {
    /// Required input is missing or inconsistent.
    #[error("{0}")]
    Invalid(String),
    /// A directory named on the command line or in config is not accessible.
    #[error("can not access {label} '{}'", .path.display())]
    MissingDirectory {
        /// What the directory is for.
        label: String,
        /// Directory path.
        path: PathBuf,
    },
    /// Test sources could not be loaded.
    #[error(transparent)]
    Authoring(#[from] AuthoringError),
    /// Registration failed before any test could run.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// Database setup failed.
    #[error(transparent)]
    Gateway(#[from] SqliteGatewayError),
}

impl SuiteError {
    /// Returns the process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Registry(_) => EXIT_NO_RUNNABLE_TESTS,
            Self::Invalid(_)
            | Self::MissingDirectory {
                ..
            }
            | Self::Authoring(_)
            | Self::Gateway(_) => EXIT_FAILURE,
        }
    }
}

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Fully resolved inputs for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    /// Directory holding `tests/` and `data/`.
    pub test_dir: PathBuf,
    /// Databases to create.
    pub databases: Vec<DatabaseSpec>,
    /// `SQLite` gateway settings.
    pub sqlite: SqliteGatewayConfig,
    /// Parameters available to every test.
    pub params: Params,
    /// Verbosity and breakpoint.
    pub options: RunOptions,
    /// Keep databases after the run.
    pub keep_databases: bool,
}

impl RunSettings {
    /// Resolves settings from a loaded and overridden configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SuiteError::Invalid`] when no test directory or no database
    /// is configured.
    pub fn from_config(config: DbTestConfig) -> Result<Self, SuiteError> {
        let databases = config.database_specs();
        let Some(test_dir) = config.test_dir else {
            return Err(SuiteError::Invalid(
                "a test directory is required (-t or test_dir)".to_string(),
            ));
        };
        if databases.is_empty() {
            return Err(SuiteError::Invalid(
                "at least one database is required (-d name:dir or [[databases]])".to_string(),
            ));
        }
        Ok(Self {
            test_dir,
            databases,
            sqlite: config.sqlite,
            params: config.params,
            options: RunOptions {
                verbose: config.run.verbose,
                break_before: config.run.break_before,
            },
            keep_databases: config.run.keep_databases,
        })
    }
}

// ============================================================================
// SECTION: Flow
// ============================================================================

/// Runs one suite and returns its summary.
///
/// # Errors
///
/// Returns [`SuiteError`] when inputs are missing, sources fail to load,
/// registration fails, or databases cannot be created.
pub fn run_suite(
    settings: &RunSettings,
    reporter: &dyn RunReporter,
) -> Result<RunSummary, SuiteError> {
    ensure_directory("test_dir", &settings.test_dir)?;
    for spec in &settings.databases {
        ensure_directory(&format!("db_dir for {}", spec.name), &spec.dir)?;
    }

    let loaded = load_test_sources(&settings.test_dir)?;
    for skipped in &loaded.skipped {
        reporter.record(&RunEvent::lifecycle(
            Severity::Warning,
            format!("skipping unsupported file {}", skipped.display()),
        ));
    }
    reporter.record(&RunEvent::lifecycle(
        Severity::Info,
        format!("loaded {} tests from {} files", loaded.records.len(), loaded.files.len()),
    ));

    let registration = match TestRegistry::new(loaded.records)
        .map(|registry| registry.with_global_params(settings.params.keys()))
        .and_then(|registry| registry.validate())
    {
        Ok(registration) => registration,
        Err(err) => {
            if let RegistryError::AllTestsBroken {
                broken,
            } = &err
            {
                report_broken(reporter, broken);
            }
            return Err(err.into());
        }
    };
    report_registration(reporter, &registration);
    if let Some(breakpoint) = &settings.options.break_before
        && !registration.valid.iter().any(|case| &case.id == breakpoint)
    {
        reporter.record(&RunEvent::lifecycle(
            Severity::Warning,
            format!("breakpoint {breakpoint} does not match any runnable test"),
        ));
    }

    let mut gateway = SqliteGateway::setup(
        settings.sqlite.clone(),
        &settings.databases,
        &settings.test_dir,
        reporter,
    )?;
    let summary = RunOrchestrator::new(&gateway, reporter, settings.options.clone())
        .with_global_params(settings.params.clone())
        .run(&registration.valid);
    if let Err(err) = gateway.teardown(settings.keep_databases, reporter) {
        reporter.record(&RunEvent::lifecycle(
            Severity::Failure,
            format!("teardown failed: {err}"),
        ));
    }
    Ok(summary)
}

/// Returns the exit code for a completed run.
#[must_use]
pub const fn summary_exit_code(summary: &RunSummary) -> u8 {
    if summary.is_success() { EXIT_SUCCESS } else { EXIT_FAILURE }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Fails when `path` is not an existing directory.
fn ensure_directory(label: &str, path: &Path) -> Result<(), SuiteError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(SuiteError::MissingDirectory {
            label: label.to_string(),
            path: path.to_path_buf(),
        })
    }
}

/// Reports broken records and warnings before the run.
fn report_registration(reporter: &dyn RunReporter, registration: &Registration) {
    report_broken(reporter, &registration.broken);
    for warnings in &registration.warnings {
        for issue in &warnings.issues {
            reporter.record(&RunEvent::validation(
                warnings.id.clone(),
                Severity::Warning,
                format!("{}: {issue}", warnings.id),
                None,
            ));
        }
    }
    if !registration.broken.is_empty() {
        reporter.record(&RunEvent::lifecycle(
            Severity::Warning,
            format!(
                "{} broken tests will not run; {} tests are runnable",
                registration.broken.len(),
                registration.valid.len()
            ),
        ));
    }
}

/// Reports each issue of each broken record.
fn report_broken(reporter: &dyn RunReporter, broken: &[BrokenTest]) {
    for test in broken {
        for issue in &test.issues {
            reporter.record(&RunEvent::validation(
                test.id.clone(),
                issue_severity(issue),
                format!("{} ({}): {issue}", test.id, test.source),
                None,
            ));
        }
    }
}

/// Maps an issue to the severity used in reports.
const fn issue_severity(issue: &ValidationIssue) -> Severity {
    if issue.is_error() { Severity::Failure } else { Severity::Warning }
}
