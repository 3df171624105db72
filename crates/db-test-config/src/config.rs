// crates/db-test-config/src/config.rs
// ============================================================================
// Module: db-test Configuration
// Description: Configuration loading and validation for db-test runs.
// Purpose: Provide strict config parsing with hard limits.
// Dependencies: db-test-core, db-test-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path comes from the caller, else `DB_TEST_CONFIG`, else
//! `./db-test.toml`. Only the implicit default may be absent; an explicitly
//! named file that cannot be read is an error. Command-line flags are applied
//! on top of the loaded values by the CLI.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use db_test_core::DbName;
use db_test_core::Params;
use db_test_core::TestId;
use db_test_store_sqlite::DatabaseSpec;
use db_test_store_sqlite::SqliteGatewayConfig;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "db-test.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "DB_TEST_CONFIG";
/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of a logical database name.
const MAX_DATABASE_NAME_LENGTH: usize = 64;

// ============================================================================
// SECTION: Run Options
// ============================================================================

/// Output format for run events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// Human-readable, colored terminal lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Run behavior options.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Attach error text, statements, and diffs to failure events.
    #[serde(default)]
    pub verbose: bool,
    /// Keep the per-run databases after the run.
    #[serde(default)]
    pub keep_databases: bool,
    /// Stop the run before executing this test.
    #[serde(default)]
    pub break_before: Option<TestId>,
    /// Output format for run events.
    #[serde(default)]
    pub report_format: ReportFormat,
}

// ============================================================================
// SECTION: Databases
// ============================================================================

/// Logical database and the directory holding its setup scripts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseEntry {
    /// Logical database name referenced by tests.
    pub name: DbName,
    /// Directory holding the database scripts.
    pub dir: PathBuf,
}

impl DatabaseEntry {
    /// Converts the entry into a gateway database spec.
    #[must_use]
    pub fn to_spec(&self) -> DatabaseSpec {
        DatabaseSpec::new(self.name.clone(), self.dir.clone())
    }
}

impl FromStr for DatabaseEntry {
    type Err = ConfigError;

    /// Parses `name:dir`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let Some((name, dir)) = value.split_once(':') else {
            return Err(ConfigError::Invalid(format!(
                "database argument '{value}' must have the form name:dir"
            )));
        };
        if dir.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "database argument '{value}' has an empty directory"
            )));
        }
        validate_database_name(name)?;
        Ok(Self {
            name: DbName::new(name),
            dir: PathBuf::from(dir),
        })
    }
}

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Root configuration for a db-test run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DbTestConfig {
    /// Directory holding `tests/` and `data/`.
    #[serde(default)]
    pub test_dir: Option<PathBuf>,
    /// Run behavior options.
    #[serde(default)]
    pub run: RunConfig,
    /// Logical databases to create for the run.
    #[serde(default)]
    pub databases: Vec<DatabaseEntry>,
    /// `SQLite` gateway settings.
    #[serde(default)]
    pub sqlite: SqliteGatewayConfig,
    /// Parameters available to every test.
    #[serde(default)]
    pub params: Params,
}

impl DbTestConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// A missing implicit `./db-test.toml` yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = match fs::read(&resolved) {
            Ok(bytes) => bytes,
            Err(err) if !explicit && err.kind() == io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(ConfigError::Io(format!("{}: {err}", resolved.display())));
            }
        };
        Self::from_bytes(&bytes)
    }

    /// Parses and validates configuration from raw file bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the content is oversized, not UTF-8,
    /// malformed, or invalid.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(test_dir) = &self.test_dir {
            validate_path_field("test_dir", test_dir)?;
        }
        validate_path_field("sqlite.work_dir", &self.sqlite.work_dir)?;
        if self.sqlite.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "sqlite.busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if let Some(break_before) = &self.run.break_before
            && break_before.as_str().trim().is_empty()
        {
            return Err(ConfigError::Invalid("run.break_before must be non-empty".to_string()));
        }
        let mut seen = BTreeSet::new();
        for entry in &self.databases {
            validate_database_name(entry.name.as_str())?;
            validate_path_field(&format!("databases.{}.dir", entry.name), &entry.dir)?;
            if !seen.insert(entry.name.clone()) {
                return Err(ConfigError::Invalid(format!(
                    "database {} is declared more than once",
                    entry.name
                )));
            }
        }
        Ok(())
    }

    /// Replaces or adds a database entry by name.
    pub fn upsert_database(&mut self, entry: DatabaseEntry) {
        if let Some(existing) =
            self.databases.iter_mut().find(|existing| existing.name == entry.name)
        {
            existing.dir = entry.dir;
        } else {
            self.databases.push(entry);
        }
    }

    /// Returns the gateway specs for every configured database.
    #[must_use]
    pub fn database_specs(&self) -> Vec<DatabaseSpec> {
        self.databases.iter().map(DatabaseEntry::to_spec).collect()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
///
/// The flag is true when the path was named explicitly.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path against length constraints.
fn validate_path_field(field: &str, path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a logical database name.
fn validate_database_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Invalid("database name must be non-empty".to_string()));
    }
    if name.len() > MAX_DATABASE_NAME_LENGTH {
        return Err(ConfigError::Invalid(format!("database name '{name}' is too long")));
    }
    if !name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Err(ConfigError::Invalid(format!(
            "database name '{name}' may only contain letters, digits, and '_'"
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
