// crates/db-test-store-sqlite/src/gateway.rs
// ============================================================================
// Module: SQLite Database Gateway
// Description: DatabaseGateway backed by ephemeral per-run SQLite files.
// Purpose: Create, populate, query, and tear down test databases.
// Dependencies: db-test-core, rusqlite, time, thiserror
// ============================================================================

//! ## Overview
//! Each logical database gets a fresh file
//! `<work_dir>/<name>_test_<YYYYmmddHHMMSS>.sqlite3`, populated from its
//! setup scripts before the run. Every `execute` call runs in its own
//! transaction: commit on success, rollback on error. Only placeholders that
//! appear in a statement are bound, so one parameter map can serve a
//! statement, its check query, and its cleanup.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use db_test_core::DatabaseGateway;
use db_test_core::DbName;
use db_test_core::ExecutionError;
use db_test_core::Params;
use db_test_core::QueryOutput;
use db_test_core::Row;
use db_test_core::RunEvent;
use db_test_core::RunReporter;
use db_test_core::Severity;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use thiserror::Error;
use time::OffsetDateTime;

use crate::config::SqliteGatewayConfig;
use crate::convert::from_value_ref;
use crate::convert::to_sql_value;
use crate::scripts::setup_batches;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum size of a single setup script.
const MAX_SCRIPT_BYTES: u64 = 64 * 1024 * 1024;
/// Suffixes of `SQLite` side files removed with the database.
const SIDE_FILE_SUFFIXES: [&str; 2] = ["-wal", "-shm"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` gateway errors.
#[derive(Debug, Error)]
pub enum SqliteGatewayError {
    /// Filesystem error.
    #[error("sqlite gateway io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite gateway db error: {0}")]
    Db(String),
    /// Invalid gateway input.
    #[error("sqlite gateway invalid input: {0}")]
    Invalid(String),
    /// A database file for this run already exists.
    #[error("database file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),
    /// A setup script failed.
    #[error("setup script {} failed: {error}", .path.display())]
    Script {
        /// Script that failed.
        path: PathBuf,
        /// Underlying error message.
        error: String,
    },
}

// ============================================================================
// SECTION: Database Specs
// ============================================================================

/// Logical database and the directory holding its setup scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSpec {
    /// Logical database name used by tests.
    pub name: DbName,
    /// Directory with the schema and data scripts.
    pub dir: PathBuf,
}

impl DatabaseSpec {
    /// Creates a database spec.
    #[must_use]
    pub fn new(name: impl Into<DbName>, dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
        }
    }
}

/// Live database file and its connection.
struct LiveDatabase {
    /// Database file path.
    path: PathBuf,
    /// Connection guarded by a mutex.
    connection: Mutex<Connection>,
}

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// `SQLite`-backed database gateway.
pub struct SqliteGateway {
    /// Gateway configuration.
    config: SqliteGatewayConfig,
    /// Live databases keyed by logical name.
    databases: BTreeMap<DbName, LiveDatabase>,
}

impl SqliteGateway {
    /// Creates and populates one database file per spec.
    ///
    /// On failure, every database created so far is removed.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteGatewayError`] when a file cannot be created, already
    /// exists, or a setup script fails.
    pub fn setup(
        config: SqliteGatewayConfig,
        specs: &[DatabaseSpec],
        test_dir: &Path,
        reporter: &dyn RunReporter,
    ) -> Result<Self, SqliteGatewayError> {
        let mut gateway = Self {
            config,
            databases: BTreeMap::new(),
        };
        fs::create_dir_all(&gateway.config.work_dir)
            .map_err(|err| SqliteGatewayError::Io(err.to_string()))?;
        let stamp = run_stamp();
        for spec in specs {
            if let Err(err) = gateway.attach(spec, test_dir, &stamp, reporter) {
                let _ = gateway.teardown(false, reporter);
                return Err(err);
            }
        }
        Ok(gateway)
    }

    /// Returns the file path backing a logical database.
    #[must_use]
    pub fn database_path(&self, db: &DbName) -> Option<&Path> {
        self.databases.get(db).map(|live| live.path.as_path())
    }

    /// Closes every connection and removes the files unless `keep` is set.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteGatewayError`] when a database file cannot be removed.
    pub fn teardown(
        &mut self,
        keep: bool,
        reporter: &dyn RunReporter,
    ) -> Result<Vec<PathBuf>, SqliteGatewayError> {
        let mut paths = Vec::new();
        let mut first_error = None;
        for (name, live) in std::mem::take(&mut self.databases) {
            drop(live.connection);
            if keep {
                reporter.record(&RunEvent::lifecycle(
                    Severity::Info,
                    format!("keeping database {name} at {}", live.path.display()),
                ));
            } else {
                reporter.record(&RunEvent::lifecycle(
                    Severity::Info,
                    format!("dropping database {name}"),
                ));
                if let Err(err) = remove_database_files(&live.path) {
                    first_error.get_or_insert(err);
                }
            }
            paths.push(live.path);
        }
        first_error.map_or(Ok(paths), Err)
    }

    /// Creates, opens, and populates one database.
    fn attach(
        &mut self,
        spec: &DatabaseSpec,
        test_dir: &Path,
        stamp: &str,
        reporter: &dyn RunReporter,
    ) -> Result<(), SqliteGatewayError> {
        if self.databases.contains_key(&spec.name) {
            return Err(SqliteGatewayError::Invalid(format!(
                "database {} is declared more than once",
                spec.name
            )));
        }
        if !spec.dir.is_dir() {
            return Err(SqliteGatewayError::Invalid(format!(
                "database directory {} does not exist",
                spec.dir.display()
            )));
        }
        let path = self.config.work_dir.join(format!("{}_test_{stamp}.sqlite3", spec.name));
        validate_database_path(&path)?;
        if path.exists() {
            return Err(SqliteGatewayError::AlreadyExists(path));
        }
        reporter.record(&RunEvent::lifecycle(
            Severity::Info,
            format!("creating database {} ({})", spec.name, path.display()),
        ));
        let mut connection = open_connection(&path, &self.config)?;
        if let Err(err) = populate(&mut connection, spec, test_dir, reporter) {
            drop(connection);
            let _ = remove_database_files(&path);
            return Err(err);
        }
        self.databases.insert(
            spec.name.clone(),
            LiveDatabase {
                path,
                connection: Mutex::new(connection),
            },
        );
        Ok(())
    }

    /// Runs one statement inside its own transaction.
    fn run_statement(
        connection: &mut Connection,
        statement: &str,
        params: &Params,
    ) -> Result<QueryOutput, ExecutionError> {
        let failure = |err: rusqlite::Error| ExecutionError::statement(err.to_string(), statement);
        let tx = connection.transaction().map_err(failure)?;
        let rows = {
            let mut prepared = tx.prepare(statement).map_err(failure)?;
            bind_parameters(&mut prepared, statement, params)?;
            let columns: Vec<String> =
                prepared.column_names().into_iter().map(str::to_string).collect();
            let mut rows = Vec::new();
            let mut cursor = prepared.raw_query();
            while let Some(row) = cursor.next().map_err(failure)? {
                let mut record = Row::new();
                for (index, column) in columns.iter().enumerate() {
                    let value = row.get_ref(index).map_err(failure)?;
                    record.insert(column.clone(), from_value_ref(value));
                }
                rows.push(record);
            }
            rows
        };
        tx.commit().map_err(failure)?;
        Ok(if rows.is_empty() { None } else { Some(rows) })
    }
}

impl DatabaseGateway for SqliteGateway {
    fn live_databases(&self) -> Vec<DbName> {
        self.databases.keys().cloned().collect()
    }

    fn is_live(&self, db: &DbName) -> bool {
        self.databases.contains_key(db)
    }

    fn physical_name(&self, db: &DbName) -> Option<String> {
        self.databases.get(db).and_then(|live| {
            live.path.file_stem().and_then(|stem| stem.to_str()).map(str::to_string)
        })
    }

    fn execute(
        &self,
        db: &DbName,
        statement: &str,
        params: &Params,
    ) -> Result<QueryOutput, ExecutionError> {
        let live = self.databases.get(db).ok_or_else(|| ExecutionError::unknown_database(db))?;
        let mut guard = live
            .connection
            .lock()
            .map_err(|_| ExecutionError::connection("connection mutex poisoned"))?;
        Self::run_statement(&mut guard, statement, params)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Binds named placeholders present in the statement.
fn bind_parameters(
    prepared: &mut rusqlite::Statement<'_>,
    statement: &str,
    params: &Params,
) -> Result<(), ExecutionError> {
    for index in 1 ..= prepared.parameter_count() {
        let name = prepared.parameter_name(index).map(str::to_string);
        let Some(name) = name.filter(|name| !name.starts_with('?')) else {
            return Err(ExecutionError::statement(
                "positional parameters are not supported; use :name placeholders",
                statement,
            ));
        };
        let key = &name[1 ..];
        let Some(value) = params.get(key) else {
            return Err(ExecutionError::statement(
                format!("parameter '{key}' not found in params"),
                statement,
            ));
        };
        prepared
            .raw_bind_parameter(index, to_sql_value(value))
            .map_err(|err| ExecutionError::statement(err.to_string(), statement))?;
    }
    Ok(())
}

/// Runs every setup batch for one database.
fn populate(
    connection: &mut Connection,
    spec: &DatabaseSpec,
    test_dir: &Path,
    reporter: &dyn RunReporter,
) -> Result<(), SqliteGatewayError> {
    let batches = setup_batches(&spec.dir, test_dir, &spec.name)
        .map_err(|err| SqliteGatewayError::Io(err.to_string()))?;
    for batch in batches {
        reporter.record(&RunEvent::lifecycle(
            Severity::Info,
            format!("loading {} for {}", batch.section, spec.name),
        ));
        for file in &batch.files {
            apply_script(connection, file)?;
        }
    }
    Ok(())
}

/// Applies one setup script in a transaction.
fn apply_script(connection: &mut Connection, path: &Path) -> Result<(), SqliteGatewayError> {
    let script_error = |error: String| SqliteGatewayError::Script {
        path: path.to_path_buf(),
        error,
    };
    let size = fs::metadata(path).map_err(|err| script_error(err.to_string()))?.len();
    if size > MAX_SCRIPT_BYTES {
        return Err(script_error(format!("script exceeds {MAX_SCRIPT_BYTES} bytes")));
    }
    let sql = fs::read_to_string(path).map_err(|err| script_error(err.to_string()))?;
    let tx = connection.transaction().map_err(|err| script_error(err.to_string()))?;
    tx.execute_batch(&sql).map_err(|err| script_error(err.to_string()))?;
    tx.commit().map_err(|err| script_error(err.to_string()))
}

/// Validates database path limits.
fn validate_database_path(path: &Path) -> Result<(), SqliteGatewayError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteGatewayError::Invalid("database path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteGatewayError::Invalid(
                "database path contains an overlong component".to_string(),
            ));
        }
    }
    Ok(())
}

/// Opens a new database file and applies pragmas.
fn open_connection(
    path: &Path,
    config: &SqliteGatewayConfig,
) -> Result<Connection, SqliteGatewayError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(path, flags).map_err(db_error)?;
    connection.execute_batch("PRAGMA foreign_keys = ON;").map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(db_error)?;
    connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms)).map_err(db_error)?;
    Ok(connection)
}

/// Removes a database file and its side files.
fn remove_database_files(path: &Path) -> Result<(), SqliteGatewayError> {
    let mut targets = vec![path.to_path_buf()];
    for suffix in SIDE_FILE_SUFFIXES {
        let mut side = path.as_os_str().to_os_string();
        side.push(suffix);
        targets.push(PathBuf::from(side));
    }
    for target in targets {
        match fs::remove_file(&target) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(SqliteGatewayError::Io(err.to_string())),
        }
    }
    Ok(())
}

/// Maps a `SQLite` error into a gateway error.
fn db_error(err: rusqlite::Error) -> SqliteGatewayError {
    SqliteGatewayError::Db(err.to_string())
}

/// Returns the `YYYYmmddHHMMSS` stamp used in database file names.
fn run_stamp() -> String {
    let now = OffsetDateTime::now_utc();
    format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}
