// crates/db-test-store-sqlite/src/config.rs
// ============================================================================
// Module: SQLite Gateway Configuration
// Description: Connection pragmas and working directory for test databases.
// Purpose: Describe how ephemeral SQLite databases are created and opened.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Test databases are files created under `work_dir` for one run. Journal
//! and sync modes map directly onto `SQLite` pragmas.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Directory name used under the system temp dir when no work dir is set.
const DEFAULT_WORK_SUBDIR: &str = "db-test";

// ============================================================================
// SECTION: Modes
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode.
    #[default]
    Wal,
    /// Delete journal mode.
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode.
    Full,
    /// Normal synchronous mode; test databases are disposable.
    #[default]
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

// ============================================================================
// SECTION: Config
// ============================================================================

/// Configuration for the `SQLite` gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteGatewayConfig {
    /// Directory that receives the per-run database files.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for SqliteGatewayConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default working directory for database files.
fn default_work_dir() -> PathBuf {
    env::temp_dir().join(DEFAULT_WORK_SUBDIR)
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}
