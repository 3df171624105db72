// crates/db-test-store-sqlite/src/scripts.rs
// ============================================================================
// Module: Setup Script Discovery
// Description: Ordered discovery of SQL setup scripts for a test database.
// Purpose: Build schema and fixtures before any test runs.
// Dependencies: std
// ============================================================================

//! ## Overview
//! A database directory is split into sections applied in order:
//! `pre-data/` (schema), `data/` (default rows), the suite's own
//! `<test_dir>/data/<db>/` fixtures, then `post-data/` (constraints and
//! indexes). When a database directory has none of the section directories,
//! its top-level `*.sql` files are used as the schema instead. Files inside a
//! section run in file-name order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use db_test_core::DbName;

// ============================================================================
// SECTION: Sections
// ============================================================================

/// Phase of database setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptSection {
    /// Schema objects.
    PreData,
    /// Default data shipped with the schema.
    Data,
    /// Fixtures shipped with the test suite.
    TestData,
    /// Constraints and indexes.
    PostData,
    /// Top-level scripts of a directory without sections.
    Root,
}

impl ScriptSection {
    /// Returns the section label used in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PreData => "pre-data",
            Self::Data => "data",
            Self::TestData => "test data",
            Self::PostData => "post-data",
            Self::Root => "schema",
        }
    }
}

impl fmt::Display for ScriptSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Scripts of one section, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptBatch {
    /// Section the scripts belong to.
    pub section: ScriptSection,
    /// Script files in file-name order.
    pub files: Vec<PathBuf>,
}

// ============================================================================
// SECTION: Discovery
// ============================================================================

/// Returns the setup batches for one database, skipping empty sections.
///
/// # Errors
///
/// Returns [`io::Error`] when a section directory cannot be listed.
pub fn setup_batches(db_dir: &Path, test_dir: &Path, db: &DbName) -> io::Result<Vec<ScriptBatch>> {
    let pre_data = db_dir.join("pre-data");
    let data = db_dir.join("data");
    let post_data = db_dir.join("post-data");
    let sectioned = pre_data.is_dir() || data.is_dir() || post_data.is_dir();

    let mut plan = if sectioned {
        vec![(ScriptSection::PreData, pre_data), (ScriptSection::Data, data)]
    } else {
        vec![(ScriptSection::Root, db_dir.to_path_buf())]
    };
    plan.push((ScriptSection::TestData, test_dir.join("data").join(db.as_str())));
    if sectioned {
        plan.push((ScriptSection::PostData, post_data));
    }

    let mut batches = Vec::new();
    for (section, dir) in plan {
        let files = sql_files(&dir)?;
        if !files.is_empty() {
            batches.push(ScriptBatch {
                section,
                files,
            });
        }
    }
    Ok(batches)
}

/// Lists `*.sql` files directly inside `dir`, sorted by file name.
fn sql_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_sql = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case("sql"));
        if is_sql && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
