// crates/db-test-authoring/src/loader.rs
// ============================================================================
// Module: Test Source Loader
// Description: Discovers test source files and converts them into records.
// Purpose: Aggregate every `tests` collection under a directory tree.
// Dependencies: db-test-core, serde_json, walkdir
// ============================================================================

//! ## Overview
//! The loader walks `<test_dir>/tests` in sorted path order, parses every
//! file with a supported extension, and converts each element of its
//! top-level `tests` array into a [`TestRecord`]. Elements are either
//! `[id, {fields}]` pairs or objects with an `id` key. Files with other
//! extensions are skipped and reported back to the caller. Any parse or
//! shape error is fatal and names the offending file.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use db_test_core::TestId;
use db_test_core::TestRecord;
use db_test_core::core::schema::value_kind_label;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;
use walkdir::WalkDir;

use crate::format::SourceFormat;
use crate::format::detect_format;
use crate::format::parse_value;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Directory under the test directory that holds test sources.
pub const TESTS_SUBDIR: &str = "tests";
/// Top-level key holding the test collection in each source.
pub const TESTS_KEY: &str = "tests";
/// Maximum size of a single test source file.
pub const MAX_SOURCE_FILE_BYTES: u64 = 8 * 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading test sources.
#[derive(Debug, Error)]
pub enum AuthoringError {
    /// Filesystem access failed.
    #[error("failed to read {}: {error}", .path.display())]
    Io {
        /// Path being read.
        path: PathBuf,
        /// Underlying error message.
        error: String,
    },
    /// A source file exceeds the size limit.
    #[error("{} exceeds the {limit} byte source limit", .path.display())]
    TooLarge {
        /// Offending file.
        path: PathBuf,
        /// Size limit in bytes.
        limit: u64,
    },
    /// A source file failed to parse.
    #[error("failed to parse {format} source {}: {error}", .path.display())]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// Format used to parse the file.
        format: SourceFormat,
        /// Parser error message.
        error: String,
    },
    /// A source has no top-level `tests` array.
    #[error("{} has no top-level 'tests' array", .path.display())]
    MissingTests {
        /// Offending file.
        path: PathBuf,
    },
    /// An element of `tests` has an unsupported shape.
    #[error("{} tests[{index}]: {reason}", .path.display())]
    InvalidEntry {
        /// Offending file.
        path: PathBuf,
        /// Element index.
        index: usize,
        /// Shape problem.
        reason: String,
    },
}

// ============================================================================
// SECTION: Loaded Sources
// ============================================================================

/// Records gathered from a test directory.
#[derive(Debug, Clone, Default)]
pub struct LoadedSources {
    /// Records in file order, then element order.
    pub records: Vec<TestRecord>,
    /// Source files that contributed records.
    pub files: Vec<PathBuf>,
    /// Files skipped for having an unsupported extension.
    pub skipped: Vec<PathBuf>,
}

// ============================================================================
// SECTION: Public API
// ============================================================================

/// Loads every test source under `<test_dir>/tests`.
///
/// A missing `tests` directory loads nothing, the same as an empty one.
///
/// # Errors
///
/// Returns [`AuthoringError`] when a file cannot be read or parsed, or a
/// `tests` element is malformed.
pub fn load_test_sources(test_dir: &Path) -> Result<LoadedSources, AuthoringError> {
    let root = test_dir.join(TESTS_SUBDIR);
    let mut loaded = LoadedSources::default();
    if !root.is_dir() {
        return Ok(loaded);
    }
    for entry in WalkDir::new(&root).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|err| AuthoringError::Io {
            path: err.path().map_or_else(|| root.clone(), Path::to_path_buf),
            error: err.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        let Some(format) = detect_format(&path) else {
            loaded.skipped.push(path);
            continue;
        };
        let mut records = load_source_file(&path, format)?;
        loaded.records.append(&mut records);
        loaded.files.push(path);
    }
    Ok(loaded)
}

/// Loads one source file.
///
/// # Errors
///
/// Returns [`AuthoringError`] when the file cannot be read or parsed.
pub fn load_source_file(path: &Path, format: SourceFormat) -> Result<Vec<TestRecord>, AuthoringError> {
    let metadata = fs::metadata(path).map_err(|err| AuthoringError::Io {
        path: path.to_path_buf(),
        error: err.to_string(),
    })?;
    if metadata.len() > MAX_SOURCE_FILE_BYTES {
        return Err(AuthoringError::TooLarge {
            path: path.to_path_buf(),
            limit: MAX_SOURCE_FILE_BYTES,
        });
    }
    let input = fs::read_to_string(path).map_err(|err| AuthoringError::Io {
        path: path.to_path_buf(),
        error: err.to_string(),
    })?;
    parse_source(&input, format, path)
}

/// Parses source text into records attributed to `path`.
///
/// # Errors
///
/// Returns [`AuthoringError`] when the text is malformed or a `tests`
/// element has an unsupported shape.
pub fn parse_source(
    input: &str,
    format: SourceFormat,
    path: &Path,
) -> Result<Vec<TestRecord>, AuthoringError> {
    let value = parse_value(input, format).map_err(|error| AuthoringError::Parse {
        path: path.to_path_buf(),
        format,
        error,
    })?;
    let Some(Value::Array(entries)) = value.get(TESTS_KEY) else {
        return Err(AuthoringError::MissingTests {
            path: path.to_path_buf(),
        });
    };
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            entry_to_record(entry).map(|record| record.with_source(path)).map_err(|reason| {
                AuthoringError::InvalidEntry {
                    path: path.to_path_buf(),
                    index,
                    reason,
                }
            })
        })
        .collect()
}

// ============================================================================
// SECTION: Entry Conversion
// ============================================================================

/// Converts one `tests` element into a record.
fn entry_to_record(entry: &Value) -> Result<TestRecord, String> {
    match entry {
        Value::Array(pair) => match pair.as_slice() {
            [id, Value::Object(fields)] => {
                let id = identifier(id)?;
                let mut fields = fields.clone();
                if let Some(inner) = fields.remove("id") {
                    let inner = identifier(&inner)?;
                    if inner != id {
                        return Err(format!("inner id '{inner}' does not match '{id}'"));
                    }
                }
                Ok(TestRecord::from_fields(id, fields))
            }
            _ => Err("expected an [id, {fields}] pair".to_string()),
        },
        Value::Object(fields) => {
            let mut fields: Map<String, Value> = fields.clone();
            let id = fields
                .remove("id")
                .ok_or_else(|| "object entry has no 'id'".to_string())
                .and_then(|id| identifier(&id))?;
            Ok(TestRecord::from_fields(id, fields))
        }
        other => Err(format!("unsupported entry of type {}", value_kind_label(other))),
    }
}

/// Reads a test identifier from a string or integer.
fn identifier(value: &Value) -> Result<TestId, String> {
    match value {
        Value::String(id) if !id.trim().is_empty() => Ok(TestId::new(id.clone())),
        Value::Number(id) if id.is_i64() || id.is_u64() => Ok(TestId::new(id.to_string())),
        _ => Err("test id must be a non-empty string or an integer".to_string()),
    }
}
