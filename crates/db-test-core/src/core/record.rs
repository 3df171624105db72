// crates/db-test-core/src/core/record.rs
// ============================================================================
// Module: db-test Records
// Description: Raw test records and validated test cases.
// Purpose: Model declarative test definitions before and after validation.
// Dependencies: regex, serde, serde_json
// ============================================================================

//! ## Overview
//! A [`TestRecord`] is the loosely typed form loaded from a source file: one
//! optional JSON slot per schema field plus an `extra` map for keys the
//! schema does not know. Validation turns a record into a [`TestCase`] whose
//! fields carry concrete types and whose inheritance is already resolved.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use regex::Regex;
use serde_json::Map;
use serde_json::Value;

use crate::core::identifiers::DbName;
use crate::core::identifiers::TestId;
use crate::core::schema::FIELD_CHECK_SQL;
use crate::core::schema::FIELD_CLEANUP;
use crate::core::schema::FIELD_DB;
use crate::core::schema::FIELD_DESCRIPTION;
use crate::core::schema::FIELD_EXPECTED_EXCEPTION;
use crate::core::schema::FIELD_NAME;
use crate::core::schema::FIELD_PARAMS;
use crate::core::schema::FIELD_PARENT;
use crate::core::schema::FIELD_RESULT;
use crate::core::schema::FIELD_SQL;

// ============================================================================
// SECTION: Shared Value Types
// ============================================================================

/// Named statement parameters.
pub type Params = Map<String, Value>;

/// A single result row keyed by column name.
pub type Row = Map<String, Value>;

// ============================================================================
// SECTION: Test Record
// ============================================================================

/// Raw, unvalidated test record.
///
/// # Invariants
/// - `extra` never contains a key declared in the schema.
/// - A slot holding `Some(Value::Null)` means the key was present with a null value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TestRecord {
    /// Record identifier.
    pub id: TestId,
    /// Optional display name.
    pub name: Option<Value>,
    /// Logical database name.
    pub db: Option<Value>,
    /// Statement under test.
    pub sql: Option<Value>,
    /// Expected result.
    pub result: Option<Value>,
    /// Verification statement whose result replaces the `sql` result.
    pub check_sql: Option<Value>,
    /// Named statement parameters.
    pub params: Option<Value>,
    /// Identifier of the record to inherit from.
    pub parent: Option<Value>,
    /// Statement run after a passing test.
    pub cleanup: Option<Value>,
    /// Regular expression matched against execution errors.
    pub expected_exception: Option<Value>,
    /// Documentation only.
    pub description: Option<Value>,
    /// Keys not declared in the schema.
    pub extra: BTreeMap<String, Value>,
    /// Source file the record was loaded from.
    pub source: Option<PathBuf>,
}

impl TestRecord {
    /// Creates an empty record with the given identifier.
    #[must_use]
    pub fn new(id: impl Into<TestId>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Builds a record from a field map, routing unknown keys into `extra`.
    #[must_use]
    pub fn from_fields(id: impl Into<TestId>, fields: Map<String, Value>) -> Self {
        let mut record = Self::new(id);
        for (key, value) in fields {
            record.set_field(&key, value);
        }
        record
    }

    /// Attaches the source path the record was loaded from.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns a field value by name, including unknown keys.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        match name {
            FIELD_NAME => self.name.as_ref(),
            FIELD_DB => self.db.as_ref(),
            FIELD_SQL => self.sql.as_ref(),
            FIELD_RESULT => self.result.as_ref(),
            FIELD_CHECK_SQL => self.check_sql.as_ref(),
            FIELD_PARAMS => self.params.as_ref(),
            FIELD_PARENT => self.parent.as_ref(),
            FIELD_CLEANUP => self.cleanup.as_ref(),
            FIELD_EXPECTED_EXCEPTION => self.expected_exception.as_ref(),
            FIELD_DESCRIPTION => self.description.as_ref(),
            other => self.extra.get(other),
        }
    }

    /// Sets a field value by name; unknown names land in `extra`.
    pub fn set_field(&mut self, name: &str, value: Value) {
        match self.slot_mut(name) {
            Some(slot) => *slot = Some(value),
            None => {
                self.extra.insert(name.to_string(), value);
            }
        }
    }

    /// Returns all present fields as `(name, value)` pairs.
    #[must_use]
    pub fn fields(&self) -> Vec<(&str, &Value)> {
        let known = [
            (FIELD_NAME, self.name.as_ref()),
            (FIELD_DB, self.db.as_ref()),
            (FIELD_SQL, self.sql.as_ref()),
            (FIELD_RESULT, self.result.as_ref()),
            (FIELD_CHECK_SQL, self.check_sql.as_ref()),
            (FIELD_PARAMS, self.params.as_ref()),
            (FIELD_PARENT, self.parent.as_ref()),
            (FIELD_CLEANUP, self.cleanup.as_ref()),
            (FIELD_EXPECTED_EXCEPTION, self.expected_exception.as_ref()),
            (FIELD_DESCRIPTION, self.description.as_ref()),
        ];
        let mut out: Vec<(&str, &Value)> =
            known.into_iter().filter_map(|(name, value)| value.map(|value| (name, value))).collect();
        out.extend(self.extra.iter().map(|(name, value)| (name.as_str(), value)));
        out
    }

    /// Returns the declared parent identifier when it is a string.
    #[must_use]
    pub fn parent_id(&self) -> Option<TestId> {
        self.parent.as_ref().and_then(Value::as_str).map(TestId::from)
    }

    /// Returns true when the record declares a non-empty parent.
    #[must_use]
    pub fn has_parent(&self) -> bool {
        match &self.parent {
            None | Some(Value::Null) => false,
            Some(Value::String(parent)) => !parent.is_empty(),
            Some(_) => true,
        }
    }

    /// Returns the display name (`"<id>. <name>"` when a name is declared).
    #[must_use]
    pub fn display_name(&self) -> String {
        display_name(&self.id, self.name.as_ref().and_then(Value::as_str))
    }

    /// Returns a printable label for the record source.
    #[must_use]
    pub fn source_label(&self) -> String {
        self.source.as_deref().map_or_else(|| "<inline>".to_string(), path_label)
    }

    /// Returns the slot for a schema field.
    fn slot_mut(&mut self, name: &str) -> Option<&mut Option<Value>> {
        match name {
            FIELD_NAME => Some(&mut self.name),
            FIELD_DB => Some(&mut self.db),
            FIELD_SQL => Some(&mut self.sql),
            FIELD_RESULT => Some(&mut self.result),
            FIELD_CHECK_SQL => Some(&mut self.check_sql),
            FIELD_PARAMS => Some(&mut self.params),
            FIELD_PARENT => Some(&mut self.parent),
            FIELD_CLEANUP => Some(&mut self.cleanup),
            FIELD_EXPECTED_EXCEPTION => Some(&mut self.expected_exception),
            FIELD_DESCRIPTION => Some(&mut self.description),
            _ => None,
        }
    }
}

/// Formats a path for reports.
fn path_label(path: &Path) -> String {
    path.display().to_string()
}

/// Builds the display name shared by records and test cases.
fn display_name(id: &TestId, name: Option<&str>) -> String {
    match name {
        Some(name) if !name.is_empty() => format!("{id}. {name}"),
        _ => id.to_string(),
    }
}

// ============================================================================
// SECTION: Expected Exception
// ============================================================================

/// Compiled expected-exception pattern.
#[derive(Clone)]
pub struct ExpectedException {
    /// Pattern as written in the test source.
    pattern: String,
    /// Compiled regular expression.
    regex: Regex,
}

impl ExpectedException {
    /// Compiles an expected-exception pattern.
    ///
    /// # Errors
    ///
    /// Returns [`regex::Error`] when the pattern is not a valid regular expression.
    pub fn new(pattern: impl Into<String>) -> Result<Self, regex::Error> {
        let pattern = pattern.into();
        let regex = Regex::new(&pattern)?;
        Ok(Self {
            pattern,
            regex,
        })
    }

    /// Returns the source pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns true when the pattern matches anywhere in the error message.
    #[must_use]
    pub fn matches(&self, message: &str) -> bool {
        self.regex.is_match(message)
    }

    /// Returns the sentinel compared against the actual result.
    #[must_use]
    pub fn sentinel(&self) -> Value {
        Value::String(format!("expected_exception: {}", self.pattern))
    }
}

impl fmt::Debug for ExpectedException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ExpectedException").field(&self.pattern).finish()
    }
}

impl PartialEq for ExpectedException {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

// ============================================================================
// SECTION: Test Case
// ============================================================================

/// Validated, self-contained test case ready for execution.
///
/// # Invariants
/// - Inheritance is resolved; there is no parent reference.
/// - `expected_exception` and `check_sql` are never both set.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    /// Test identifier.
    pub id: TestId,
    /// Optional display name.
    pub name: Option<String>,
    /// Logical database the statements run against.
    pub db: DbName,
    /// Statement under test.
    pub sql: String,
    /// Expected result (`Value::Null` means no rows).
    pub result: Value,
    /// Optional verification statement.
    pub check_sql: Option<String>,
    /// Named statement parameters.
    pub params: Params,
    /// Optional cleanup statement.
    pub cleanup: Option<String>,
    /// Optional expected-exception pattern.
    pub expected_exception: Option<ExpectedException>,
    /// Documentation only.
    pub description: Option<String>,
    /// Source file the record was loaded from.
    pub source: Option<PathBuf>,
}

impl TestCase {
    /// Returns the display name (`"<id>. <name>"` when a name is declared).
    #[must_use]
    pub fn display_name(&self) -> String {
        display_name(&self.id, self.name.as_deref())
    }

    /// Returns the value the actual result is compared against.
    #[must_use]
    pub fn expected_value(&self) -> Value {
        self.expected_exception.as_ref().map_or_else(|| self.result.clone(), ExpectedException::sentinel)
    }
}
