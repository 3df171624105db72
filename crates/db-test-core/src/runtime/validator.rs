// crates/db-test-core/src/runtime/validator.rs
// ============================================================================
// Module: db-test Schema Validator
// Description: Schema checks, inheritance resolution, and custom checks.
// Purpose: Turn raw test records into self-contained, typed test cases.
// Dependencies: crate::core, regex, serde_json
// ============================================================================

//! ## Overview
//! [`Validator::validate_schema`] runs four passes over a record, in order:
//! required fields (skipped when the record has a parent), field types,
//! unknown keys, then the custom checks declared in [`TEST_SCHEMA`].
//!
//! The `parent` check is the inheritance resolver. It looks the parent up in
//! the full candidate set (valid or not), rejects parents that declare their
//! own parent, and merges parent then child field-by-field with `params`
//! deep-merged. Later checks see the resolved record. Validation never
//! mutates the candidate set; the resolved record is returned alongside the
//! issues.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use regex::Regex;
use serde_json::Value;

use crate::core::DbName;
use crate::core::ExpectedException;
use crate::core::Params;
use crate::core::TestCase;
use crate::core::TestId;
use crate::core::TestRecord;
use crate::core::ValidationIssue;
use crate::core::schema::CustomCheck;
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
use crate::core::schema::FieldKind;
use crate::core::schema::TEST_SCHEMA;
use crate::core::schema::required_fields;
use crate::core::schema::value_kind_label;
use crate::runtime::placeholders::named_placeholders;

// ============================================================================
// SECTION: Validation Output
// ============================================================================

/// Result of validating one record.
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    /// Accumulated issues, errors and warnings alike.
    pub issues: Vec<ValidationIssue>,
    /// Record after inheritance resolution (identical to the input without a parent).
    pub resolved: TestRecord,
}

impl Validation {
    /// Returns true when no issue blocks the record.
    #[must_use]
    pub fn is_runnable(&self) -> bool {
        !self.issues.iter().any(ValidationIssue::is_error)
    }
}

// ============================================================================
// SECTION: Validator
// ============================================================================

/// Validates records against the schema and the full candidate set.
pub struct Validator<'a> {
    /// Every loaded record, keyed by identifier, before resolution.
    candidates: &'a BTreeMap<TestId, TestRecord>,
    /// Parameter names supplied globally at execution time.
    global_params: BTreeSet<String>,
}

impl<'a> Validator<'a> {
    /// Creates a validator over the full candidate set.
    #[must_use]
    pub const fn new(candidates: &'a BTreeMap<TestId, TestRecord>) -> Self {
        Self {
            candidates,
            global_params: BTreeSet::new(),
        }
    }

    /// Declares parameter names that are supplied globally and need not appear in `params`.
    #[must_use]
    pub fn with_global_params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.global_params = names.into_iter().map(Into::into).collect();
        self
    }

    /// Validates one record and resolves its inheritance.
    #[must_use]
    pub fn validate_schema(&self, record: &TestRecord) -> Validation {
        let mut issues = Vec::new();

        if !record.has_parent() {
            for field in required_fields() {
                if record.field(field.name).is_none() {
                    issues.push(ValidationIssue::MissingField {
                        field: field.name.to_string(),
                    });
                }
            }
        }

        for field in TEST_SCHEMA {
            if let Some(value) = record.field(field.name) {
                check_kind(field.name, field.kind, value, &mut issues);
            }
        }

        for key in record.extra.keys() {
            issues.push(ValidationIssue::UnknownField {
                field: key.clone(),
            });
        }

        let mut resolved = record.clone();
        for field in TEST_SCHEMA {
            let Some(check) = field.check else {
                continue;
            };
            if resolved.field(field.name).is_none() {
                continue;
            }
            match check {
                CustomCheck::Parent => self.parent_check(&mut resolved, &mut issues),
                CustomCheck::Params => self.params_check(&resolved, &mut issues),
                CustomCheck::ExpectedException => {
                    expected_exception_check(&resolved, &mut issues);
                }
            }
        }

        Validation {
            issues,
            resolved,
        }
    }

    /// Resolves single-level inheritance in place.
    fn parent_check(&self, record: &mut TestRecord, issues: &mut Vec<ValidationIssue>) {
        let Some(parent_id) = record.parent_id() else {
            return;
        };
        let Some(parent) = self.candidates.get(&parent_id) else {
            issues.push(ValidationIssue::MissingParent {
                parent: parent_id.to_string(),
            });
            return;
        };
        if parent.has_parent() {
            let grandparent = parent
                .parent
                .as_ref()
                .and_then(Value::as_str)
                .map_or_else(|| "<invalid>".to_string(), str::to_string);
            issues.push(ValidationIssue::MultiLevelInheritance {
                parent: parent_id.to_string(),
                grandparent,
            });
            return;
        }

        *record = resolve_inheritance(parent, record);
        for field in required_fields() {
            if record.field(field.name).is_none() {
                issues.push(ValidationIssue::MissingInheritedField {
                    field: field.name.to_string(),
                    parent: parent_id.to_string(),
                });
            }
        }
    }

    /// Verifies every statement placeholder has a value.
    fn params_check(&self, record: &TestRecord, issues: &mut Vec<ValidationIssue>) {
        let Some(Value::Object(params)) = record.params.as_ref() else {
            return;
        };
        let mut reported: BTreeSet<String> = BTreeSet::new();
        for statement in [record.sql.as_ref(), record.check_sql.as_ref()] {
            let Some(Value::String(statement)) = statement else {
                continue;
            };
            for name in named_placeholders(statement) {
                let supplied = params.contains_key(&name) || self.global_params.contains(&name);
                if !supplied && reported.insert(name.clone()) {
                    issues.push(ValidationIssue::MissingParameter {
                        name,
                    });
                }
            }
        }
    }
}

/// Records a type mismatch for a present field.
fn check_kind(name: &str, kind: FieldKind, value: &Value, issues: &mut Vec<ValidationIssue>) {
    if !kind.matches(value) {
        issues.push(ValidationIssue::TypeMismatch {
            field: name.to_string(),
            expected: kind.label(),
            actual: value_kind_label(value),
        });
    }
}

/// Verifies the expected-exception pattern on the resolved record.
fn expected_exception_check(record: &TestRecord, issues: &mut Vec<ValidationIssue>) {
    let Some(pattern) = record.expected_exception.as_ref() else {
        return;
    };
    if is_set(record.check_sql.as_ref()) && is_set(Some(pattern)) {
        issues.push(ValidationIssue::ExpectedExceptionWithCheckSql);
    }
    if let Value::String(pattern) = pattern
        && let Err(err) = Regex::new(pattern)
    {
        issues.push(ValidationIssue::InvalidPattern {
            error: err.to_string(),
        });
    }
}

/// Returns true when a slot holds a non-null, non-empty value.
fn is_set(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(text)) => !text.is_empty(),
        Some(_) => true,
    }
}

// ============================================================================
// SECTION: Inheritance
// ============================================================================

/// Merges a child over its parent.
///
/// Child fields override parent fields; `params` objects are merged key by
/// key with the child winning. The result has no `parent` and carries the
/// child's identity and source.
#[must_use]
pub fn resolve_inheritance(parent: &TestRecord, child: &TestRecord) -> TestRecord {
    let mut merged = parent.clone();
    merged.id = child.id.clone();
    merged.source.clone_from(&child.source);
    for (name, value) in child.fields() {
        if name != FIELD_PARENT {
            merged.set_field(name, value.clone());
        }
    }
    if let (Some(Value::Object(parent_params)), Some(Value::Object(child_params))) =
        (parent.params.as_ref(), child.params.as_ref())
    {
        let mut params = parent_params.clone();
        for (key, value) in child_params {
            params.insert(key.clone(), value.clone());
        }
        merged.params = Some(Value::Object(params));
    }
    merged.parent = None;
    merged
}

// ============================================================================
// SECTION: Typed Conversion
// ============================================================================

/// Converts a resolved record into a typed test case.
///
/// # Errors
///
/// Returns every issue that prevents conversion (missing or mistyped fields,
/// an unresolved parent, or an invalid pattern).
pub fn build_test_case(record: &TestRecord) -> Result<TestCase, Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    if record.has_parent() {
        issues.push(ValidationIssue::MissingParent {
            parent: record.parent_id().map_or_else(String::new, |id| id.to_string()),
        });
    }

    let db = required_string(record, FIELD_DB, &mut issues);
    let sql = required_string(record, FIELD_SQL, &mut issues);
    let result = record.result.clone();
    if result.is_none() {
        issues.push(ValidationIssue::MissingField {
            field: FIELD_RESULT.to_string(),
        });
    }
    let name = optional_string(record, FIELD_NAME, &mut issues);
    let check_sql = optional_string(record, FIELD_CHECK_SQL, &mut issues);
    let cleanup = optional_string(record, FIELD_CLEANUP, &mut issues);
    let description = optional_string(record, FIELD_DESCRIPTION, &mut issues);
    let pattern = optional_string(record, FIELD_EXPECTED_EXCEPTION, &mut issues);
    let params = match record.params.as_ref() {
        None | Some(Value::Null) => Params::new(),
        Some(Value::Object(params)) => params.clone(),
        Some(other) => {
            check_kind(FIELD_PARAMS, FieldKind::Object, other, &mut issues);
            Params::new()
        }
    };
    let expected_exception = match pattern.filter(|pattern| !pattern.is_empty()) {
        None => None,
        Some(pattern) => match ExpectedException::new(pattern) {
            Ok(expected) => Some(expected),
            Err(err) => {
                issues.push(ValidationIssue::InvalidPattern {
                    error: err.to_string(),
                });
                None
            }
        },
    };
    if expected_exception.is_some() && check_sql.as_deref().is_some_and(|sql| !sql.is_empty()) {
        issues.push(ValidationIssue::ExpectedExceptionWithCheckSql);
    }

    match (db, sql, result) {
        (Some(db), Some(sql), Some(result)) if issues.is_empty() => Ok(TestCase {
            id: record.id.clone(),
            name,
            db: DbName::new(db),
            sql,
            result,
            check_sql: check_sql.filter(|sql| !sql.is_empty()),
            params,
            cleanup: cleanup.filter(|sql| !sql.is_empty()),
            expected_exception,
            description,
            source: record.source.clone(),
        }),
        _ => Err(issues),
    }
}

/// Reads a required string field, recording an issue when absent or mistyped.
fn required_string(
    record: &TestRecord,
    field: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    match record.field(field) {
        None => {
            issues.push(ValidationIssue::MissingField {
                field: field.to_string(),
            });
            None
        }
        Some(Value::String(value)) => Some(value.clone()),
        Some(other) => {
            check_kind(field, FieldKind::String, other, issues);
            None
        }
    }
}

/// Reads an optional string field; `null` counts as absent here.
fn optional_string(
    record: &TestRecord,
    field: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    match record.field(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(value)) => Some(value.clone()),
        Some(other) => {
            check_kind(field, FieldKind::String, other, issues);
            None
        }
    }
}
