// crates/db-test-core/tests/validator.rs
// ============================================================================
// Module: Schema Validator Tests
// Description: Tests for schema checks, inheritance, and custom checks.
// Purpose: Ensure malformed records are rejected with precise issues.
// Dependencies: db-test-core, serde_json
// ============================================================================
//! ## Overview
//! Exercises `Validator::validate_schema`, `resolve_inheritance`, and
//! `build_test_case` on well-formed and malformed records.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::collections::BTreeMap;

use common::record;
use db_test_core::TestId;
use db_test_core::TestRecord;
use db_test_core::ValidationIssue;
use db_test_core::runtime::Validator;
use db_test_core::runtime::build_test_case;
use db_test_core::runtime::resolve_inheritance;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn candidates(records: Vec<TestRecord>) -> BTreeMap<TestId, TestRecord> {
    records.into_iter().map(|record| (record.id.clone(), record)).collect()
}

fn base() -> TestRecord {
    record("t1", json!({"db": "d", "sql": "select 1 as x", "result": [{"x": 1}]}))
}

fn issues_for(records: Vec<TestRecord>, id: &str) -> Vec<ValidationIssue> {
    let set = candidates(records);
    let validator = Validator::new(&set);
    validator.validate_schema(&set[&TestId::new(id)]).issues
}

// ============================================================================
// SECTION: Schema Checks
// ============================================================================

/// Verifies a complete record has no issues.
#[test]
fn complete_record_is_clean() {
    assert!(issues_for(vec![base()], "t1").is_empty());
}

/// Verifies each missing required field is reported once.
#[test]
fn missing_required_fields_are_reported() {
    let issues = issues_for(vec![record("t1", json!({"sql": "select 1"}))], "t1");
    assert_eq!(
        issues,
        vec![
            ValidationIssue::MissingField {
                field: "db".to_string()
            },
            ValidationIssue::MissingField {
                field: "result".to_string()
            },
        ]
    );
}

/// Verifies a null result is accepted as "no rows".
#[test]
fn null_result_is_valid() {
    let issues =
        issues_for(vec![record("t1", json!({"db": "d", "sql": "delete from t", "result": null}))], "t1");
    assert!(issues.is_empty());
}

/// Verifies field types are checked for present fields.
#[test]
fn wrong_types_are_reported() {
    let issues = issues_for(
        vec![record("t1", json!({"db": 3, "sql": "select 1", "result": [], "params": ["a"]}))],
        "t1",
    );
    assert!(issues.contains(&ValidationIssue::TypeMismatch {
        field: "db".to_string(),
        expected: "string",
        actual: "number",
    }));
    assert!(issues.contains(&ValidationIssue::TypeMismatch {
        field: "params".to_string(),
        expected: "object",
        actual: "array",
    }));
}

/// Verifies unknown keys are warnings and do not block the record.
#[test]
fn unknown_fields_are_warnings() {
    let set = candidates(vec![record(
        "t1",
        json!({"db": "d", "sql": "select 1", "result": null, "retries": 3}),
    )]);
    let validation = Validator::new(&set).validate_schema(&set[&TestId::new("t1")]);
    assert_eq!(
        validation.issues,
        vec![ValidationIssue::UnknownField {
            field: "retries".to_string()
        }]
    );
    assert!(validation.is_runnable());
    assert!(build_test_case(&validation.resolved).is_ok());
}

// ============================================================================
// SECTION: Inheritance
// ============================================================================

/// Verifies a child inherits missing fields from its parent.
#[test]
fn child_inherits_parent_fields() {
    let child = record("t2", json!({"parent": "t1", "params": {}}));
    let set = candidates(vec![base(), child]);
    let validation = Validator::new(&set).validate_schema(&set[&TestId::new("t2")]);
    assert!(validation.issues.is_empty(), "{:?}", validation.issues);
    let resolved = validation.resolved;
    assert_eq!(resolved.id, TestId::new("t2"));
    assert_eq!(resolved.sql, Some(json!("select 1 as x")));
    assert_eq!(resolved.parent, None);
    assert_eq!(set[&TestId::new("t2")].parent, Some(json!("t1")), "candidates stay unresolved");
}

/// Verifies params are merged key by key with the child winning.
#[test]
fn params_are_deep_merged() {
    let parent = record(
        "p",
        json!({"db": "d", "sql": "select :a, :b", "result": null, "params": {"a": 1, "b": 2}}),
    );
    let child = record("c", json!({"parent": "p", "params": {"b": 20, "c": 30}}));
    let merged = resolve_inheritance(&parent, &child);
    assert_eq!(merged.params, Some(json!({"a": 1, "b": 20, "c": 30})));
}

/// Verifies a missing parent is reported.
#[test]
fn missing_parent_is_reported() {
    let issues = issues_for(vec![record("t2", json!({"parent": "nope"}))], "t2");
    assert_eq!(
        issues,
        vec![ValidationIssue::MissingParent {
            parent: "nope".to_string()
        }]
    );
}

/// Verifies two-hop parent chains are rejected, not flattened.
#[test]
fn multi_level_inheritance_is_rejected() {
    let records = vec![
        base(),
        record("t2", json!({"parent": "t1"})),
        record("t3", json!({"parent": "t2"})),
    ];
    let issues = issues_for(records, "t3");
    assert_eq!(
        issues,
        vec![ValidationIssue::MultiLevelInheritance {
            parent: "t2".to_string(),
            grandparent: "t1".to_string(),
        }]
    );
}

/// Verifies required fields are re-checked after inheritance.
#[test]
fn inherited_record_still_needs_required_fields() {
    let records = vec![
        record("p", json!({"db": "d", "sql": "select 1"})),
        record("c", json!({"parent": "p"})),
    ];
    let issues = issues_for(records, "c");
    assert_eq!(
        issues,
        vec![ValidationIssue::MissingInheritedField {
            field: "result".to_string(),
            parent: "p".to_string(),
        }]
    );
}

// ============================================================================
// SECTION: Custom Checks
// ============================================================================

/// Verifies unsupplied placeholders are reported.
#[test]
fn missing_parameter_is_reported() {
    let issues = issues_for(
        vec![record(
            "t1",
            json!({"db": "d", "sql": "select * from t where id = :id and k = :k", "result": null, "params": {"id": 1}}),
        )],
        "t1",
    );
    assert_eq!(
        issues,
        vec![ValidationIssue::MissingParameter {
            name: "k".to_string()
        }]
    );
}

/// Verifies globally supplied parameters satisfy placeholders.
#[test]
fn global_params_satisfy_placeholders() {
    let set = candidates(vec![record(
        "t1",
        json!({"db": "d", "sql": "select :tenant", "result": null, "params": {}}),
    )]);
    let validator = Validator::new(&set).with_global_params(["tenant"]);
    assert!(validator.validate_schema(&set[&TestId::new("t1")]).issues.is_empty());
}

/// Verifies expected_exception and check_sql are mutually exclusive.
#[test]
fn expected_exception_with_check_sql_is_rejected() {
    let issues = issues_for(
        vec![record(
            "t1",
            json!({"db": "d", "sql": "select 1", "check_sql": "select 2", "result": null, "expected_exception": "boom"}),
        )],
        "t1",
    );
    assert_eq!(issues, vec![ValidationIssue::ExpectedExceptionWithCheckSql]);
}

/// Verifies a child adding check_sql to a parent with expected_exception is rejected.
#[test]
fn inherited_expected_exception_conflicts_with_child_check_sql() {
    let records = vec![
        record("p", json!({"db": "d", "sql": "select 1/0", "result": null, "expected_exception": "zero"})),
        record("c", json!({"parent": "p", "check_sql": "select 2"})),
    ];
    let set = candidates(records);
    let validation = Validator::new(&set).validate_schema(&set[&TestId::new("c")]);
    let case = build_test_case(&validation.resolved);
    assert!(case.is_err());
}

/// Verifies invalid regular expressions are rejected.
#[test]
fn invalid_pattern_is_rejected() {
    let issues = issues_for(
        vec![record("t1", json!({"db": "d", "sql": "select 1", "result": null, "expected_exception": "(unclosed"}))],
        "t1",
    );
    assert!(matches!(issues.as_slice(), [ValidationIssue::InvalidPattern { .. }]));
}

/// Verifies the built case carries typed fields and the display name.
#[test]
fn build_test_case_produces_typed_fields() {
    let rec = record(
        "07",
        json!({"name": "insert user", "db": "d", "sql": "insert into u values (:id)", "result": null, "params": {"id": 5}, "cleanup": "delete from u"}),
    );
    let case = build_test_case(&rec).expect("case");
    assert_eq!(case.display_name(), "07. insert user");
    assert_eq!(case.params.get("id"), Some(&json!(5)));
    assert_eq!(case.cleanup.as_deref(), Some("delete from u"));
    assert_eq!(case.expected_value(), Value::Null);
}
