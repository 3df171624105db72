// crates/db-test-core/tests/executor.rs
// ============================================================================
// Module: Test Case Executor Tests
// Description: Tests for per-case execution outcomes.
// Purpose: Ensure SQL, check, expected-exception, and cleanup rules hold.
// Dependencies: db-test-core, serde_json
// ============================================================================
//! ## Overview
//! Drives `TestExecutor` against the scripted `FakeGateway`.

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

use common::FakeGateway;
use common::record;
use common::rows;
use db_test_core::ExecutionStage;
use db_test_core::Params;
use db_test_core::TestCase;
use db_test_core::TestExecutor;
use db_test_core::TestFailure;
use db_test_core::TestOutcome;
use db_test_core::runtime::build_test_case;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn case(fields: Value) -> TestCase {
    build_test_case(&record("t", fields)).expect("valid case")
}

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Verifies matching rows pass.
#[test]
fn matching_rows_pass() {
    let gateway = FakeGateway::with_databases(&["d"]).respond("select 1 as x", rows("x", &[json!(1)]));
    let report = TestExecutor::new(&gateway)
        .execute(&case(json!({"db": "d", "sql": "select 1 as x", "result": [{"x": 1}]})));
    assert_eq!(report.outcome, TestOutcome::Passed);
}

/// Verifies empty output compares equal to a null result.
#[test]
fn empty_rows_match_null() {
    let gateway = FakeGateway::with_databases(&["d"]).respond("delete from t", Some(Vec::new()));
    let report =
        TestExecutor::new(&gateway).execute(&case(json!({"db": "d", "sql": "delete from t", "result": null})));
    assert_eq!(report.outcome, TestOutcome::Passed);
}

/// Verifies a mismatch fails with a rendered diff.
#[test]
fn mismatch_fails_with_diff() {
    let gateway = FakeGateway::with_databases(&["d"]).respond("select 2 as x", rows("x", &[json!(2)]));
    let report = TestExecutor::new(&gateway)
        .execute(&case(json!({"db": "d", "sql": "select 2 as x", "result": [{"x": 1}]})));
    let TestOutcome::Failed(TestFailure::Mismatch {
        expected,
        actual,
        diff,
    }) = report.outcome
    else {
        panic!("expected mismatch, got {:?}", report.outcome);
    };
    assert_eq!(expected, json!([{"x": 1}]));
    assert_eq!(actual, json!([{"x": 2}]));
    assert!(diff.contains("--- expected"));
}

/// Verifies row order matters.
#[test]
fn row_order_is_significant() {
    let gateway =
        FakeGateway::with_databases(&["d"]).respond("select x", rows("x", &[json!(2), json!(1)]));
    let report = TestExecutor::new(&gateway)
        .execute(&case(json!({"db": "d", "sql": "select x", "result": [{"x": 1}, {"x": 2}]})));
    assert!(!report.outcome.is_pass());
}

/// Verifies check_sql output replaces the sql output.
#[test]
fn check_sql_result_is_compared() {
    let gateway = FakeGateway::with_databases(&["d"])
        .respond("insert into t values (1)", None)
        .respond("select count(*) as n from t", rows("n", &[json!(1)]));
    let report = TestExecutor::new(&gateway).execute(&case(json!({
        "db": "d",
        "sql": "insert into t values (1)",
        "check_sql": "select count(*) as n from t",
        "result": [{"n": 1}]
    })));
    assert_eq!(report.outcome, TestOutcome::Passed);
    assert_eq!(gateway.statements().len(), 2);
}

/// Verifies an unknown database is skipped without executing SQL.
#[test]
fn unknown_database_is_skipped() {
    let gateway = FakeGateway::with_databases(&["d"]);
    let report = TestExecutor::new(&gateway)
        .execute(&case(json!({"db": "missing", "sql": "select 1", "result": null})));
    let TestOutcome::Skipped(reason) = report.outcome else {
        panic!("expected skip");
    };
    assert_eq!(reason.db.as_str(), "missing");
    assert!(gateway.calls().is_empty());
}

/// Verifies a statement error fails and stops later statements.
#[test]
fn statement_error_fails_without_cleanup() {
    let gateway = FakeGateway::with_databases(&["d"]).fail("select boom", "no such column: boom");
    let report = TestExecutor::new(&gateway).execute(&case(json!({
        "db": "d",
        "sql": "select boom",
        "check_sql": "select 1",
        "result": null,
        "cleanup": "delete from t"
    })));
    let TestOutcome::Failed(TestFailure::Execution {
        stage,
        error,
        expected_exception,
    }) = report.outcome
    else {
        panic!("expected execution failure");
    };
    assert_eq!(stage, ExecutionStage::Sql);
    assert_eq!(error.message, "no such column: boom");
    assert_eq!(expected_exception, None);
    assert_eq!(gateway.statements(), vec!["select boom"]);
}

/// Verifies a check_sql error fails at the check stage and skips cleanup.
#[test]
fn check_sql_error_fails_without_cleanup() {
    let gateway = FakeGateway::with_databases(&["d"]).fail("select bad", "no such column: bad");
    let report = TestExecutor::new(&gateway).execute(&case(json!({
        "db": "d",
        "sql": "insert",
        "check_sql": "select bad",
        "result": null,
        "cleanup": "delete from t"
    })));
    let TestOutcome::Failed(TestFailure::Execution {
        stage,
        error,
        ..
    }) = report.outcome
    else {
        panic!("expected execution failure");
    };
    assert_eq!(stage, ExecutionStage::CheckSql);
    assert_eq!(error.message, "no such column: bad");
    assert_eq!(gateway.statements(), vec!["insert", "select bad"]);
}

// ============================================================================
// SECTION: Expected Exceptions
// ============================================================================

/// Verifies a matching error passes regardless of result.
#[test]
fn matching_exception_passes() {
    let gateway = FakeGateway::with_databases(&["d"]).fail("select 1/0", "division by zero");
    let report = TestExecutor::new(&gateway).execute(&case(json!({
        "db": "d",
        "sql": "select 1/0",
        "result": [{"ignored": true}],
        "expected_exception": "division by zero"
    })));
    assert_eq!(report.outcome, TestOutcome::ExceptionMatched);
    assert!(report.outcome.is_pass());
}

/// Verifies a non-matching error fails and reports both pattern and message.
#[test]
fn non_matching_exception_fails() {
    let gateway = FakeGateway::with_databases(&["d"]).fail("select 1/0", "integer overflow");
    let report = TestExecutor::new(&gateway).execute(&case(json!({
        "db": "d",
        "sql": "select 1/0",
        "result": null,
        "expected_exception": "division by zero"
    })));
    let TestOutcome::Failed(failure) = report.outcome else {
        panic!("expected failure");
    };
    let text = failure.describe();
    assert!(text.contains("integer overflow"));
    assert!(text.contains("division by zero"));
}

/// Verifies a statement that succeeds despite an expected exception fails.
#[test]
fn missing_exception_fails() {
    let gateway = FakeGateway::with_databases(&["d"]).respond("select 1", rows("x", &[json!(1)]));
    let report = TestExecutor::new(&gateway).execute(&case(json!({
        "db": "d",
        "sql": "select 1",
        "result": null,
        "expected_exception": "constraint"
    })));
    let TestOutcome::Failed(TestFailure::Mismatch {
        expected, ..
    }) = report.outcome
    else {
        panic!("expected mismatch");
    };
    assert_eq!(expected, json!("expected_exception: constraint"));
}

// ============================================================================
// SECTION: Cleanup
// ============================================================================

/// Verifies cleanup runs after a pass with the case params.
#[test]
fn cleanup_runs_after_pass() {
    let gateway = FakeGateway::with_databases(&["d"]);
    let report = TestExecutor::new(&gateway).execute(&case(json!({
        "db": "d",
        "sql": "insert into t values (:id)",
        "result": null,
        "params": {"id": 4},
        "cleanup": "delete from t where id = :id"
    })));
    assert_eq!(report.outcome, TestOutcome::Passed);
    let calls = gateway.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].statement, "delete from t where id = :id");
    assert_eq!(calls[1].params.get("id"), Some(&json!(4)));
}

/// Verifies cleanup failure converts a pass into a failure.
#[test]
fn cleanup_failure_fails_the_case() {
    let gateway = FakeGateway::with_databases(&["d"]).fail("delete from t", "database is locked");
    let report = TestExecutor::new(&gateway).execute(&case(json!({
        "db": "d",
        "sql": "insert into t values (1)",
        "result": null,
        "cleanup": "delete from t"
    })));
    let TestOutcome::Failed(TestFailure::Cleanup {
        error,
    }) = report.outcome
    else {
        panic!("expected cleanup failure");
    };
    assert_eq!(error.message, "database is locked");
}

/// Verifies cleanup does not run after a failure.
#[test]
fn cleanup_skipped_after_failure() {
    let gateway = FakeGateway::with_databases(&["d"]).respond("select 1", rows("x", &[json!(1)]));
    let _ = TestExecutor::new(&gateway).execute(&case(json!({
        "db": "d",
        "sql": "select 1",
        "result": null,
        "cleanup": "delete from t"
    })));
    assert_eq!(gateway.statements(), vec!["select 1"]);
}

/// Verifies global params are supplied and case params win.
#[test]
fn global_params_are_merged_under_case_params() {
    let gateway = FakeGateway::with_databases(&["d"]);
    let mut globals = Params::new();
    globals.insert("tenant".to_string(), json!("acme"));
    globals.insert("id".to_string(), json!(0));
    let _ = TestExecutor::new(&gateway).with_global_params(globals).execute(&case(json!({
        "db": "d",
        "sql": "select :tenant, :id",
        "result": null,
        "params": {"id": 9}
    })));
    let params = &gateway.calls()[0].params;
    assert_eq!(params.get("tenant"), Some(&json!("acme")));
    assert_eq!(params.get("id"), Some(&json!(9)));
}
