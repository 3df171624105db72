// crates/db-test-core/src/runtime/executor.rs
// ============================================================================
// Module: db-test Test Case Executor
// Description: Runs one validated test case against the database gateway.
// Purpose: Turn SQL execution results into pass/fail/skip verdicts.
// Dependencies: crate::core, crate::interfaces, crate::runtime::differ
// ============================================================================

//! ## Overview
//! Each case moves through `sql`, an optional `check_sql`, evaluation, and an
//! optional `cleanup`. The executor holds no transaction state between steps;
//! every statement is its own commit/rollback unit inside the gateway.
//!
//! Execution errors arrive as values. When `expected_exception` is set, a
//! matching error message short-circuits to a pass; anything else fails the
//! case without running later statements. Cleanup only runs after a pass,
//! and a failing cleanup turns the pass into a failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::core::DbName;
use crate::core::Params;
use crate::core::TestCase;
use crate::core::TestId;
use crate::interfaces::DatabaseGateway;
use crate::interfaces::ExecutionError;
use crate::interfaces::QueryOutput;
use crate::runtime::differ::render_diff;

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Statement slot that produced an execution error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStage {
    /// The statement under test.
    Sql,
    /// The verification statement.
    CheckSql,
    /// The cleanup statement.
    Cleanup,
}

impl ExecutionStage {
    /// Returns the record field name for the stage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sql => "sql",
            Self::CheckSql => "check_sql",
            Self::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for ExecutionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason a case failed.
#[derive(Debug, Clone, PartialEq)]
pub enum TestFailure {
    /// A statement failed and no expected-exception pattern absorbed it.
    Execution {
        /// Statement slot that failed.
        stage: ExecutionStage,
        /// Error reported by the gateway.
        error: ExecutionError,
        /// Pattern that did not match, when one was declared.
        expected_exception: Option<String>,
    },
    /// The actual result differs from the expected result.
    Mismatch {
        /// Expected value (result or expected-exception sentinel).
        expected: Value,
        /// Actual value.
        actual: Value,
        /// Rendered line diff.
        diff: String,
    },
    /// The case passed but its cleanup statement failed.
    Cleanup {
        /// Error reported by the gateway.
        error: ExecutionError,
    },
}

impl TestFailure {
    /// Returns a multi-line description for verbose reports.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Execution {
                stage,
                error,
                expected_exception,
            } => {
                let mut text = format!("{stage} failed: {}", error.message);
                if let Some(pattern) = expected_exception {
                    text.push_str(&format!("\nexpected exception pattern: {pattern}"));
                }
                if let Some(statement) = &error.statement {
                    text.push_str(&format!("\nstatement: {statement}"));
                }
                text
            }
            Self::Mismatch {
                diff, ..
            } => format!("result mismatch\n{diff}"),
            Self::Cleanup {
                error,
            } => format!("cleanup failed: {}", error.message),
        }
    }
}

/// Why a case was not run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipReason {
    /// Database the case targets.
    pub db: DbName,
    /// Databases that were live.
    pub available: Vec<DbName>,
}

/// Terminal outcome of one case.
#[derive(Debug, Clone, PartialEq)]
pub enum TestOutcome {
    /// Actual result matched.
    Passed,
    /// The statement failed with an error matching `expected_exception`.
    ExceptionMatched,
    /// The case failed.
    Failed(TestFailure),
    /// The target database has no live connection.
    Skipped(SkipReason),
}

impl TestOutcome {
    /// Returns true for `Passed` and `ExceptionMatched`.
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Passed | Self::ExceptionMatched)
    }

    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::ExceptionMatched => "exception_matched",
            Self::Failed(_) => "failed",
            Self::Skipped(_) => "skipped",
        }
    }
}

/// Verdict for one executed case.
#[derive(Debug, Clone, PartialEq)]
pub struct TestReport {
    /// Test identifier.
    pub test_id: TestId,
    /// Display name used in reports.
    pub display_name: String,
    /// Terminal outcome.
    pub outcome: TestOutcome,
}

// ============================================================================
// SECTION: Executor
// ============================================================================

/// Executes cases through a database gateway.
pub struct TestExecutor<'a, G: ?Sized> {
    /// Gateway used for every statement.
    gateway: &'a G,
    /// Parameters available to every statement; case parameters win.
    global_params: Params,
}

impl<'a, G: DatabaseGateway + ?Sized> TestExecutor<'a, G> {
    /// Creates an executor over a gateway.
    #[must_use]
    pub fn new(gateway: &'a G) -> Self {
        Self {
            gateway,
            global_params: Params::new(),
        }
    }

    /// Sets parameters supplied to every statement.
    #[must_use]
    pub fn with_global_params(mut self, params: Params) -> Self {
        self.global_params = params;
        self
    }

    /// Runs one case to its terminal outcome.
    #[must_use]
    pub fn execute(&self, case: &TestCase) -> TestReport {
        TestReport {
            test_id: case.id.clone(),
            display_name: case.display_name(),
            outcome: self.run(case),
        }
    }

    /// Drives the per-case state machine.
    fn run(&self, case: &TestCase) -> TestOutcome {
        if !self.gateway.is_live(&case.db) {
            return TestOutcome::Skipped(SkipReason {
                db: case.db.clone(),
                available: self.gateway.live_databases(),
            });
        }

        let params = self.merged_params(&case.params);
        let mut exception_matched = false;
        let mut actual = Value::Null;

        match self.gateway.execute(&case.db, &case.sql, &params) {
            Ok(output) => actual = output_value(output),
            Err(error) => match absorb(case, ExecutionStage::Sql, error) {
                Ok(()) => exception_matched = true,
                Err(failure) => return TestOutcome::Failed(failure),
            },
        }

        if !exception_matched && let Some(check_sql) = &case.check_sql {
            match self.gateway.execute(&case.db, check_sql, &params) {
                Ok(output) => actual = output_value(output),
                Err(error) => match absorb(case, ExecutionStage::CheckSql, error) {
                    Ok(()) => exception_matched = true,
                    Err(failure) => return TestOutcome::Failed(failure),
                },
            }
        }

        let outcome = if exception_matched {
            TestOutcome::ExceptionMatched
        } else {
            let expected = case.expected_value();
            if expected == actual {
                TestOutcome::Passed
            } else {
                let diff = render_diff(&expected, &actual);
                return TestOutcome::Failed(TestFailure::Mismatch {
                    expected,
                    actual,
                    diff,
                });
            }
        };

        if let Some(cleanup) = &case.cleanup
            && let Err(error) = self.gateway.execute(&case.db, cleanup, &params)
        {
            return TestOutcome::Failed(TestFailure::Cleanup {
                error,
            });
        }
        outcome
    }

    /// Overlays case parameters on the global parameters.
    fn merged_params(&self, params: &Params) -> Params {
        if self.global_params.is_empty() {
            return params.clone();
        }
        let mut merged: BTreeMap<&String, &Value> = self.global_params.iter().collect();
        merged.extend(params.iter());
        merged.into_iter().map(|(key, value)| (key.clone(), value.clone())).collect()
    }
}

/// Applies the expected-exception predicate to an execution error.
fn absorb(case: &TestCase, stage: ExecutionStage, error: ExecutionError) -> Result<(), TestFailure> {
    match &case.expected_exception {
        Some(expected) if expected.matches(&error.message) => Ok(()),
        expected => Err(TestFailure::Execution {
            stage,
            error,
            expected_exception: expected.as_ref().map(|expected| expected.pattern().to_string()),
        }),
    }
}

/// Converts gateway output into the comparable actual value.
///
/// No output and an empty row set both compare as `null`.
#[must_use]
pub fn output_value(output: QueryOutput) -> Value {
    match output {
        None => Value::Null,
        Some(rows) if rows.is_empty() => Value::Null,
        Some(rows) => Value::Array(rows.into_iter().map(Value::Object).collect()),
    }
}
