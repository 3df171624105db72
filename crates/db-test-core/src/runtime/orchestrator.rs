// crates/db-test-core/src/runtime/orchestrator.rs
// ============================================================================
// Module: db-test Run Orchestrator
// Description: Sequential run loop over validated test cases.
// Purpose: Execute cases in order, stream verdicts, and aggregate counts.
// Dependencies: crate::core, crate::interfaces, crate::runtime::executor
// ============================================================================

//! ## Overview
//! Cases run strictly in the order given, one at a time, because they share
//! mutable database state. Each verdict is reported as soon as it is known.
//! An optional breakpoint stops the run before a named case; cases after the
//! breakpoint are neither run nor counted. Result-mismatch diffs are always
//! attached; error text and skip detail only in verbose mode.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::Params;
use crate::core::RunEvent;
use crate::core::Severity;
use crate::core::TestCase;
use crate::core::TestId;
use crate::interfaces::DatabaseGateway;
use crate::interfaces::RunReporter;
use crate::runtime::executor::TestExecutor;
use crate::runtime::executor::TestFailure;
use crate::runtime::executor::TestOutcome;
use crate::runtime::executor::TestReport;

// ============================================================================
// SECTION: Options and Summary
// ============================================================================

/// Run-level options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Attach error and skip detail to outcome events.
    pub verbose: bool,
    /// Stop before running this case.
    pub break_before: Option<TestId>,
}

/// Aggregated run counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Cases that passed (including matched exceptions).
    pub passed: usize,
    /// Cases that failed.
    pub failed: usize,
    /// Cases skipped because their database was not live.
    pub skipped: usize,
    /// Breakpoint the run stopped at, when reached.
    pub stopped_before: Option<TestId>,
    /// Every verdict in run order.
    pub reports: Vec<TestReport>,
}

impl RunSummary {
    /// Returns the number of cases that did not pass.
    #[must_use]
    pub const fn failed_count(&self) -> usize {
        self.failed + self.skipped
    }

    /// Returns the number of cases executed or skipped.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    /// Returns true when every case passed.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed_count() == 0
    }
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Drives a run over a gateway and a reporter.
pub struct RunOrchestrator<'a, G: ?Sized, R: ?Sized> {
    /// Gateway shared by every case.
    gateway: &'a G,
    /// Event sink.
    reporter: &'a R,
    /// Run options.
    options: RunOptions,
    /// Parameters supplied to every statement.
    global_params: Params,
}

impl<'a, G, R> RunOrchestrator<'a, G, R>
where
    G: DatabaseGateway + ?Sized,
    R: RunReporter + ?Sized,
{
    /// Creates an orchestrator.
    #[must_use]
    pub fn new(gateway: &'a G, reporter: &'a R, options: RunOptions) -> Self {
        Self {
            gateway,
            reporter,
            options,
            global_params: Params::new(),
        }
    }

    /// Sets parameters supplied to every statement.
    #[must_use]
    pub fn with_global_params(mut self, params: Params) -> Self {
        self.global_params = params;
        self
    }

    /// Runs every case in order and reports a summary.
    pub fn run(&self, cases: &[TestCase]) -> RunSummary {
        let executor = TestExecutor::new(self.gateway).with_global_params(self.global_params.clone());
        let mut summary = RunSummary::default();

        for case in cases {
            if self.options.break_before.as_ref() == Some(&case.id) {
                self.reporter.record(&RunEvent::lifecycle(
                    Severity::Info,
                    format!("stopping before test {}", case.id),
                ));
                summary.stopped_before = Some(case.id.clone());
                break;
            }

            let report = executor.execute(case);
            match &report.outcome {
                TestOutcome::Passed | TestOutcome::ExceptionMatched => summary.passed += 1,
                TestOutcome::Failed(_) => summary.failed += 1,
                TestOutcome::Skipped(_) => summary.skipped += 1,
            }
            self.reporter.record(&self.outcome_event(&report));
            summary.reports.push(report);
        }

        self.reporter.record(&summary_event(&summary, self.options.verbose));
        summary
    }

    /// Builds the streaming event for one verdict.
    fn outcome_event(&self, report: &TestReport) -> RunEvent {
        let (severity, message, detail) = match &report.outcome {
            TestOutcome::Passed => (Severity::Success, format!("{} passed", report.display_name), None),
            TestOutcome::ExceptionMatched => (
                Severity::Success,
                format!("{} passed (expected exception)", report.display_name),
                None,
            ),
            TestOutcome::Failed(failure) => (
                Severity::Failure,
                format!("{} failed{}", report.display_name, failure_suffix(failure)),
                Some(failure.describe()),
            ),
            TestOutcome::Skipped(reason) => {
                let available = reason
                    .available
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                (
                    Severity::Warning,
                    format!(
                        "{} skipped: database '{}' is not available",
                        report.display_name, reason.db
                    ),
                    Some(format!("live databases: [{available}]")),
                )
            }
        };
        let always_shown =
            matches!(&report.outcome, TestOutcome::Failed(TestFailure::Mismatch { .. }));
        let detail = if self.options.verbose || always_shown { detail } else { None };
        RunEvent::outcome(report.test_id.clone(), severity, message, detail)
    }
}

/// Returns a short qualifier for a failure.
fn failure_suffix(failure: &TestFailure) -> String {
    match failure {
        TestFailure::Execution {
            stage, ..
        } => format!(" ({stage} error)"),
        TestFailure::Mismatch {
            ..
        } => " (result mismatch)".to_string(),
        TestFailure::Cleanup {
            ..
        } => " (cleanup error)".to_string(),
    }
}

/// Builds the end-of-run summary event.
fn summary_event(summary: &RunSummary, verbose: bool) -> RunEvent {
    let failed = summary.failed_count();
    if failed == 0 {
        return RunEvent::summary(
            Severity::Success,
            format!("all {} tests passed", summary.passed),
        );
    }
    let hint = if verbose { "" } else { "; rerun with --verbose for details" };
    RunEvent::summary(
        Severity::Failure,
        format!("{failed} of {} tests failed{hint}", summary.total()),
    )
}
