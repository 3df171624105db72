// crates/db-test-core/src/core/report.rs
// ============================================================================
// Module: db-test Run Events
// Description: Structured events emitted while loading and running tests.
// Purpose: Keep the core free of presentation concerns.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every user-visible line is a [`RunEvent`]: a severity, a kind, a short
//! message, and optional detail. Sinks decide how to render them; the core
//! never formats colors or writes to a terminal.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::core::identifiers::TestId;

// ============================================================================
// SECTION: Event Types
// ============================================================================

/// Event severity used by sinks to pick a presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Progress information.
    Info,
    /// Something passed.
    Success,
    /// Something was skipped or looks suspicious.
    Warning,
    /// Something failed.
    Failure,
}

impl Severity {
    /// Returns a stable label for the severity.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Failure => "failure",
        }
    }
}

/// Event classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Loading, setup, and teardown progress.
    Lifecycle,
    /// Validation finding for one record.
    ValidationIssue,
    /// Verdict for one executed test.
    TestOutcome,
    /// End-of-run summary.
    Summary,
}

/// Structured run event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunEvent {
    /// Event classification.
    pub kind: EventKind,
    /// Event severity.
    pub severity: Severity,
    /// Test the event refers to, when any.
    pub test_id: Option<TestId>,
    /// Short, single-line message.
    pub message: String,
    /// Optional multi-line detail (errors, statements, diffs).
    pub detail: Option<String>,
}

impl RunEvent {
    /// Creates a lifecycle event.
    #[must_use]
    pub fn lifecycle(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Lifecycle,
            severity,
            test_id: None,
            message: message.into(),
            detail: None,
        }
    }

    /// Creates a validation event for a record.
    #[must_use]
    pub fn validation(
        test_id: TestId,
        severity: Severity,
        message: impl Into<String>,
        detail: Option<String>,
    ) -> Self {
        Self {
            kind: EventKind::ValidationIssue,
            severity,
            test_id: Some(test_id),
            message: message.into(),
            detail,
        }
    }

    /// Creates a test outcome event.
    #[must_use]
    pub fn outcome(
        test_id: TestId,
        severity: Severity,
        message: impl Into<String>,
        detail: Option<String>,
    ) -> Self {
        Self {
            kind: EventKind::TestOutcome,
            severity,
            test_id: Some(test_id),
            message: message.into(),
            detail,
        }
    }

    /// Creates a summary event.
    #[must_use]
    pub fn summary(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Summary,
            severity,
            test_id: None,
            message: message.into(),
            detail: None,
        }
    }
}
