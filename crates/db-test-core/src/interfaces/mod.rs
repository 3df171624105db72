// crates/db-test-core/src/interfaces/mod.rs
// ============================================================================
// Module: db-test Interfaces
// Description: Backend-agnostic interfaces for database access and reporting.
// Purpose: Define the contract surfaces consumed by the db-test runtime.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! The runtime never talks to a database or a terminal directly. It consumes a
//! [`DatabaseGateway`] for named-connection SQL execution and a
//! [`RunReporter`] for structured events. Execution failures are returned as
//! values, so expected-exception handling is a predicate over
//! [`ExecutionError`] rather than caught control flow.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use thiserror::Error;

use crate::core::DbName;
use crate::core::Params;
use crate::core::Row;
use crate::core::RunEvent;

// ============================================================================
// SECTION: Database Gateway
// ============================================================================

/// Rows returned by a statement; `None` when there is no row to report.
pub type QueryOutput = Option<Vec<Row>>;

/// Classification of execution failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionErrorKind {
    /// The logical database has no live connection.
    UnknownDatabase,
    /// The database rejected or failed the statement.
    Statement,
    /// The connection itself failed.
    Connection,
}

/// Failure of a single gateway call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ExecutionError {
    /// Failure classification.
    pub kind: ExecutionErrorKind,
    /// Diagnostic message as reported by the database.
    pub message: String,
    /// Statement text, when one was being executed.
    pub statement: Option<String>,
}

impl ExecutionError {
    /// Creates an error for a database without a live connection.
    #[must_use]
    pub fn unknown_database(db: &DbName) -> Self {
        Self {
            kind: ExecutionErrorKind::UnknownDatabase,
            message: format!("no live connection for database '{db}'"),
            statement: None,
        }
    }

    /// Creates an error for a failed statement.
    #[must_use]
    pub fn statement(message: impl Into<String>, statement: impl Into<String>) -> Self {
        Self {
            kind: ExecutionErrorKind::Statement,
            message: message.into(),
            statement: Some(statement.into()),
        }
    }

    /// Creates an error for a failed connection.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self {
            kind: ExecutionErrorKind::Connection,
            message: message.into(),
            statement: None,
        }
    }
}

/// Named-connection SQL execution capability.
///
/// Each `execute` call is its own commit/rollback unit; the gateway holds no
/// transaction open between calls.
pub trait DatabaseGateway {
    /// Returns the logical names of all live connections, sorted.
    fn live_databases(&self) -> Vec<DbName>;

    /// Returns true when `db` names a live connection.
    fn is_live(&self, db: &DbName) -> bool {
        self.live_databases().contains(db)
    }

    /// Returns the physical name backing a logical database.
    fn physical_name(&self, db: &DbName) -> Option<String>;

    /// Executes a statement with named parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError`] when the database is unknown or the statement fails.
    fn execute(
        &self,
        db: &DbName,
        statement: &str,
        params: &Params,
    ) -> Result<QueryOutput, ExecutionError>;
}

// ============================================================================
// SECTION: Run Reporter
// ============================================================================

/// Sink for structured run events.
pub trait RunReporter {
    /// Records an event. Sinks must not fail the run.
    fn record(&self, event: &RunEvent);
}
