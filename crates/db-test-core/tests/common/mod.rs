// crates/db-test-core/tests/common/mod.rs
// ============================================================================
// Module: db-test Core Test Fixtures
// Description: In-memory gateway and reporter fixtures for core tests.
// Purpose: Exercise the runtime without a real database.
// Dependencies: db-test-core, serde_json
// ============================================================================

//! ## Overview
//! `FakeGateway` answers statements from a scripted table and records every
//! call it receives. `MemoryReporter` captures run events for assertions.

#![allow(
    dead_code,
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Shared fixtures are not used by every test binary."
)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Mutex;

use db_test_core::DatabaseGateway;
use db_test_core::DbName;
use db_test_core::ExecutionError;
use db_test_core::Params;
use db_test_core::QueryOutput;
use db_test_core::Row;
use db_test_core::RunEvent;
use db_test_core::RunReporter;
use db_test_core::TestRecord;
use serde_json::Value;

// ============================================================================
// SECTION: Records
// ============================================================================

/// Builds a record from a JSON object literal.
pub fn record(id: &str, fields: Value) -> TestRecord {
    let Value::Object(fields) = fields else {
        panic!("record fields must be an object");
    };
    TestRecord::from_fields(id, fields)
}

/// Builds a single-column row list.
pub fn rows(column: &str, values: &[Value]) -> QueryOutput {
    Some(
        values
            .iter()
            .map(|value| {
                let mut row = Row::new();
                row.insert(column.to_string(), value.clone());
                row
            })
            .collect(),
    )
}

// ============================================================================
// SECTION: Fake Gateway
// ============================================================================

/// One gateway call as observed by the fake.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// Logical database.
    pub db: String,
    /// Statement text.
    pub statement: String,
    /// Bound parameters.
    pub params: Params,
}

/// Scripted in-memory gateway.
#[derive(Default)]
pub struct FakeGateway {
    /// Live logical databases.
    live: Vec<DbName>,
    /// Scripted responses keyed by statement text.
    responses: BTreeMap<String, Result<QueryOutput, String>>,
    /// Calls observed so far.
    calls: RefCell<Vec<Call>>,
}

impl FakeGateway {
    /// Creates a gateway with the given live databases.
    pub fn with_databases(names: &[&str]) -> Self {
        let mut live: Vec<DbName> = names.iter().map(|name| DbName::new(*name)).collect();
        live.sort();
        Self {
            live,
            ..Self::default()
        }
    }

    /// Scripts a successful response.
    pub fn respond(mut self, statement: &str, output: QueryOutput) -> Self {
        self.responses.insert(statement.to_string(), Ok(output));
        self
    }

    /// Scripts a failing response.
    pub fn fail(mut self, statement: &str, message: &str) -> Self {
        self.responses.insert(statement.to_string(), Err(message.to_string()));
        self
    }

    /// Returns every call observed so far.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Returns the statements observed so far.
    pub fn statements(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|call| call.statement.clone()).collect()
    }
}

impl DatabaseGateway for FakeGateway {
    fn live_databases(&self) -> Vec<DbName> {
        self.live.clone()
    }

    fn physical_name(&self, db: &DbName) -> Option<String> {
        self.is_live(db).then(|| format!("{db}_test"))
    }

    fn execute(
        &self,
        db: &DbName,
        statement: &str,
        params: &Params,
    ) -> Result<QueryOutput, ExecutionError> {
        if !self.is_live(db) {
            return Err(ExecutionError::unknown_database(db));
        }
        self.calls.borrow_mut().push(Call {
            db: db.to_string(),
            statement: statement.to_string(),
            params: params.clone(),
        });
        match self.responses.get(statement) {
            Some(Ok(output)) => Ok(output.clone()),
            Some(Err(message)) => Err(ExecutionError::statement(message.clone(), statement)),
            None => Ok(None),
        }
    }
}

// ============================================================================
// SECTION: Memory Reporter
// ============================================================================

/// Reporter capturing events in memory.
#[derive(Default)]
pub struct MemoryReporter {
    /// Captured events.
    events: Mutex<Vec<RunEvent>>,
}

impl MemoryReporter {
    /// Returns the captured events.
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl RunReporter for MemoryReporter {
    fn record(&self, event: &RunEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
