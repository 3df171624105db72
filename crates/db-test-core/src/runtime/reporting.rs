// crates/db-test-core/src/runtime/reporting.rs
// ============================================================================
// Module: db-test Reporters
// Description: Built-in run event sinks.
// Purpose: Provide machine-readable and no-op reporters.
// Dependencies: serde_json, std
// ============================================================================

//! ## Overview
//! `JsonLinesReporter` writes one JSON object per event and flushes after
//! each line so long runs stream. `NoopReporter` discards everything.
//! Reporter failures never fail the run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;

use crate::core::RunEvent;
use crate::interfaces::RunReporter;

// ============================================================================
// SECTION: JSON Lines Reporter
// ============================================================================

/// JSON-lines event sink.
pub struct JsonLinesReporter<W: Write + Send> {
    /// Output writer for event records.
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesReporter<W> {
    /// Creates a reporter over a writer.
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the reporter and returns the writer.
    pub fn into_inner(self) -> Option<W> {
        self.writer.into_inner().ok()
    }
}

impl<W: Write + Send> RunReporter for JsonLinesReporter<W> {
    fn record(&self, event: &RunEvent) {
        let Ok(mut guard) = self.writer.lock() else {
            return;
        };
        if serde_json::to_writer(&mut *guard, event).is_ok() {
            let _ = guard.write_all(b"\n");
            let _ = guard.flush();
        }
        drop(guard);
    }
}

// ============================================================================
// SECTION: No-op Reporter
// ============================================================================

/// Reporter that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl RunReporter for NoopReporter {
    fn record(&self, _event: &RunEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================
