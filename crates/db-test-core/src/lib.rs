// crates/db-test-core/src/lib.rs
// ============================================================================
// Module: db-test Core Library
// Description: Public API surface for the db-test core.
// Purpose: Expose core types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! db-test core resolves declarative database tests and runs them. Test
//! definitions are data records; the core validates them against a fixed
//! schema, resolves single-level inheritance, executes each case through a
//! [`DatabaseGateway`], and reports structured events to a [`RunReporter`].
//! It never opens a connection or writes to a terminal itself.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::DatabaseGateway;
pub use interfaces::ExecutionError;
pub use interfaces::ExecutionErrorKind;
pub use interfaces::QueryOutput;
pub use interfaces::RunReporter;
pub use runtime::BrokenTest;
pub use runtime::ExecutionStage;
pub use runtime::JsonLinesReporter;
pub use runtime::NoopReporter;
pub use runtime::Registration;
pub use runtime::RegistryError;
pub use runtime::RunOptions;
pub use runtime::RunOrchestrator;
pub use runtime::RunSummary;
pub use runtime::SkipReason;
pub use runtime::TestExecutor;
pub use runtime::TestFailure;
pub use runtime::TestOutcome;
pub use runtime::TestRegistry;
pub use runtime::TestReport;
pub use runtime::Validator;
pub use runtime::register;
pub use runtime::render_diff;
