// crates/db-test-core/src/runtime/mod.rs
// ============================================================================
// Module: db-test Runtime
// Description: Validation, registration, execution, diffing, and run loop.
// Purpose: Resolve declarative tests and execute them against a gateway.
// Dependencies: crate::{core, interfaces}, regex, similar
// ============================================================================

//! ## Overview
//! Data flows from raw records through the [`TestRegistry`] (which drives the
//! [`Validator`] and inheritance resolution) into ordered [`TestCase`] values,
//! then through the [`RunOrchestrator`] and [`TestExecutor`]. The differ is
//! only consulted to explain mismatches.
//!
//! [`TestCase`]: crate::core::TestCase

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod differ;
pub mod executor;
pub mod orchestrator;
pub mod placeholders;
pub mod registry;
pub mod reporting;
pub mod validator;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use differ::render_diff;
pub use executor::ExecutionStage;
pub use executor::SkipReason;
pub use executor::TestExecutor;
pub use executor::TestFailure;
pub use executor::TestOutcome;
pub use executor::TestReport;
pub use executor::output_value;
pub use orchestrator::RunOptions;
pub use orchestrator::RunOrchestrator;
pub use orchestrator::RunSummary;
pub use placeholders::named_placeholders;
pub use registry::BrokenTest;
pub use registry::DuplicateId;
pub use registry::RecordWarnings;
pub use registry::Registration;
pub use registry::RegistryError;
pub use registry::TestRegistry;
pub use registry::register;
pub use reporting::JsonLinesReporter;
pub use reporting::NoopReporter;
pub use validator::Validation;
pub use validator::Validator;
pub use validator::build_test_case;
pub use validator::resolve_inheritance;
