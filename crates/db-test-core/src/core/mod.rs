// crates/db-test-core/src/core/mod.rs
// ============================================================================
// Module: db-test Core Types
// Description: Identifiers, records, schema, validation issues, and events.
// Purpose: Provide the data model shared by every db-test crate.
// Dependencies: regex, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Core types describe declarative test records before and after validation,
//! the schema they are checked against, and the structured events emitted
//! while a run progresses.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod identifiers;
pub mod record;
pub mod report;
pub mod schema;
pub mod validation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use identifiers::DbName;
pub use identifiers::TestId;
pub use record::ExpectedException;
pub use record::Params;
pub use record::Row;
pub use record::TestCase;
pub use record::TestRecord;
pub use report::EventKind;
pub use report::RunEvent;
pub use report::Severity;
pub use schema::CustomCheck;
pub use schema::FieldKind;
pub use schema::FieldSpec;
pub use schema::TEST_SCHEMA;
pub use validation::IssueSeverity;
pub use validation::ValidationIssue;
