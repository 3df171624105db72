// crates/db-test-store-sqlite/src/lib.rs
// ============================================================================
// Module: db-test SQLite Gateway
// Description: SQLite-backed DatabaseGateway for test runs.
// Purpose: Provide ephemeral, script-populated databases to the test runner.
// Dependencies: db-test-core, rusqlite, serde, serde_json, thiserror, time
// ============================================================================

//! ## Overview
//! Implements [`db_test_core::DatabaseGateway`] on top of `SQLite` files
//! created for a single run. Setup scripts are discovered per database,
//! statements run in per-call transactions, and teardown removes the files
//! unless they are kept for inspection.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod convert;
pub mod gateway;
pub mod scripts;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::SqliteGatewayConfig;
pub use config::SqliteJournalMode;
pub use config::SqliteSyncMode;
pub use gateway::DatabaseSpec;
pub use gateway::SqliteGateway;
pub use gateway::SqliteGatewayError;
pub use scripts::ScriptBatch;
pub use scripts::ScriptSection;
pub use scripts::setup_batches;
