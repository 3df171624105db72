// crates/db-test-cli/src/lib.rs
// ============================================================================
// Module: db-test CLI Library
// Description: Shared helpers for the db-test command-line interface.
// Purpose: Provide the suite flow and terminal presentation to the binary and tests.
// Dependencies: colored, db-test-authoring, db-test-config, db-test-core, db-test-store-sqlite
// ============================================================================

//! ## Overview
//! The binary entry point (`src/main.rs`) parses arguments and merges them
//! into the loaded configuration. Everything after that lives here: the
//! suite flow in [`suite`] and the terminal event formatter in [`terminal`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod suite;
pub mod terminal;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use suite::EXIT_FAILURE;
pub use suite::EXIT_NO_RUNNABLE_TESTS;
pub use suite::EXIT_SUCCESS;
pub use suite::RunSettings;
pub use suite::SuiteError;
pub use suite::run_suite;
pub use suite::summary_exit_code;
pub use terminal::TerminalReporter;
