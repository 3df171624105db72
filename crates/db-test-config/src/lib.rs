// crates/db-test-config/src/lib.rs
// ============================================================================
// Module: db-test Config Library
// Description: Canonical config model and validation for db-test.toml.
// Purpose: Single source of truth for run configuration semantics.
// Dependencies: db-test-core, db-test-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `db-test-config` defines the `db-test.toml` model: the test directory,
//! run options, logical databases, `SQLite` gateway settings, and global
//! parameters. Loading is strict: size, encoding, and path limits are
//! enforced before parsing, and unknown keys are rejected.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
