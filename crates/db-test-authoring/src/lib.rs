// crates/db-test-authoring/src/lib.rs
// ============================================================================
// Module: db-test Authoring Library
// Description: Test source discovery and parsing.
// Purpose: Turn test definition files into raw records for the registry.
// Dependencies: db-test-core, ron, serde_json, serde_yaml, toml, walkdir
// ============================================================================

//! ## Overview
//! Test definitions are data files. This crate finds them under a test
//! directory, parses JSON, RON, TOML, or YAML into one value shape, and
//! produces [`db_test_core::TestRecord`] values tagged with their source
//! path. Validation happens later, in the core registry.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod format;
pub mod loader;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use format::SourceFormat;
pub use format::detect_format;
pub use loader::AuthoringError;
pub use loader::LoadedSources;
pub use loader::load_source_file;
pub use loader::load_test_sources;
pub use loader::parse_source;
