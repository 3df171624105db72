// crates/db-test-authoring/src/format.rs
// ============================================================================
// Module: Test Source Formats
// Description: Supported test source formats and their parsers.
// Purpose: Parse any supported source file into a JSON value.
// Dependencies: ron, serde_json, serde_yaml, toml
// ============================================================================

//! ## Overview
//! JSON is the reference format. RON, TOML, and YAML are accepted for
//! hand-written suites and parsed into the same `serde_json::Value` tree, so
//! every later stage sees one shape. TOML has no null; a test expecting no
//! rows must be written in another format.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::path::Path;

use serde_json::Value;

// ============================================================================
// SECTION: Formats
// ============================================================================

/// Supported test source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// JSON source.
    Json,
    /// RON source.
    Ron,
    /// TOML source.
    Toml,
    /// YAML source.
    Yaml,
}

impl SourceFormat {
    /// Returns the lowercase label for the format.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Ron => "ron",
            Self::Toml => "toml",
            Self::Yaml => "yaml",
        }
    }

    /// Parses a format from a file extension.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "ron" => Some(Self::Ron),
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

/// Detects the source format from a file path.
#[must_use]
pub fn detect_format(path: &Path) -> Option<SourceFormat> {
    path.extension()
        .and_then(|extension| extension.to_str())
        .and_then(SourceFormat::from_extension)
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Parses source text into a JSON value.
///
/// # Errors
///
/// Returns the parser's error message when the input is malformed.
pub fn parse_value(input: &str, format: SourceFormat) -> Result<Value, String> {
    match format {
        SourceFormat::Json => serde_json::from_str(input).map_err(|err| err.to_string()),
        SourceFormat::Ron => ron::from_str(input).map_err(|err| err.to_string()),
        SourceFormat::Toml => toml::from_str(input).map_err(|err| err.to_string()),
        SourceFormat::Yaml => serde_yaml::from_str(input).map_err(|err| err.to_string()),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
