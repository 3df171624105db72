// crates/db-test-core/src/core/validation.rs
// ============================================================================
// Module: db-test Validation Issues
// Description: Issues produced while validating test records.
// Purpose: Give every schema, inheritance, and custom-check finding a type.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Issues are data, not control flow: the validator accumulates them per
//! record and the registry partitions records on whether any issue has
//! [`IssueSeverity::Error`]. Unknown fields are warnings and never block a
//! record.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Severity
// ============================================================================

/// Severity of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    /// Reported, but the record may still run.
    Warning,
    /// The record is broken and will not run.
    Error,
}

// ============================================================================
// SECTION: Issues
// ============================================================================

/// Validation finding for a single test record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    /// Required field is missing on a record without a parent.
    #[error("required key '{field}' is not defined")]
    MissingField {
        /// Missing field name.
        field: String,
    },
    /// Required field is missing after inheriting from the parent.
    #[error("required key '{field}' is not defined after inheriting from '{parent}'")]
    MissingInheritedField {
        /// Missing field name.
        field: String,
        /// Parent the record inherited from.
        parent: String,
    },
    /// Field value has the wrong runtime type.
    #[error("type of key '{field}' is incorrect: expected {expected}, actual {actual}")]
    TypeMismatch {
        /// Field name.
        field: String,
        /// Expected kind label.
        expected: &'static str,
        /// Actual kind label.
        actual: &'static str,
    },
    /// Key is not declared in the schema.
    #[error("key '{field}' is unknown and will be ignored")]
    UnknownField {
        /// Unknown key.
        field: String,
    },
    /// Declared parent does not exist in the loaded set.
    #[error("parent '{parent}' is not present in the list of tests")]
    MissingParent {
        /// Declared parent identifier.
        parent: String,
    },
    /// Declared parent itself declares a parent.
    #[error(
        "parent '{parent}' inherits from '{grandparent}'; only one level of inheritance is \
         supported"
    )]
    MultiLevelInheritance {
        /// Declared parent identifier.
        parent: String,
        /// The parent's own parent.
        grandparent: String,
    },
    /// Statement placeholder without a parameter value.
    #[error("parameter '{name}' not found in params")]
    MissingParameter {
        /// Placeholder name.
        name: String,
    },
    /// `expected_exception` and `check_sql` are both set.
    #[error("expected_exception and check_sql cannot be used together")]
    ExpectedExceptionWithCheckSql,
    /// `expected_exception` is not a valid regular expression.
    #[error("expected_exception is not a valid regular expression: {error}")]
    InvalidPattern {
        /// Regex compilation error.
        error: String,
    },
}

impl ValidationIssue {
    /// Returns the issue severity.
    #[must_use]
    pub const fn severity(&self) -> IssueSeverity {
        match self {
            Self::UnknownField {
                ..
            } => IssueSeverity::Warning,
            _ => IssueSeverity::Error,
        }
    }

    /// Returns true when the issue blocks the record from running.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.severity(), IssueSeverity::Error)
    }
}
