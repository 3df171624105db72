// crates/db-test-core/src/core/schema.rs
// ============================================================================
// Module: db-test Record Schema
// Description: Field table describing every key a test record may declare.
// Purpose: Drive required/type/unknown-field checks from one static table.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! The schema is a static, ordered table. Order matters: custom checks run in
//! table order, so `parent` resolution happens before the `params` and
//! `expected_exception` checks inspect the resolved record.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;

// ============================================================================
// SECTION: Field Kinds
// ============================================================================

/// Runtime type a field value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// JSON string.
    String,
    /// JSON object (mapping of string keys).
    Object,
    /// Any JSON value, including `null`.
    Any,
}

impl FieldKind {
    /// Returns true when the value satisfies this kind.
    #[must_use]
    pub const fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => matches!(value, Value::String(_)),
            Self::Object => matches!(value, Value::Object(_)),
            Self::Any => true,
        }
    }

    /// Returns the stable label used in validation messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Object => "object",
            Self::Any => "any",
        }
    }
}

/// Returns the label of a JSON value's runtime type.
#[must_use]
pub const fn value_kind_label(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// SECTION: Custom Checks
// ============================================================================

/// Field-specific check run after the generic schema checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomCheck {
    /// Resolves single-level inheritance from the named parent.
    Parent,
    /// Verifies that every statement placeholder has a parameter value.
    Params,
    /// Verifies the expected-exception pattern and its exclusivity with `check_sql`.
    ExpectedException,
}

// ============================================================================
// SECTION: Field Table
// ============================================================================

/// Declaration of one schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name as written in test sources.
    pub name: &'static str,
    /// Expected runtime type.
    pub kind: FieldKind,
    /// Whether the field must be present on records without a parent.
    pub required: bool,
    /// Optional custom check.
    pub check: Option<CustomCheck>,
}

impl FieldSpec {
    /// Declares an optional string field without a custom check.
    const fn optional(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::String,
            required: false,
            check: None,
        }
    }
}

/// Field name: display name.
pub const FIELD_NAME: &str = "name";
/// Field name: logical database.
pub const FIELD_DB: &str = "db";
/// Field name: statement under test.
pub const FIELD_SQL: &str = "sql";
/// Field name: expected result.
pub const FIELD_RESULT: &str = "result";
/// Field name: verification statement.
pub const FIELD_CHECK_SQL: &str = "check_sql";
/// Field name: parent record identifier.
pub const FIELD_PARENT: &str = "parent";
/// Field name: statement parameters.
pub const FIELD_PARAMS: &str = "params";
/// Field name: cleanup statement.
pub const FIELD_CLEANUP: &str = "cleanup";
/// Field name: expected error pattern.
pub const FIELD_EXPECTED_EXCEPTION: &str = "expected_exception";
/// Field name: free-form documentation.
pub const FIELD_DESCRIPTION: &str = "description";

/// Ordered schema for test records.
pub const TEST_SCHEMA: &[FieldSpec] = &[
    FieldSpec::optional(FIELD_NAME),
    FieldSpec {
        name: FIELD_DB,
        kind: FieldKind::String,
        required: true,
        check: None,
    },
    FieldSpec {
        name: FIELD_SQL,
        kind: FieldKind::String,
        required: true,
        check: None,
    },
    FieldSpec {
        name: FIELD_RESULT,
        kind: FieldKind::Any,
        required: true,
        check: None,
    },
    FieldSpec::optional(FIELD_CHECK_SQL),
    FieldSpec {
        name: FIELD_PARENT,
        kind: FieldKind::String,
        required: false,
        check: Some(CustomCheck::Parent),
    },
    FieldSpec {
        name: FIELD_PARAMS,
        kind: FieldKind::Object,
        required: false,
        check: Some(CustomCheck::Params),
    },
    FieldSpec::optional(FIELD_CLEANUP),
    FieldSpec {
        name: FIELD_EXPECTED_EXCEPTION,
        kind: FieldKind::String,
        required: false,
        check: Some(CustomCheck::ExpectedException),
    },
    FieldSpec::optional(FIELD_DESCRIPTION),
];

/// Iterates over the required fields in schema order.
pub fn required_fields() -> impl Iterator<Item = &'static FieldSpec> {
    TEST_SCHEMA.iter().filter(|field| field.required)
}
