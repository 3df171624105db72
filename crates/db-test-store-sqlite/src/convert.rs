// crates/db-test-store-sqlite/src/convert.rs
// ============================================================================
// Module: SQLite Value Conversion
// Description: JSON parameter binding and row value extraction.
// Purpose: Map between `serde_json` values and `SQLite` storage classes.
// Dependencies: rusqlite, serde_json
// ============================================================================

//! ## Overview
//! Parameters: booleans bind as `0`/`1`, integers as `INTEGER`, other numbers
//! as `REAL`, strings as `TEXT`, and arrays or objects as their JSON text.
//! Rows: `NULL`, `INTEGER`, `REAL`, and `TEXT` map to their JSON
//! counterparts; `BLOB` becomes an array of byte values. Non-finite reals
//! become `null`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::types::Value as SqlValue;
use rusqlite::types::ValueRef;
use serde_json::Number;
use serde_json::Value;

// ============================================================================
// SECTION: Conversion
// ============================================================================

/// Converts a JSON parameter into an `SQLite` value.
#[must_use]
pub fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(flag) => SqlValue::Integer(i64::from(*flag)),
        Value::Number(number) => number.as_i64().map_or_else(
            || number.as_f64().map_or(SqlValue::Null, SqlValue::Real),
            SqlValue::Integer,
        ),
        Value::String(text) => SqlValue::Text(text.clone()),
        Value::Array(_) | Value::Object(_) => SqlValue::Text(value.to_string()),
    }
}

/// Converts a column value into JSON.
#[must_use]
pub fn from_value_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(number) => Value::Number(number.into()),
        ValueRef::Real(number) => Number::from_f64(number).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => {
            Value::Array(bytes.iter().map(|byte| Value::Number((*byte).into())).collect())
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
