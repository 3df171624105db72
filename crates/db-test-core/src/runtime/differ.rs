// crates/db-test-core/src/runtime/differ.rs
// ============================================================================
// Module: db-test Result Differ
// Description: Operator-facing diff between expected and actual results.
// Purpose: Explain mismatches; never used for pass/fail decisions.
// Dependencies: serde_json, similar
// ============================================================================

//! ## Overview
//! Values are rendered as pretty-printed JSON and compared line by line with
//! `similar`. The output is a unified-style listing with `--- expected` and
//! `+++ actual` headers. Rendering never fails: a value that cannot be
//! serialized falls back to its `Display` text.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;

use serde_json::Value;
use similar::ChangeTag;
use similar::TextDiff;

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders a line diff between expected and actual values.
#[must_use]
pub fn render_diff(expected: &Value, actual: &Value) -> String {
    let expected_text = value_text(expected);
    let actual_text = value_text(actual);
    let diff = TextDiff::from_lines(&expected_text, &actual_text);
    let mut out = String::from("--- expected\n+++ actual\n");
    for change in diff.iter_all_changes() {
        let marker = match change.tag() {
            ChangeTag::Equal => ' ',
            ChangeTag::Delete => '-',
            ChangeTag::Insert => '+',
        };
        let line = change.value().trim_end_matches(['\r', '\n']);
        let _ = writeln!(out, "{marker} {line}");
    }
    out
}

/// Renders a value as stable multi-line text.
fn value_text(value: &Value) -> String {
    let mut text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    text.push('\n');
    text
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::render_diff;

    #[test]
    fn marks_changed_row_lines() {
        let rendered = render_diff(&json!([{"x": 1}]), &json!([{"x": 2}]));
        assert!(rendered.starts_with("--- expected\n+++ actual\n"));
        assert!(rendered.contains("-     \"x\": 1"));
        assert!(rendered.contains("+     \"x\": 2"));
    }

    #[test]
    fn null_against_rows_is_rendered() {
        let rendered = render_diff(&json!(null), &json!([{"x": 1}]));
        assert!(rendered.contains("- null"));
        assert!(rendered.contains("+ ["));
    }
}
