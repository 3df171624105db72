// crates/db-test-core/src/runtime/placeholders.rs
// ============================================================================
// Module: db-test Statement Placeholders
// Description: Named placeholder discovery in SQL text.
// Purpose: Let validation flag parameters a statement needs but never gets.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Recognizes `:name`, `@name`, and `$name` placeholders. Quoted literals,
//! quoted identifiers, comments, `::` casts, and positional `$1` markers are
//! skipped.

// ============================================================================
// SECTION: Scanner
// ============================================================================

/// Returns the distinct placeholder names in a statement, in first-seen order.
#[must_use]
pub fn named_placeholders(sql: &str) -> Vec<String> {
    let chars: Vec<char> = sql.chars().collect();
    let mut names: Vec<String> = Vec::new();
    let mut index = 0;
    while index < chars.len() {
        let current = chars[index];
        let next = chars.get(index + 1).copied();
        match current {
            '\'' | '"' | '`' => index = skip_quoted(&chars, index, current),
            '[' => index = skip_until(&chars, index + 1, ']'),
            '-' if next == Some('-') => index = skip_until(&chars, index + 2, '\n'),
            '/' if next == Some('*') => index = skip_block_comment(&chars, index + 2),
            ':' if next == Some(':') => index += 2,
            ':' | '@' | '$' => {
                let start = index + 1;
                let end = identifier_end(&chars, start);
                if end > start && !chars[start].is_ascii_digit() {
                    let name: String = chars[start..end].iter().collect();
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
                index = end.max(index + 1);
            }
            _ => index += 1,
        }
    }
    names
}

/// Skips a quoted run, honoring doubled quotes as escapes.
fn skip_quoted(chars: &[char], start: usize, quote: char) -> usize {
    let mut index = start + 1;
    while index < chars.len() {
        if chars[index] == quote {
            if chars.get(index + 1) == Some(&quote) {
                index += 2;
                continue;
            }
            return index + 1;
        }
        index += 1;
    }
    chars.len()
}

/// Skips to just past the next `terminator`.
fn skip_until(chars: &[char], start: usize, terminator: char) -> usize {
    chars[start.min(chars.len())..]
        .iter()
        .position(|ch| *ch == terminator)
        .map_or(chars.len(), |offset| start + offset + 1)
}

/// Skips to just past the closing `*/`.
fn skip_block_comment(chars: &[char], start: usize) -> usize {
    let mut index = start;
    while index + 1 < chars.len() {
        if chars[index] == '*' && chars[index + 1] == '/' {
            return index + 2;
        }
        index += 1;
    }
    chars.len()
}

/// Returns the end of the identifier starting at `start`.
fn identifier_end(chars: &[char], start: usize) -> usize {
    let mut end = start;
    while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_') {
        end += 1;
    }
    end
}

// ============================================================================
// SECTION: Tests
// ============================================================================
