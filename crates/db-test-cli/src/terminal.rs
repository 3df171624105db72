// crates/db-test-cli/src/terminal.rs
// ============================================================================
// Module: Terminal Reporter
// Description: Human-readable run event formatting.
// Purpose: Render run events as severity-tagged terminal lines.
// Dependencies: colored, db-test-core
// ============================================================================

//! ## Overview
//! Each event becomes one tagged line; verbose detail follows, indented.
//! Diff detail lines are colored by their marker. Colors are only applied
//! when the reporter is told the output is a terminal.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;

use colored::ColoredString;
use colored::Colorize;
use db_test_core::RunEvent;
use db_test_core::RunReporter;
use db_test_core::Severity;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Indentation applied to detail lines.
const DETAIL_INDENT: &str = "    ";

// ============================================================================
// SECTION: Reporter
// ============================================================================

/// Terminal event sink.
pub struct TerminalReporter<W: Write + Send> {
    /// Output writer.
    writer: Mutex<W>,
    /// Whether ANSI colors are emitted.
    color: bool,
}

impl<W: Write + Send> TerminalReporter<W> {
    /// Creates a reporter over a writer.
    pub const fn new(writer: W, color: bool) -> Self {
        Self {
            writer: Mutex::new(writer),
            color,
        }
    }

    /// Consumes the reporter and returns the writer.
    pub fn into_inner(self) -> Option<W> {
        self.writer.into_inner().ok()
    }

    /// Applies the severity color to a tag.
    fn paint_tag(&self, severity: Severity) -> String {
        let tag = severity_tag(severity);
        if !self.color {
            return tag.to_string();
        }
        let painted: ColoredString = match severity {
            Severity::Info => tag.blue(),
            Severity::Success => tag.green().bold(),
            Severity::Warning => tag.yellow().bold(),
            Severity::Failure => tag.red().bold(),
        };
        painted.to_string()
    }

    /// Applies diff colors to one detail line.
    fn paint_detail(&self, line: &str) -> String {
        if !self.color {
            return line.to_string();
        }
        if line.starts_with("+++") || line.starts_with("---") {
            line.bold().to_string()
        } else if line.starts_with('+') {
            line.green().to_string()
        } else if line.starts_with('-') {
            line.red().to_string()
        } else {
            line.to_string()
        }
    }

    /// Renders an event as output lines.
    fn render(&self, event: &RunEvent) -> Vec<String> {
        let mut lines = vec![format!("{} {}", self.paint_tag(event.severity), event.message)];
        if let Some(detail) = &event.detail {
            lines.extend(
                detail.lines().map(|line| format!("{DETAIL_INDENT}{}", self.paint_detail(line))),
            );
        }
        lines
    }
}

impl<W: Write + Send> RunReporter for TerminalReporter<W> {
    fn record(&self, event: &RunEvent) {
        let lines = self.render(event);
        let Ok(mut guard) = self.writer.lock() else {
            return;
        };
        for line in lines {
            if writeln!(&mut *guard, "{line}").is_err() {
                return;
            }
        }
        let _ = guard.flush();
    }
}

/// Returns the fixed-width tag for a severity.
const fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "[INFO]",
        Severity::Success => "[ OK ]",
        Severity::Warning => "[WARN]",
        Severity::Failure => "[FAIL]",
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
