//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::planner::{Change, ChangeKind, ChangeSet};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug, Clone, Copy)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Change row for table display.
#[derive(Tabled)]
struct ChangeRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "Patch")]
    patch: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the journal of a run.
    #[must_use]
    pub fn format_changes(&self, changes: &ChangeSet) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(changes).unwrap_or_default(),
            OutputFormat::Text => Self::format_changes_text(changes),
        }
    }

    fn format_changes_text(changes: &ChangeSet) -> String {
        let mut output = String::new();

        if changes.is_empty() {
            let _ = writeln!(output, "{} No changes, the API is up to date.", "✓".green());
        } else {
            let rows: Vec<ChangeRow> = changes
                .changes
                .iter()
                .enumerate()
                .map(|(i, c)| ChangeRow {
                    index: i + 1,
                    action: Self::format_kind(c.kind),
                    target: c.target.to_string(),
                    subject: Self::truncate(&c.subject, 60),
                    patch: Self::format_patch(c),
                })
                .collect();
            output.push_str(&Table::new(rows).to_string());
            output.push('\n');

            let verb = if changes.dry_run { "Plan" } else { "Applied" };
            let _ = writeln!(
                output,
                "\n{verb}: {} to create, {} to update, {} to delete, {} grant(s)",
                changes.count(ChangeKind::Create).to_string().green(),
                changes.count(ChangeKind::Update).to_string().yellow(),
                changes.count(ChangeKind::Delete).to_string().red(),
                changes.count(ChangeKind::Grant)
            );
        }

        Self::append_warnings(&mut output, &changes.warnings);
        output
    }

    /// Formats the outcome of a validation.
    #[must_use]
    pub fn format_validation(&self, warnings: &[String]) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({ "valid": true, "warnings": warnings });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = format!("{} Definition is valid.\n", "✓".green());
                Self::append_warnings(&mut output, warnings);
                output
            }
        }
    }

    /// Formats a fatal error.
    #[must_use]
    pub fn format_error(&self, message: &str) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({ "status": "error", "message": message });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => format!("{} {message}", "✗".red()),
        }
    }

    fn append_warnings(output: &mut String, warnings: &[String]) {
        if warnings.is_empty() {
            return;
        }
        let _ = writeln!(output, "\n{} Warnings:", "⚠".yellow());
        for warning in warnings {
            let _ = writeln!(output, "   - {warning}");
        }
    }

    /// Formats a change kind with color.
    fn format_kind(kind: ChangeKind) -> String {
        match kind {
            ChangeKind::Create => "+create".green().to_string(),
            ChangeKind::Update => "~update".yellow().to_string(),
            ChangeKind::Delete => "-delete".red().to_string(),
            ChangeKind::Grant => "+grant".cyan().to_string(),
        }
    }

    fn format_patch(change: &Change) -> String {
        change
            .operations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Truncates a string to a maximum number of characters.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{kept}...")
        }
    }
}
