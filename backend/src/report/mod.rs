//! Human-readable reports for batch summaries and column checks.
//!
//! The text produced here is what gets printed by the CLI and posted to the
//! notification channel. Formatting is pure: no I/O happens in this module.

use std::fmt::Write;

use crate::batch::{BatchSummary, DEFAULT_PREVIEW_SIZE};
use crate::columns::ColumnReport;

/// Options for [`format_summary`].
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Append the `rule: count` histogram lines
    pub include_histogram: bool,
    /// Preview limit named in the "First K errors" heading
    pub preview_size: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            include_histogram: true,
            preview_size: DEFAULT_PREVIEW_SIZE,
        }
    }
}

/// Render a batch summary.
///
/// # Example
/// ```ignore
/// let text = format_summary(&result.summary, &ReportOptions::default());
/// assert!(text.contains("Valid rows: 1"));
/// ```
pub fn format_summary(summary: &BatchSummary, options: &ReportOptions) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(out, "Row-Level Validation Completed.");
    let _ = writeln!(
        out,
        "Status: {}",
        if summary.passed() { "PASSED" } else { "FAILED" }
    );
    let _ = writeln!(out, "Total rows: {}", summary.total);
    let _ = writeln!(out, "Valid rows: {}", summary.valid);
    let _ = writeln!(out, "Invalid rows: {}", summary.invalid);

    if !summary.preview.is_empty() {
        let _ = writeln!(out, "First {} errors:", options.preview_size);
        for message in &summary.preview {
            let _ = writeln!(out, "- {}", message);
        }
    }

    if options.include_histogram && !summary.histogram.is_empty() {
        let _ = writeln!(out, "Errors by rule:");
        for (kind, count) in &summary.histogram {
            let _ = writeln!(out, "{}: {}", kind, count);
        }
    }

    out
}

/// Render the column-check pass.
pub fn format_column_report(report: &ColumnReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Column Checks Completed.");
    let _ = writeln!(out, "Passed expectations: {}", report.passed());
    let _ = writeln!(out, "Failed expectations: {}", report.failed());

    let failed: Vec<_> = report.results.iter().filter(|r| !r.success).collect();
    if !failed.is_empty() {
        let _ = writeln!(out, "Failed Expectations:");
        for result in &failed {
            if result.column_missing {
                let _ = writeln!(out, "{}({}): column not found", result.check, result.column);
            } else {
                let _ = writeln!(out, "{}({})", result.check, result.column);
            }
        }
        let _ = writeln!(out, "Unexpected Value Counts:");
        for result in &failed {
            let _ = writeln!(out, "{}: {}", result.column, result.unexpected_count);
        }
    }

    out
}
