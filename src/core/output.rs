//! Human-readable run summaries.
//!
//! Skip and collision lists can run to hundreds of ids; they are previewed,
//! not dumped.

use crate::pipeline::{RunReport, ScopeSummary};
use crate::plugins::supplementary::Held;
use crate::plugins::version_gate::GateDecision;
use colored::Colorize;

const PREVIEW_ITEMS: usize = 8;

/// Render up to `max_items` ids, then a `(+N more)` tail.
pub fn preview_ids(ids: &[String], max_items: usize) -> String {
    let shown = ids
        .iter()
        .take(max_items)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if ids.len() > max_items {
        format!("{} (+{} more)", shown, ids.len() - max_items)
    } else {
        shown
    }
}

fn scope_lines(summary: &ScopeSummary, out: &mut Vec<String>) {
    out.push(format!(
        "  {} {:<8} {} written, {} skipped, {} rows dropped",
        "●".bright_green(),
        summary.scope.to_string(),
        summary.written,
        summary.skipped.len(),
        summary.dropped_rows
    ));
    if !summary.skipped.is_empty() {
        let ids: Vec<String> = summary.skipped.iter().map(|s| s.indicator.clone()).collect();
        out.push(format!(
            "    {} no concept: {}",
            "▸".bright_yellow(),
            preview_ids(&ids, PREVIEW_ITEMS)
        ));
    }
}

pub fn render_report(report: &RunReport) -> String {
    let mut out = vec![format!(
        "{} {} files written",
        "DDF".bold(),
        report.files.len()
    )];
    scope_lines(&report.country, &mut out);
    scope_lines(&report.global, &mut out);
    for c in &report.collisions {
        out.push(format!(
            "  {} id collision {} withheld: {}",
            "✗".bright_red(),
            c.canonical,
            c.raw_codes.join(" / ")
        ));
    }
    let present = report
        .supplementary
        .held
        .iter()
        .filter(|h| h.reason == Held::AlreadyPresent)
        .count();
    out.push(format!(
        "  {} supplementary {} written, {} already present",
        "●".bright_green(),
        report.supplementary.written.len(),
        present
    ));
    out.push(format!(
        "Skipped {} indicator(s) without concepts",
        report.skipped_total()
    ));
    out.join("\n")
}

pub fn render_decision(decision: &GateDecision) -> String {
    match decision {
        GateDecision::Proceed => format!("{} upstream unchanged; proceeding", "✓".bright_green()),
        GateDecision::Blocked { remote, baseline } => format!(
            "{} new version available (upstream {} > baseline {}); skipping due to new version",
            "▸".bright_yellow(),
            remote,
            baseline
        ),
    }
}
