use std::fmt::Write;

use crate::error::Result;
use crate::models::{AnalysisReport, StageOutcome, StopReason};

pub fn render_json(report: &AnalysisReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn render_text(report: &AnalysisReport, preview_count: usize) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Product: {}", report.product_url);
    let _ = writeln!(out, "Collected {} reviews.", report.reviews.len());

    if report.reviews.is_empty() {
        let note = match report.stop {
            StopReason::ReviewSectionMissing => "No review section found on the page.",
            _ => "No reviews found.",
        };
        let _ = writeln!(out, "{}", note);
    } else {
        let _ = writeln!(out, "\nReview previews");
        for (i, review) in report.reviews.preview(preview_count).iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, review);
        }
    }

    let _ = writeln!(out, "\nSentiment");
    match &report.sentiment {
        StageOutcome::Completed(tally) if tally.is_empty() => {
            let _ = writeln!(out, "(no labels)");
        }
        StageOutcome::Completed(tally) => {
            for (label, count) in tally.by_count() {
                let _ = writeln!(out, "{}: {}", label, count);
            }
        }
        StageOutcome::Skipped(reason) => {
            let _ = writeln!(out, "skipped: {}", reason);
        }
        StageOutcome::Failed(error) => {
            let _ = writeln!(out, "failed: {}", error);
        }
    }

    let _ = writeln!(out, "\nSummary");
    match &report.summary {
        StageOutcome::Completed(summary) => {
            let _ = writeln!(out, "{}", summary.text);
        }
        StageOutcome::Skipped(reason) => {
            let _ = writeln!(out, "skipped: {}", reason);
        }
        StageOutcome::Failed(error) => {
            let _ = writeln!(out, "failed: {}", error);
        }
    }

    out
}
