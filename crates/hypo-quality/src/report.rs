//! Markdown rendering of a [`QualityReport`].

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::types::{CheckStatus, QualityReport};

const SCORE_LABEL: &str = "**Overall Data Quality Score**";

fn score_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\*\*Overall Data Quality Score\*\*:\s*(-?\d+(?:\.\d+)?)%")
            .expect("valid score regex")
    })
}

fn status_marker(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Passed => "✅",
        CheckStatus::Warning => "⚠️",
        CheckStatus::Failed => "❌",
    }
}

fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render the report as Markdown. The score line is written at one decimal
/// place of percentage and can be recovered with [`parse_score`].
#[must_use]
pub fn render_markdown(report: &QualityReport, title: &str) -> String {
    let mut out = String::new();
    if let Err(e) = write_report(&mut out, report, title) {
        tracing::error!(error = %e, "quality report rendering stopped early");
    }
    out
}

/// Write the Markdown report into any [`fmt::Write`] sink.
///
/// # Errors
///
/// Propagates the first error returned by `out`.
pub fn write_report<W: fmt::Write>(out: &mut W, report: &QualityReport, title: &str) -> fmt::Result {
    writeln!(out, "# Data Validation Report: {title}\n")?;
    writeln!(
        out,
        "**Validation Date**: {}",
        report.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(out, "{SCORE_LABEL}: {:.1}%", report.score * 100.0)?;
    writeln!(out, "**Validation Status**: {}\n", report.status)?;

    out.write_str("## Critical Issues Identified\n\n")?;
    if report.critical_issues.is_empty() {
        out.write_str("None.\n")?;
    }
    for issue in &report.critical_issues {
        writeln!(out, "- 🚨 **{issue}**")?;
    }

    out.write_str("\n## Detailed Validation Results\n\n")?;
    for check in &report.checks {
        writeln!(out, "### {}", title_case(&check.name))?;
        writeln!(
            out,
            "**Status**: {} {} (score {:.2})\n",
            status_marker(check.result.status),
            check.result.status,
            check.result.score
        )?;
        for issue in &check.result.issues {
            writeln!(out, "- **{}**: {}", issue.severity, issue.description)?;
            if let Some(impact) = &issue.impact {
                writeln!(out, "  - Impact: {impact}")?;
            }
        }
        out.write_char('\n')?;
    }

    if !report.recommendations.is_empty() {
        out.write_str("## Prioritized Recommendations\n\n")?;
        for rec in &report.recommendations {
            writeln!(out, "### {} Priority: {}\n", rec.priority, rec.action)?;
            out.write_str("**Steps**:\n")?;
            for (i, step) in rec.steps.iter().enumerate() {
                writeln!(out, "{}. {step}", i + 1)?;
            }
            if let Some(outcome) = &rec.expected_outcome {
                writeln!(out, "\n**Expected Outcome**: {outcome}")?;
            }
            out.write_char('\n')?;
        }
    }
    Ok(())
}

/// Recover the overall score (as a fraction) from rendered Markdown.
#[must_use]
pub fn parse_score(markdown: &str) -> Option<f64> {
    let caps = score_pattern().captures(markdown)?;
    caps[1].parse::<f64>().ok().map(|pct| pct / 100.0)
}
