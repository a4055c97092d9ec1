use hypo_core::{AnalysisRecord, NOT_AVAILABLE};

use super::ratio;
use crate::types::{CheckResult, CheckStatus, Issue, Severity};
use crate::ValidationDataset;

/// Counts `(present, total)` required fields for one record.
fn field_counts(record: &AnalysisRecord, symbols: &[String], intervals: &[String]) -> (usize, usize) {
    let mut present = 0;
    let mut total = 0;

    for symbol in symbols {
        for interval in intervals {
            total += 1;
            if record.impact(symbol, interval).is_some() {
                present += 1;
            }
        }
    }

    let label = record.classification.label.trim();
    total += 2;
    if !label.is_empty() && label != NOT_AVAILABLE {
        present += 1;
    }
    if record.classification.confidence.is_finite() {
        present += 1;
    }

    (present, total)
}

/// Required-field presence across all records.
///
/// Every configured `(symbol, interval)` impact plus the label and confidence
/// count as one field each.
#[must_use]
pub fn completeness(dataset: &ValidationDataset<'_>) -> CheckResult {
    let mut issues = Vec::new();
    let mut present = 0;
    let mut total = 0;
    let mut partial = 0;

    for record in dataset.records {
        let (p, t) = field_counts(record, &dataset.symbols, &dataset.intervals);
        present += p;
        total += t;
        if p < t {
            partial += 1;
        }
    }

    let no_price_data = !dataset.records.iter().any(AnalysisRecord::has_any_impact);
    let no_statistics = dataset.statistics.is_none();

    if no_price_data {
        issues.push(
            Issue::new(
                Severity::Critical,
                "All stock price impact measurements are missing",
            )
            .with_impact("Cannot assess correlation between sentiment and stock movement"),
        );
    }
    if no_statistics {
        issues.push(
            Issue::new(Severity::Critical, "No statistical summary was computed")
                .with_impact("Cannot assess statistical significance or variability"),
        );
    }
    if partial > 0 {
        issues.push(Issue::new(
            Severity::Medium,
            format!(
                "{partial} of {} records have missing required fields ({} of {total} fields absent)",
                dataset.len(),
                total - present
            ),
        ));
    }

    let status = if no_price_data || no_statistics {
        CheckStatus::Failed
    } else if partial > 0 {
        CheckStatus::Warning
    } else {
        CheckStatus::Passed
    };

    CheckResult::new(status, issues, ratio(present, total))
}
