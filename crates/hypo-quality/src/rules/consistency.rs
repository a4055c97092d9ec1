use super::ratio;
use crate::types::{CheckResult, CheckStatus, Issue, Severity};
use crate::ValidationDataset;

const MISSING_BUCKET_PENALTY: f64 = 0.3;

/// Distribution bookkeeping: category counts and market-hours tags must both
/// account for every record, and every configured category needs a non-empty
/// bucket.
#[must_use]
pub fn consistency(dataset: &ValidationDataset<'_>) -> CheckResult {
    let total = dataset.len();
    if total == 0 {
        return CheckResult::new(
            CheckStatus::Warning,
            vec![Issue::new(Severity::Medium, "No records to check for consistency")],
            0.0,
        );
    }

    let mut issues = Vec::new();

    let counts: Vec<(&str, usize)> = dataset
        .categories
        .iter()
        .map(|cat| {
            let n = dataset
                .records
                .iter()
                .filter(|r| r.classification.label == *cat)
                .count();
            (cat.as_str(), n)
        })
        .collect();

    let missing: Vec<&str> = counts
        .iter()
        .filter(|(_, n)| *n == 0)
        .map(|(cat, _)| *cat)
        .collect();
    for cat in &missing {
        issues.push(
            Issue::new(
                Severity::Medium,
                format!("Missing {cat} category in sentiment distribution"),
            )
            .with_impact("Incomplete sentiment analysis"),
        );
    }

    let categorized: usize = counts.iter().map(|(_, n)| n).sum();
    let sentiment_gap = total.abs_diff(categorized);
    if sentiment_gap > 0 {
        issues.push(Issue::new(
            Severity::Medium,
            format!(
                "Sentiment counts sum to {categorized} but there are {total} records"
            ),
        ));
    }

    let tagged: Vec<bool> = dataset
        .records
        .iter()
        .filter_map(hypo_core::AnalysisRecord::market_hours)
        .collect();
    let hours_gap = if tagged.is_empty() {
        0
    } else {
        let inside = tagged.iter().filter(|b| **b).count();
        let outside = tagged.len() - inside;
        let gap = total.abs_diff(inside + outside);
        if gap > 0 {
            issues.push(Issue::new(
                Severity::Medium,
                format!(
                    "Market hours ({inside}) plus after hours ({outside}) does not equal {total} records"
                ),
            ));
        }
        gap
    };

    if issues.is_empty() {
        return CheckResult::passed();
    }

    let penalty = if missing.is_empty() {
        0.0
    } else {
        MISSING_BUCKET_PENALTY
    };
    let score = 1.0 - penalty - ratio(sentiment_gap, total) - ratio(hours_gap, total);
    CheckResult::new(CheckStatus::Warning, issues, score.max(0.0))
}
