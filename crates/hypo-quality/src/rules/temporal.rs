use std::sync::OnceLock;

use regex::Regex;

use crate::types::{CheckResult, CheckStatus, Issue, Severity};
use crate::ValidationDataset;

fn period_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?:past|last)\s+(\d+)\s+(day|week|month|year)s?\s*$")
            .expect("valid period regex")
    })
}

/// Interpret a label like `"past 12 months"` as a day count.
///
/// Months are `round(N * 365 / 12)` days and years are `365 * N`.
#[must_use]
pub fn claimed_period_days(label: &str) -> Option<i64> {
    let caps = period_pattern().captures(label)?;
    let n: i64 = caps[1].parse().ok()?;
    let days = match caps[2].to_lowercase().as_str() {
        "day" => n,
        "week" => n.checked_mul(7)?,
        "month" => (n.checked_mul(365)? + 6) / 12,
        "year" => n.checked_mul(365)?,
        _ => return None,
    };
    Some(days)
}

/// Posts-per-day density and claimed-period agreement, with exact agreement
/// required.
#[must_use]
pub fn temporal_coverage(dataset: &ValidationDataset<'_>) -> CheckResult {
    temporal_coverage_with_tolerance(dataset, 0)
}

#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn temporal_coverage_with_tolerance(
    dataset: &ValidationDataset<'_>,
    tolerance_days: i64,
) -> CheckResult {
    let span = dataset.day_span();
    let per_day = dataset.len() as f64 / span as f64;
    let mut issues = Vec::new();

    if per_day < 1.0 {
        issues.push(
            Issue::new(
                Severity::High,
                format!("Only {per_day:.2} posts per day on average over {span} days"),
            )
            .with_impact("Sparse data may miss important events"),
        );
    }

    let mut label_agrees = true;
    if let Some(label) = dataset.claimed_period.as_deref() {
        match claimed_period_days(label) {
            Some(claimed) if (claimed - span).abs() > tolerance_days => {
                label_agrees = false;
                issues.push(Issue::new(
                    Severity::Medium,
                    format!("Analysis claims '{label}' ({claimed} days) but covers {span} days"),
                ));
            }
            Some(_) => {}
            None => issues.push(Issue::new(
                Severity::Low,
                format!("Claimed period '{label}' could not be interpreted"),
            )),
        }
    }

    let score = 0.5 * per_day.min(1.0) + if label_agrees { 0.5 } else { 0.0 };
    let status = if per_day < 1.0 || !label_agrees {
        CheckStatus::Warning
    } else {
        CheckStatus::Passed
    };
    CheckResult::new(status, issues, score)
}
