use serde::{Deserialize, Serialize};

use super::ratio;
use crate::types::{CheckResult, CheckStatus, Issue, Severity};
use crate::ValidationDataset;

/// Minimum sample per analysis type, in reporting order.
pub const SAMPLE_REQUIREMENTS: [(&str, usize); 4] = [
    ("correlation", 30),
    ("significance", 100),
    ("subgroup", 50),
    ("time_series", 200),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleAdequacy {
    pub analysis: String,
    pub required: usize,
    pub actual: usize,
    /// `min(100, actual / required * 100)`.
    pub adequacy_pct: f64,
}

#[must_use]
pub fn sample_adequacy(actual: usize) -> Vec<SampleAdequacy> {
    SAMPLE_REQUIREMENTS
        .iter()
        .map(|(analysis, required)| SampleAdequacy {
            analysis: (*analysis).to_string(),
            required: *required,
            actual,
            adequacy_pct: (ratio(actual, *required) * 100.0).min(100.0),
        })
        .collect()
}

#[must_use]
pub fn sample_size(dataset: &ValidationDataset<'_>) -> CheckResult {
    let rows = sample_adequacy(dataset.len());

    let issues: Vec<Issue> = rows
        .iter()
        .filter(|row| row.adequacy_pct < 100.0)
        .map(|row| {
            Issue::new(
                Severity::High,
                format!(
                    "{} analysis needs {} samples, have {} ({:.1}% adequate)",
                    row.analysis, row.required, row.actual, row.adequacy_pct
                ),
            )
        })
        .collect();

    let min_pct = rows
        .iter()
        .map(|row| row.adequacy_pct)
        .fold(100.0_f64, f64::min);
    #[allow(clippy::cast_precision_loss)]
    let mean = rows.iter().map(|row| row.adequacy_pct / 100.0).sum::<f64>() / rows.len() as f64;

    let status = if min_pct < 50.0 {
        CheckStatus::Failed
    } else if min_pct < 100.0 {
        CheckStatus::Warning
    } else {
        CheckStatus::Passed
    };
    CheckResult::new(status, issues, mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{dataset, record, scenario_a};

    #[test]
    fn scenario_c_adequacy_table() {
        let rows = sample_adequacy(20);
        let rendered: Vec<String> = rows
            .iter()
            .map(|r| format!("{:.1}%", r.adequacy_pct))
            .collect();
        assert_eq!(rendered, vec!["66.7%", "20.0%", "40.0%", "10.0%"]);
    }

    #[test]
    fn scenario_c_fails() {
        let records = scenario_a();
        let result = sample_size(&dataset(&records));
        assert_eq!(result.status, CheckStatus::Failed);
        assert_eq!(result.issues.len(), 4);
        let expected = (20.0 / 30.0 + 0.2 + 0.4 + 0.1) / 4.0;
        assert!((result.score - expected).abs() < 1e-12);
    }

    #[test]
    fn between_half_and_full_warns() {
        let records: Vec<_> = (0..120).map(|i| record(i, "BULLISH", Some(0.1), None)).collect();
        let result = sample_size(&dataset(&records));
        assert_eq!(result.status, CheckStatus::Warning);
        assert_eq!(result.issues.len(), 1);
        assert!(result.issues[0].description.starts_with("time_series"));
    }

    #[test]
    fn adequacy_is_capped() {
        assert!(sample_adequacy(10_000)
            .iter()
            .all(|r| (r.adequacy_pct - 100.0).abs() < f64::EPSILON));
    }
}
