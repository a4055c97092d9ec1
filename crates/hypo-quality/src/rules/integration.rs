use super::ratio;
use crate::types::{CheckResult, CheckStatus, Issue, Severity};
use crate::ValidationDataset;

const INTEGRATED_PASS_RATIO: f64 = 0.9;

/// Share of records carrying at least one measured price impact.
#[must_use]
pub fn source_integration(dataset: &ValidationDataset<'_>) -> CheckResult {
    let total = dataset.len();
    let integrated = dataset
        .records
        .iter()
        .filter(|r| r.has_any_impact())
        .count();

    if integrated == 0 {
        let untimed = dataset
            .records
            .iter()
            .filter(|r| r.post.timestamp.is_none())
            .count();
        let mut issues = vec![Issue::new(
            Severity::Critical,
            "No market data was successfully integrated",
        )
        .with_impact("Every price impact field is empty")];
        if untimed > 0 {
            issues.push(Issue::new(
                Severity::High,
                format!("{untimed} records have no resolvable timestamp to align with market data"),
            ));
        }
        return CheckResult::new(CheckStatus::Failed, issues, 0.0);
    }

    let fraction = ratio(integrated, total);
    if fraction >= INTEGRATED_PASS_RATIO {
        return CheckResult::new(CheckStatus::Passed, Vec::new(), fraction);
    }

    CheckResult::new(
        CheckStatus::Warning,
        vec![Issue::new(
            Severity::High,
            format!(
                "{} of {total} records have no price impact data",
                total - integrated
            ),
        )],
        fraction,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{dataset, record, scenario_a};

    #[test]
    fn scenario_b_all_null_impacts_fail() {
        let records: Vec<_> = (0..20).map(|i| record(i, "BULLISH", None, Some(true))).collect();
        let result = source_integration(&dataset(&records));
        assert_eq!(result.status, CheckStatus::Failed);
        assert!(result.score.abs() < f64::EPSILON);
        assert_eq!(result.issues.len(), 1);
    }

    #[test]
    fn missing_timestamps_are_called_out() {
        let mut records: Vec<_> = (0..3).map(|i| record(i, "BULLISH", None, None)).collect();
        records[0].post.timestamp = None;
        let result = source_integration(&dataset(&records));
        assert_eq!(result.issues.len(), 2);
        assert!(result.issues[1].description.starts_with("1 records"));
    }

    #[test]
    fn partial_integration_warns_with_fraction() {
        let mut records = scenario_a();
        for r in records.iter_mut().take(5) {
            *r = record(0, "BULLISH", None, Some(true));
        }
        let result = source_integration(&dataset(&records));
        assert_eq!(result.status, CheckStatus::Warning);
        assert!((result.score - 0.75).abs() < 1e-12);
    }

    #[test]
    fn ninety_percent_passes() {
        let mut records = scenario_a();
        records[0] = record(0, "BULLISH", None, Some(true));
        records[1] = record(1, "BULLISH", None, Some(true));
        let result = source_integration(&dataset(&records));
        assert_eq!(result.status, CheckStatus::Passed);
        assert!((result.score - 0.9).abs() < 1e-12);
    }
}
