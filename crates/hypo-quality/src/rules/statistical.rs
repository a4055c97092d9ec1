use super::ratio;
use crate::types::{CheckResult, CheckStatus, Issue, Severity};
use crate::ValidationDataset;

pub(crate) const MIN_RELIABLE_SAMPLE: usize = 100;

#[must_use]
pub fn statistical_validity(dataset: &ValidationDataset<'_>) -> CheckResult {
    let n = dataset.len();
    let mut issues = Vec::new();

    let tested = dataset
        .statistics
        .as_ref()
        .is_some_and(crate::StatisticsSummary::has_significance_test);
    if !tested {
        issues.push(
            Issue::new(
                Severity::Critical,
                "No significance testing (confidence interval, p-value or effect size) was computed",
            )
            .with_impact("Observed differences cannot be distinguished from noise"),
        );
    }

    if n < MIN_RELIABLE_SAMPLE {
        issues.push(
            Issue::new(
                Severity::High,
                format!(
                    "Sample size of {n} is too small for reliable inference (minimum {MIN_RELIABLE_SAMPLE})"
                ),
            )
            .with_impact("Results may not be statistically significant"),
        );
    }

    if !tested {
        CheckResult::new(CheckStatus::Failed, issues, 0.0)
    } else if n < MIN_RELIABLE_SAMPLE {
        CheckResult::new(CheckStatus::Warning, issues, ratio(n, MIN_RELIABLE_SAMPLE))
    } else {
        CheckResult::passed()
    }
}
