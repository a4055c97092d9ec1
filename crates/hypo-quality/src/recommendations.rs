//! Table-driven remediation advice for the analysis-level checks.

use crate::types::{CheckName, CheckStatus, NamedCheck, Priority, Recommendation};

struct Row {
    priority: Priority,
    action: &'static str,
    gate: &'static [CheckName],
    steps: &'static [&'static str],
    expected_outcome: &'static str,
}

/// Rows in emission order, already sorted CRITICAL → HIGH → MEDIUM.
const TABLE: &[Row] = &[
    Row {
        priority: Priority::Critical,
        action: "Fix market data integration",
        gate: &[CheckName::SourceIntegration],
        steps: &[
            "Verify market data API credentials are correct",
            "Check that bars exist for every symbol on the post dates",
            "Ensure post timestamps are parsed into UTC",
            "Test the API connection with known good dates",
            "Consider a fallback data source if the primary fails",
        ],
        expected_outcome: "Price impact data populated for all posts",
    },
    Row {
        priority: Priority::Critical,
        action: "Increase sample size",
        gate: &[CheckName::SampleSize],
        steps: &[
            "Extend the date range to the full claimed period",
            "Remove restrictive keyword filters if applicable",
            "Include every post from the tracked accounts that mentions a tracked company",
            "Target a minimum of 100-200 posts for statistical validity",
        ],
        expected_outcome: "Statistically significant results",
    },
    Row {
        priority: Priority::High,
        action: "Implement statistical analysis",
        gate: &[CheckName::StatisticalValidity],
        steps: &[
            "Calculate correlation coefficients",
            "Perform t-tests between sentiment groups",
            "Add confidence intervals",
            "Include p-values for all comparisons",
            "Calculate effect sizes (Cohen's d)",
        ],
        expected_outcome: "Complete statistical validation",
    },
    Row {
        priority: Priority::High,
        action: "Add data completeness checks",
        gate: &[CheckName::Completeness],
        steps: &[
            "Implement pre-analysis data validation",
            "Create fallback handling for missing data",
            "Log all data collection failures",
            "Add data quality metrics to the report",
        ],
        expected_outcome: "Transparent data quality reporting",
    },
    Row {
        priority: Priority::Medium,
        action: "Resolve distribution inconsistencies",
        gate: &[CheckName::Consistency],
        steps: &[
            "Report every configured sentiment category, including empty ones",
            "Tag every post with its market-hours condition",
            "Reconcile category totals with the record count",
        ],
        expected_outcome: "Distributions that account for every record",
    },
    Row {
        priority: Priority::Medium,
        action: "Extend temporal coverage",
        gate: &[CheckName::TemporalCoverage],
        steps: &[
            "Collect enough posts for at least one per day on average",
            "Align the claimed period label with the actual date range",
        ],
        expected_outcome: "Coverage that matches the claimed period",
    },
    Row {
        priority: Priority::Medium,
        action: "Enhance methodology documentation",
        gate: &[CheckName::Methodology],
        steps: &[
            "Include exact sentiment classification prompts",
            "Document the data collection process",
            "Add a flowchart of the analysis pipeline",
            "Include example post classifications",
        ],
        expected_outcome: "Fully reproducible analysis",
    },
];

/// Recommendations whose gated checks did not pass, in priority order.
///
/// A row fires when any of its gated checks is present with a status other
/// than `Passed`; checks that never ran cannot trigger advice.
#[must_use]
pub fn recommend(checks: &[NamedCheck]) -> Vec<Recommendation> {
    let not_passed = |name: CheckName| {
        checks
            .iter()
            .any(|c| c.name == name.as_str() && c.result.status != CheckStatus::Passed)
    };

    let mut out: Vec<Recommendation> = TABLE
        .iter()
        .filter(|row| row.gate.iter().copied().any(&not_passed))
        .map(|row| Recommendation {
            priority: row.priority,
            action: row.action.to_string(),
            steps: row.steps.iter().map(|s| (*s).to_string()).collect(),
            expected_outcome: Some(row.expected_outcome.to_string()),
        })
        .collect();
    out.sort_by_key(|r| r.priority);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CheckResult;

    fn check(name: CheckName, status: CheckStatus) -> NamedCheck {
        NamedCheck::new(name.as_str(), CheckResult::new(status, vec![], 0.5))
    }

    #[test]
    fn all_passed_yields_nothing() {
        let checks: Vec<_> = CheckName::ALL
            .iter()
            .map(|n| check(*n, CheckStatus::Passed))
            .collect();
        assert!(recommend(&checks).is_empty());
    }

    #[test]
    fn only_failing_checks_are_addressed_in_priority_order() {
        let checks = vec![
            check(CheckName::Methodology, CheckStatus::Warning),
            check(CheckName::Completeness, CheckStatus::Passed),
            check(CheckName::SampleSize, CheckStatus::Failed),
            check(CheckName::StatisticalValidity, CheckStatus::Warning),
        ];
        let actions: Vec<_> = recommend(&checks).into_iter().map(|r| r.action).collect();
        assert_eq!(
            actions,
            vec![
                "Increase sample size",
                "Implement statistical analysis",
                "Enhance methodology documentation",
            ]
        );
    }

    #[test]
    fn absent_checks_do_not_fire() {
        assert!(recommend(&[]).is_empty());
    }

    #[test]
    fn table_is_priority_sorted() {
        assert!(TABLE.windows(2).all(|w| w[0].priority <= w[1].priority));
    }
}
