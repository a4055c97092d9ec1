use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::recommendations::recommend;
use crate::rules;
use crate::types::{
    CheckName, CheckStatus, NamedCheck, QualityReport, Recommendation, Severity,
};
use crate::ValidationDataset;

/// Per-check weights for the overall score.
///
/// Checks missing from the map weigh [`Weights::FALLBACK`]. Weights are used
/// as given; they are never renormalized to sum to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weights {
    map: BTreeMap<String, f64>,
}

impl Weights {
    pub const FALLBACK: f64 = 0.1;

    pub fn new<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            map: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    #[must_use]
    pub fn get(&self, check: &str) -> f64 {
        self.map.get(check).copied().unwrap_or(Self::FALLBACK)
    }
}

impl Default for Weights {
    /// Temporal coverage is deliberately absent and falls back to 0.1.
    fn default() -> Self {
        Self::new([
            (CheckName::Completeness.as_str(), 0.30),
            (CheckName::Consistency.as_str(), 0.10),
            (CheckName::StatisticalValidity.as_str(), 0.20),
            (CheckName::SourceIntegration.as_str(), 0.25),
            (CheckName::SampleSize.as_str(), 0.10),
            (CheckName::Methodology.as_str(), 0.05),
        ])
    }
}

/// Worst status present, `Passed` for an empty set.
pub fn aggregate_status<I>(statuses: I) -> CheckStatus
where
    I: IntoIterator<Item = CheckStatus>,
{
    statuses.into_iter().max().unwrap_or(CheckStatus::Passed)
}

/// `Σ score × weight(name)` over the given checks.
#[must_use]
pub fn overall_score(checks: &[NamedCheck], weights: &Weights) -> f64 {
    checks
        .iter()
        .map(|c| c.result.score * weights.get(&c.name))
        .sum()
}

/// Fold already-computed checks into a report.
#[must_use]
pub fn assemble(
    checks: Vec<NamedCheck>,
    weights: &Weights,
    recommendations: Vec<Recommendation>,
) -> QualityReport {
    let status = aggregate_status(checks.iter().map(|c| c.result.status));
    let score = overall_score(&checks, weights);
    let critical_issues = checks
        .iter()
        .flat_map(|c| {
            c.result
                .issues
                .iter()
                .filter(|i| i.severity == Severity::Critical)
                .map(move |i| format!("{}: {}", c.name, i.description))
        })
        .collect();

    QualityReport {
        checks,
        status,
        score,
        critical_issues,
        recommendations,
        timestamp: Utc::now(),
    }
}

/// Run every analysis-level check in declaration order and aggregate.
#[must_use]
pub fn validate(dataset: &ValidationDataset<'_>, weights: &Weights) -> QualityReport {
    let checks: Vec<NamedCheck> = CheckName::ALL
        .iter()
        .map(|name| {
            let result = rules::run(*name, dataset);
            tracing::debug!(
                check = %name,
                status = %result.status,
                score = result.score,
                issues = result.issues.len(),
                "quality check complete"
            );
            NamedCheck::new(name.as_str(), result)
        })
        .collect();

    let recommendations = recommend(&checks);
    let report = assemble(checks, weights, recommendations);
    tracing::info!(
        records = dataset.len(),
        status = %report.status,
        score = report.score,
        critical = report.critical_issues.len(),
        "dataset quality validated"
    );
    report
}

#[cfg(test)]
#[path = "validator_test.rs"]
mod tests;
