use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one check. Ordered so that `max` yields the worst status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Passed,
    Warning,
    Failed,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckStatus::Passed => write!(f, "PASSED"),
            CheckStatus::Warning => write!(f, "WARNING"),
            CheckStatus::Failed => write!(f, "FAILED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
}

impl Issue {
    pub fn new(severity: Severity, description: impl Into<String>) -> Self {
        Self {
            severity,
            description: description.into(),
            impact: None,
        }
    }

    #[must_use]
    pub fn with_impact(mut self, impact: impl Into<String>) -> Self {
        self.impact = Some(impact.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub status: CheckStatus,
    pub issues: Vec<Issue>,
    /// Normalized sub-score in `[0.0, 1.0]`.
    pub score: f64,
}

impl CheckResult {
    #[must_use]
    pub fn passed() -> Self {
        Self {
            status: CheckStatus::Passed,
            issues: Vec::new(),
            score: 1.0,
        }
    }

    #[must_use]
    pub fn new(status: CheckStatus, issues: Vec<Issue>, score: f64) -> Self {
        Self {
            status,
            issues,
            score: score.clamp(0.0, 1.0),
        }
    }
}

/// The analysis-level checks, in the order they always run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckName {
    Completeness,
    Consistency,
    StatisticalValidity,
    TemporalCoverage,
    SourceIntegration,
    SampleSize,
    Methodology,
}

impl CheckName {
    pub const ALL: [CheckName; 7] = [
        CheckName::Completeness,
        CheckName::Consistency,
        CheckName::StatisticalValidity,
        CheckName::TemporalCoverage,
        CheckName::SourceIntegration,
        CheckName::SampleSize,
        CheckName::Methodology,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CheckName::Completeness => "completeness",
            CheckName::Consistency => "consistency",
            CheckName::StatisticalValidity => "statistical_validity",
            CheckName::TemporalCoverage => "temporal_coverage",
            CheckName::SourceIntegration => "source_integration",
            CheckName::SampleSize => "sample_size",
            CheckName::Methodology => "methodology",
        }
    }
}

impl std::fmt::Display for CheckName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedCheck {
    pub name: String,
    #[serde(flatten)]
    pub result: CheckResult,
}

impl NamedCheck {
    pub fn new(name: impl Into<String>, result: CheckResult) -> Self {
        Self {
            name: name.into(),
            result,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Critical,
    High,
    Medium,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Critical => write!(f, "CRITICAL"),
            Priority::High => write!(f, "HIGH"),
            Priority::Medium => write!(f, "MEDIUM"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub action: String,
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_outcome: Option<String>,
}

/// Aggregate verdict over a set of checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Checks in the order they ran.
    pub checks: Vec<NamedCheck>,
    pub status: CheckStatus,
    /// Weighted sum of sub-scores. Not renormalized, so weights summing above
    /// one can push it past `1.0`.
    pub score: f64,
    pub critical_issues: Vec<String>,
    pub recommendations: Vec<Recommendation>,
    pub timestamp: DateTime<Utc>,
}

impl QualityReport {
    #[must_use]
    pub fn check(&self, name: &str) -> Option<&CheckResult> {
        self.checks
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.result)
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.status == CheckStatus::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_ordering_puts_failed_last() {
        assert!(CheckStatus::Failed > CheckStatus::Warning);
        assert!(CheckStatus::Warning > CheckStatus::Passed);
    }

    #[test]
    fn check_result_clamps_score() {
        assert!((CheckResult::new(CheckStatus::Warning, vec![], -0.4).score).abs() < f64::EPSILON);
        assert!((CheckResult::new(CheckStatus::Passed, vec![], 1.7).score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn named_check_serializes_flat() {
        let check = NamedCheck::new(
            "consistency",
            CheckResult::new(
                CheckStatus::Warning,
                vec![Issue::new(Severity::Medium, "Missing BEARISH bucket")],
                0.7,
            ),
        );
        let value = serde_json::to_value(&check).unwrap();
        assert_eq!(value["name"], "consistency");
        assert_eq!(value["status"], "WARNING");
        assert_eq!(value["issues"][0]["severity"], "MEDIUM");
        assert!(value["issues"][0].get("impact").is_none());
    }
}
