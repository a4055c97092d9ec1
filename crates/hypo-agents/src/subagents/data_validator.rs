//! Structural checks over freshly collected posts and bars.
//!
//! Runs before classification and gates the pipeline: a FAILED report here
//! halts the run.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::Duration;
use hypo_core::{MarketData, Post};
use hypo_quality::{
    assemble, ratio, CheckResult, CheckStatus, Issue, NamedCheck, Priority, QualityReport,
    Recommendation, Severity, Weights,
};

use crate::error::SubagentError;
use crate::subagent::{Subagent, SubagentInput, SubagentOutput};
use crate::trigger::{Stage, SubagentTrigger};

pub const DATA_VALIDATOR: &str = "data_validator";

const REQUIRED_POST_FIELDS: usize = 4;
/// A post counts as matched when a bar exists within this window after it.
const MATCH_WINDOW_HOURS: i64 = 96;
const UNMATCHED_LIMIT: f64 = 0.10;

#[derive(Debug, Clone, Default)]
pub struct DataValidator {
    weights: Option<Weights>,
}

impl DataValidator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_weights(weights: Weights) -> Self {
        Self {
            weights: Some(weights),
        }
    }

    fn weights(&self) -> Weights {
        self.weights.clone().unwrap_or_else(|| {
            Weights::new([
                ("completeness", 0.25),
                ("quality", 0.25),
                ("api_data", 0.25),
                ("cross_reference", 0.25),
            ])
        })
    }

    /// Run the four structural checks and fold them into a report.
    #[must_use]
    pub fn validate(&self, posts: &[Post], market: &MarketData, symbols: &[String]) -> QualityReport {
        let checks = vec![
            NamedCheck::new("completeness", check_completeness(posts)),
            NamedCheck::new("quality", check_duplicates(posts)),
            NamedCheck::new("api_data", check_api_data(market, symbols)),
            NamedCheck::new("cross_reference", check_cross_reference(posts, market)),
        ];
        let recommendations = recommendations(&checks);
        let report = assemble(checks, &self.weights(), recommendations);
        tracing::info!(
            posts = posts.len(),
            bars = market.total_bars(),
            status = %report.status,
            score = report.score,
            "collected data validated"
        );
        report
    }
}

#[async_trait]
impl Subagent for DataValidator {
    fn name(&self) -> &'static str {
        DATA_VALIDATOR
    }

    fn should_trigger(&self, trigger: &SubagentTrigger) -> bool {
        trigger.stage == Stage::PreAnalysis || trigger.data_updated()
    }

    async fn execute(&self, input: &SubagentInput<'_>) -> Result<SubagentOutput, SubagentError> {
        let SubagentInput::Collected {
            posts,
            market,
            symbols,
        } = input
        else {
            return Err(SubagentError::UnsupportedInput {
                agent: DATA_VALIDATOR,
                received: input.kind(),
            });
        };
        Ok(SubagentOutput::Validation(self.validate(posts, market, symbols)))
    }
}

fn check_completeness(posts: &[Post]) -> CheckResult {
    if posts.is_empty() {
        return CheckResult::new(
            CheckStatus::Failed,
            vec![Issue::new(Severity::Critical, "No posts were collected")],
            0.0,
        );
    }

    let missing: usize = posts
        .iter()
        .map(|p| {
            [
                p.id.trim().is_empty(),
                p.text.trim().is_empty(),
                p.timestamp.is_none(),
                p.author.trim().is_empty(),
            ]
            .iter()
            .filter(|m| **m)
            .count()
        })
        .sum();
    let total = posts.len() * REQUIRED_POST_FIELDS;
    let score = ratio(total - missing, total);

    if missing == 0 {
        return CheckResult::new(CheckStatus::Passed, vec![], score);
    }
    CheckResult::new(
        CheckStatus::Warning,
        vec![Issue::new(
            Severity::Medium,
            format!(
                "{missing} missing field instance(s) across {} posts ({:.1}% coverage)",
                posts.len(),
                score * 100.0
            ),
        )
        .with_impact("Posts without a timestamp cannot be joined with price data")],
        score,
    )
}

fn check_duplicates(posts: &[Post]) -> CheckResult {
    let mut seen = BTreeSet::new();
    let duplicates = posts.iter().filter(|p| !seen.insert(p.id.as_str())).count();
    if duplicates == 0 {
        return CheckResult::new(CheckStatus::Passed, vec![], 1.0);
    }
    CheckResult::new(
        CheckStatus::Warning,
        vec![Issue::new(
            Severity::Medium,
            format!("{duplicates} duplicate post(s) detected"),
        )],
        ratio(posts.len() - duplicates, posts.len()),
    )
}

fn check_api_data(market: &MarketData, symbols: &[String]) -> CheckResult {
    let expected: Vec<&str> = if symbols.is_empty() {
        market.bars.keys().map(String::as_str).collect()
    } else {
        symbols.iter().map(String::as_str).collect()
    };
    let with_bars: Vec<&str> = expected
        .iter()
        .copied()
        .filter(|s| !market.bars_for(s).is_empty())
        .collect();

    if with_bars.is_empty() {
        return CheckResult::new(
            CheckStatus::Failed,
            vec![Issue::new(
                Severity::Critical,
                "No market data bars were returned for any symbol",
            )
            .with_impact("Price impacts cannot be computed")],
            0.0,
        );
    }

    let mut issues = Vec::new();
    let empty: Vec<&str> = expected
        .iter()
        .copied()
        .filter(|s| !with_bars.contains(s))
        .collect();
    if !empty.is_empty() {
        issues.push(Issue::new(
            Severity::High,
            format!("No bars returned for {}", empty.join(", ")),
        ));
    }

    let total_bars = market.total_bars();
    let malformed = market
        .bars
        .values()
        .flatten()
        .filter(|b| !b.is_well_formed())
        .count();
    if malformed > 0 {
        issues.push(Issue::new(
            Severity::Medium,
            format!("{malformed} of {total_bars} bars have inconsistent OHLC values"),
        ));
    }

    let score = ratio(with_bars.len(), expected.len()) * ratio(total_bars - malformed, total_bars);
    let status = if issues.is_empty() {
        CheckStatus::Passed
    } else {
        CheckStatus::Warning
    };
    CheckResult::new(status, issues, score)
}

fn check_cross_reference(posts: &[Post], market: &MarketData) -> CheckResult {
    if posts.is_empty() {
        return CheckResult::new(
            CheckStatus::Warning,
            vec![Issue::new(Severity::Medium, "No posts to cross-reference")],
            0.0,
        );
    }

    let window = Duration::hours(MATCH_WINDOW_HOURS);
    let matched = posts
        .iter()
        .filter(|p| {
            p.timestamp.is_some_and(|ts| {
                market.bars.values().any(|bars| {
                    bars.iter()
                        .any(|b| b.timestamp >= ts && b.timestamp <= ts + window)
                })
            })
        })
        .count();
    let unmatched = posts.len() - matched;
    let score = ratio(matched, posts.len());

    if ratio(unmatched, posts.len()) < UNMATCHED_LIMIT {
        return CheckResult::new(CheckStatus::Passed, vec![], score);
    }
    CheckResult::new(
        CheckStatus::Warning,
        vec![Issue::new(
            Severity::Medium,
            format!("{unmatched} of {} posts have no market bar within {MATCH_WINDOW_HOURS}h", posts.len()),
        )],
        score,
    )
}

fn recommendations(checks: &[NamedCheck]) -> Vec<Recommendation> {
    let status = |name: &str| {
        checks
            .iter()
            .find(|c| c.name == name)
            .map_or(CheckStatus::Passed, |c| c.result.status)
    };
    let mut out = Vec::new();

    if status("api_data") != CheckStatus::Passed {
        out.push(Recommendation {
            priority: if status("api_data") == CheckStatus::Failed {
                Priority::Critical
            } else {
                Priority::High
            },
            action: "Fix market data integration".to_string(),
            steps: vec![
                "Verify market data API credentials".to_string(),
                "Confirm every symbol traded during the date range".to_string(),
            ],
            expected_outcome: Some("Bars available for every tracked symbol".to_string()),
        });
    }
    if status("completeness") != CheckStatus::Passed {
        out.push(Recommendation {
            priority: Priority::High,
            action: "Repair incomplete posts".to_string(),
            steps: vec![
                "Check the scraper's timestamp format".to_string(),
                "Drop or re-fetch posts missing required fields".to_string(),
            ],
            expected_outcome: Some("Every post carries id, text, timestamp and author".to_string()),
        });
    }
    if status("quality") != CheckStatus::Passed {
        out.push(Recommendation {
            priority: Priority::Medium,
            action: "Remove duplicate posts".to_string(),
            steps: vec!["De-duplicate posts by id before analysis".to_string()],
            expected_outcome: None,
        });
    }
    if status("cross_reference") != CheckStatus::Passed {
        out.push(Recommendation {
            priority: Priority::Medium,
            action: "Investigate unmatched records between social and market data".to_string(),
            steps: vec![
                "Extend the market data window past the last post".to_string(),
                "Check for posts made on market holidays".to_string(),
            ],
            expected_outcome: None,
        });
    }

    out.sort_by_key(|r| r.priority);
    out
}

#[cfg(test)]
#[path = "data_validator_test.rs"]
mod tests;
