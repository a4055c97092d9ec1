use async_trait::async_trait;
use chrono::NaiveDate;
use hypo_core::{AnalysisRecord, ExperimentConfig, MarketData, Post};
use hypo_quality::{QualityReport, StatisticsSummary};
use serde::Serialize;

use crate::error::SubagentError;
use crate::subagents::{GeneratedReport, MarketContext};
use crate::trigger::SubagentTrigger;

/// Everything the report stage can draw on.
#[derive(Debug, Clone, Copy)]
pub struct ReportInput<'a> {
    pub config: &'a ExperimentConfig,
    pub records: &'a [AnalysisRecord],
    pub validation: Option<&'a QualityReport>,
    pub context: Option<&'a MarketContext>,
    pub statistics: Option<&'a StatisticsSummary>,
    pub subagents_enabled: bool,
}

/// Stage payload passed to [`Subagent::execute`].
#[derive(Debug, Clone, Copy)]
pub enum SubagentInput<'a> {
    /// Raw fetch results, before any classification.
    Collected {
        posts: &'a [Post],
        market: &'a MarketData,
        symbols: &'a [String],
    },
    /// The analysis window and the symbols being tracked.
    Period {
        start: NaiveDate,
        end: NaiveDate,
        symbols: &'a [String],
    },
    Analysis {
        records: &'a [AnalysisRecord],
        config: &'a ExperimentConfig,
    },
    Reporting(ReportInput<'a>),
    Review { config: &'a ExperimentConfig },
}

impl SubagentInput<'_> {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            SubagentInput::Collected { .. } => "collected",
            SubagentInput::Period { .. } => "period",
            SubagentInput::Analysis { .. } => "analysis",
            SubagentInput::Reporting(_) => "reporting",
            SubagentInput::Review { .. } => "review",
        }
    }
}

/// Typed success payloads, one shape per subagent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SubagentOutput {
    Validation(QualityReport),
    MarketContext(MarketContext),
    Statistics(StatisticsSummary),
    Report(GeneratedReport),
}

/// One subagent's outcome as recorded by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SubagentResult {
    Success(SubagentOutput),
    Error { error: String },
}

impl SubagentResult {
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, SubagentResult::Error { .. })
    }

    #[must_use]
    pub fn output(&self) -> Option<&SubagentOutput> {
        match self {
            SubagentResult::Success(output) => Some(output),
            SubagentResult::Error { .. } => None,
        }
    }
}

/// A stage-triggered unit of validation or enrichment work.
#[async_trait]
pub trait Subagent: Send + Sync {
    /// Registry key; unique within an orchestrator.
    fn name(&self) -> &'static str;

    /// Pure predicate over the trigger.
    fn should_trigger(&self, trigger: &SubagentTrigger) -> bool;

    async fn execute(&self, input: &SubagentInput<'_>) -> Result<SubagentOutput, SubagentError>;
}
