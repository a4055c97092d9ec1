use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Collected data changed since the last validation.
pub const DATA_UPDATED: &str = "data_updated";

/// Pipeline points at which subagents may be invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    QuarterlyReview,
    PreAnalysis,
    PreStockAnalysis,
    PostAnalysis,
    ReportGeneration,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::QuarterlyReview => "quarterly_review",
            Stage::PreAnalysis => "pre_analysis",
            Stage::PreStockAnalysis => "pre_stock_analysis",
            Stage::PostAnalysis => "post_analysis",
            Stage::ReportGeneration => "report_generation",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context handed to every `should_trigger` call: the stage plus any named
/// auxiliary flags the caller wants subagents to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubagentTrigger {
    pub stage: Stage,
    flags: BTreeSet<String>,
}

impl SubagentTrigger {
    #[must_use]
    pub fn at(stage: Stage) -> Self {
        Self {
            stage,
            flags: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_flag(mut self, name: impl Into<String>) -> Self {
        self.flags.insert(name.into());
        self
    }

    #[must_use]
    pub fn with_data_updated(self) -> Self {
        self.with_flag(DATA_UPDATED)
    }

    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        self.flags.contains(name)
    }

    #[must_use]
    pub fn data_updated(&self) -> bool {
        self.flag(DATA_UPDATED)
    }

    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Stage::PreStockAnalysis).unwrap(),
            "\"pre_stock_analysis\""
        );
        assert_eq!(Stage::ReportGeneration.to_string(), "report_generation");
    }

    #[test]
    fn data_updated_flag_is_opt_in() {
        assert!(!SubagentTrigger::at(Stage::PostAnalysis).data_updated());
        assert!(SubagentTrigger::at(Stage::PostAnalysis).with_data_updated().data_updated());
    }

    #[test]
    fn arbitrary_flags_are_kept_sorted_and_deduplicated() {
        let trigger = SubagentTrigger::at(Stage::ReportGeneration)
            .with_flag("rerun")
            .with_data_updated()
            .with_flag("rerun");
        assert!(trigger.flag("rerun"));
        assert!(!trigger.flag("backfill"));
        assert_eq!(trigger.flags().collect::<Vec<_>>(), vec!["data_updated", "rerun"]);
        assert_eq!(trigger.stage, Stage::ReportGeneration);
    }
}
