use serde::Serialize;

/// Runner state machine. Every state can move to [`RunStage::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Loaded,
    EnvValidated,
    DataCollected,
    Validated,
    ContextEnriched,
    Classified,
    Analyzed,
    Reported,
    Done,
    Failed,
}

impl RunStage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunStage::Loaded => "loaded",
            RunStage::EnvValidated => "env_validated",
            RunStage::DataCollected => "data_collected",
            RunStage::Validated => "validated",
            RunStage::ContextEnriched => "context_enriched",
            RunStage::Classified => "classified",
            RunStage::Analyzed => "analyzed",
            RunStage::Reported => "reported",
            RunStage::Done => "done",
            RunStage::Failed => "failed",
        }
    }

    /// The state a successful step moves to. `Done` and `Failed` are terminal.
    #[must_use]
    pub fn next(self) -> Option<RunStage> {
        match self {
            RunStage::Loaded => Some(RunStage::EnvValidated),
            RunStage::EnvValidated => Some(RunStage::DataCollected),
            RunStage::DataCollected => Some(RunStage::Validated),
            RunStage::Validated => Some(RunStage::ContextEnriched),
            RunStage::ContextEnriched => Some(RunStage::Classified),
            RunStage::Classified => Some(RunStage::Analyzed),
            RunStage::Analyzed => Some(RunStage::Reported),
            RunStage::Reported => Some(RunStage::Done),
            RunStage::Done | RunStage::Failed => None,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl std::fmt::Display for RunStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_walks_every_state_in_order() {
        let mut stage = RunStage::Loaded;
        let mut seen = vec![stage];
        while let Some(next) = stage.next() {
            assert!(next > stage);
            seen.push(next);
            stage = next;
        }
        assert_eq!(seen.len(), 9);
        assert_eq!(stage, RunStage::Done);
    }

    #[test]
    fn failed_is_terminal() {
        assert!(RunStage::Failed.is_terminal());
        assert!(!RunStage::Analyzed.is_terminal());
        assert_eq!(RunStage::EnvValidated.to_string(), "env_validated");
    }
}
