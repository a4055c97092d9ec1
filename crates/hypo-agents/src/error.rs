use hypo_sources::SourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubagentError {
    /// The orchestrator handed the subagent a payload meant for another stage.
    #[error("{agent} cannot handle {received} input")]
    UnsupportedInput {
        agent: &'static str,
        received: &'static str,
    },

    #[error("market data unavailable: {0}")]
    Source(#[from] SourceError),

    #[error("{0}")]
    Failed(String),
}
