use std::collections::BTreeMap;
use std::path::PathBuf;

use hypo_agents::{Stage, SubagentResults};
use hypo_quality::QualityReport;
use hypo_sources::SourceError;
use thiserror::Error;

use crate::stage::RunStage;

/// Failure writing one artifact.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {what}: {source}")]
    Serialize {
        what: String,
        #[source]
        source: serde_json::Error,
    },
}

impl OutputError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Fatal pipeline errors.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("missing required environment variables: {}", .missing.join(", "))]
    Environment { missing: Vec<String> },

    #[error("failed to fetch {what}: {source}")]
    Fetch {
        what: String,
        #[source]
        source: SourceError,
    },

    #[error(
        "data validation failed with score {:.1}%: {}",
        .report.score * 100.0,
        .report.critical_issues.join("; ")
    )]
    ValidationFailed { report: Box<QualityReport> },

    #[error("failed to initialise {component}: {reason}")]
    Setup { component: String, reason: String },

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// A run that ended in the FAILED state.
///
/// `stage` is the last state reached before the failure. Subagent results
/// gathered up to that point are preserved.
#[derive(Debug, Error)]
#[error("experiment failed after {stage}: {error}")]
pub struct RunFailure {
    pub stage: RunStage,
    #[source]
    pub error: RunError,
    pub subagent_results: BTreeMap<Stage, SubagentResults>,
}
