//! Experiment runner: drives one hypothesis-verification run from a loaded
//! template to written artifacts.
//!
//! [`ExperimentRunner::run`] walks the [`RunStage`] state machine, invoking
//! the subagent orchestrator at each stage boundary. Any fatal step moves the
//! run to `Failed` and surfaces a [`RunFailure`].

pub mod analysis;
pub mod collaborators;
pub mod error;
pub mod output;
pub mod review;
pub mod runner;
pub mod stage;

pub use collaborators::{standard_orchestrator, Collaborators};
pub use error::{OutputError, RunError, RunFailure};
pub use runner::{
    audit_records, describe_plan, experiment_slug, ExperimentRunner, RunOptions, RunSummary,
    QUALITY_REPORT_JSON, QUALITY_REPORT_MD,
};
pub use stage::RunStage;
