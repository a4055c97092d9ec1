//! Stage-triggered subagents and the orchestrator that runs them.
//!
//! A [`Subagent`] declares which pipeline [`Stage`]s it reacts to and does
//! its work in [`Subagent::execute`]. The [`SubagentOrchestrator`] runs every
//! matching subagent for a trigger, isolates failures and panics per
//! subagent, and returns the results keyed by name.

pub mod error;
pub mod orchestrator;
pub mod stats;
pub mod subagent;
pub mod subagents;
pub mod summary;
pub mod trigger;

pub use error::SubagentError;
pub use orchestrator::{SubagentOrchestrator, SubagentResults};
pub use subagent::{ReportInput, Subagent, SubagentInput, SubagentOutput, SubagentResult};
pub use subagents::{
    DataValidator, GeneratedReport, ImpactTier, MarketContext, MarketContextAgent, MarketEvent,
    MarketTrend, ReportGenerator, StatisticalAnalyzer, DATA_VALIDATOR, MARKET_CONTEXT,
    REPORT_GENERATOR,
};
pub use summary::{render_summary, write_summary};
pub use trigger::{Stage, SubagentTrigger, DATA_UPDATED};

pub use hypo_core::experiment::STATISTICAL_ANALYZER;
