//! Dataset quality scoring.
//!
//! Each rule in [`rules`] turns a [`ValidationDataset`] into a [`CheckResult`];
//! [`validate`] runs them in a fixed order, folds them into a weighted score and
//! attaches remediation advice. Nothing here performs I/O.

pub mod dataset;
pub mod recommendations;
pub mod report;
pub mod rules;
pub mod types;
pub mod validator;

#[cfg(test)]
mod fixtures;

pub use dataset::{MethodologyDisclosure, SignificanceTest, StatisticsSummary, ValidationDataset};
pub use recommendations::recommend;
pub use report::{parse_score, render_markdown, write_report};
pub use rules::ratio;
pub use types::{
    CheckName, CheckResult, CheckStatus, Issue, NamedCheck, Priority, QualityReport,
    Recommendation, Severity,
};
pub use validator::{aggregate_status, assemble, overall_score, validate, Weights};
