//! Renders the final Markdown summary from whatever the earlier stages produced.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SubagentError;
use crate::subagent::{Subagent, SubagentInput, SubagentOutput};
use crate::summary::render_summary;
use crate::trigger::{Stage, SubagentTrigger};

pub const REPORT_GENERATOR: &str = "report_generator";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedReport {
    pub title: String,
    pub markdown: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportGenerator;

impl ReportGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subagent for ReportGenerator {
    fn name(&self) -> &'static str {
        REPORT_GENERATOR
    }

    fn should_trigger(&self, trigger: &SubagentTrigger) -> bool {
        trigger.stage == Stage::ReportGeneration
    }

    async fn execute(&self, input: &SubagentInput<'_>) -> Result<SubagentOutput, SubagentError> {
        let SubagentInput::Reporting(report) = input else {
            return Err(SubagentError::UnsupportedInput {
                agent: REPORT_GENERATOR,
                received: input.kind(),
            });
        };
        let markdown = render_summary(report);
        tracing::info!(bytes = markdown.len(), "summary report rendered");
        Ok(SubagentOutput::Report(GeneratedReport {
            title: format!("{} Results", report.config.name),
            markdown,
        }))
    }
}
