//! Registry and dispatcher for subagents.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::panic::AssertUnwindSafe;

use futures::future::join_all;
use futures::FutureExt;
use hypo_quality::{QualityReport, StatisticsSummary};
use serde::Serialize;

use crate::subagent::{Subagent, SubagentInput, SubagentOutput, SubagentResult};
use crate::subagents::{GeneratedReport, MarketContext};
use crate::trigger::SubagentTrigger;

/// Results of one orchestrator call, keyed by subagent name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SubagentResults(BTreeMap<String, SubagentResult>);

impl SubagentResults {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SubagentResult> {
        self.0.get(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SubagentResult)> {
        self.0.iter()
    }

    /// Names of subagents that ended in an error entry.
    #[must_use]
    pub fn failed(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(_, r)| r.is_error())
            .map(|(n, _)| n.as_str())
            .collect()
    }

    fn outputs(&self) -> impl Iterator<Item = &SubagentOutput> {
        self.0.values().filter_map(SubagentResult::output)
    }

    #[must_use]
    pub fn validation(&self) -> Option<&QualityReport> {
        self.outputs().find_map(|o| match o {
            SubagentOutput::Validation(r) => Some(r),
            _ => None,
        })
    }

    #[must_use]
    pub fn market_context(&self) -> Option<&MarketContext> {
        self.outputs().find_map(|o| match o {
            SubagentOutput::MarketContext(c) => Some(c),
            _ => None,
        })
    }

    #[must_use]
    pub fn statistics(&self) -> Option<&StatisticsSummary> {
        self.outputs().find_map(|o| match o {
            SubagentOutput::Statistics(s) => Some(s),
            _ => None,
        })
    }

    #[must_use]
    pub fn report(&self) -> Option<&GeneratedReport> {
        self.outputs().find_map(|o| match o {
            SubagentOutput::Report(r) => Some(r),
            _ => None,
        })
    }
}

impl FromIterator<(String, SubagentResult)> for SubagentResults {
    fn from_iter<T: IntoIterator<Item = (String, SubagentResult)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Registration-ordered set of subagents plus an optional name filter.
#[derive(Default)]
pub struct SubagentOrchestrator {
    agents: Vec<Box<dyn Subagent>>,
    only: Option<BTreeSet<String>>,
    disabled: BTreeSet<String>,
}

impl SubagentOrchestrator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subagent. Re-registering a name replaces the earlier entry in place.
    pub fn register(&mut self, agent: Box<dyn Subagent>) {
        let name = agent.name();
        if let Some(slot) = self.agents.iter_mut().find(|a| a.name() == name) {
            tracing::info!(subagent = name, "replaced subagent");
            *slot = agent;
        } else {
            tracing::info!(subagent = name, "registered subagent");
            self.agents.push(agent);
        }
    }

    /// Restrict execution to the named subagents. An empty list clears the restriction.
    pub fn set_only<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        self.only = if set.is_empty() { None } else { Some(set) };
    }

    pub fn disable(&mut self, name: impl Into<String>) {
        self.disabled.insert(name.into());
    }

    /// Registered names in registration order, including filtered-out ones.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.agents.iter().map(|a| a.name()).collect()
    }

    #[must_use]
    pub fn is_active(&self, name: &str) -> bool {
        !self.disabled.contains(name) && self.only.as_ref().map_or(true, |o| o.contains(name))
    }

    /// Run every active subagent whose trigger matches and collect the results.
    ///
    /// Matching subagents run concurrently. An `Err` or a panic from one of
    /// them becomes an error entry under its name; nothing propagates to the
    /// caller.
    pub async fn execute_relevant_subagents(
        &self,
        trigger: &SubagentTrigger,
        input: &SubagentInput<'_>,
    ) -> SubagentResults {
        let selected: Vec<&dyn Subagent> = self
            .agents
            .iter()
            .filter(|a| self.is_active(a.name()) && a.should_trigger(trigger))
            .map(|a| &**a)
            .collect();

        if selected.is_empty() {
            tracing::debug!(stage = %trigger.stage, "no subagents triggered");
            return SubagentResults::default();
        }

        let runs = selected.iter().map(|agent| async move {
            let name = agent.name();
            tracing::info!(subagent = name, stage = %trigger.stage, "triggering subagent");
            let outcome = AssertUnwindSafe(agent.execute(input)).catch_unwind().await;
            let result = match outcome {
                Ok(Ok(output)) => {
                    tracing::info!(subagent = name, "subagent completed");
                    SubagentResult::Success(output)
                }
                Ok(Err(err)) => {
                    tracing::error!(subagent = name, error = %err, "subagent failed");
                    SubagentResult::Error {
                        error: err.to_string(),
                    }
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    tracing::error!(subagent = name, error = %message, "subagent panicked");
                    SubagentResult::Error {
                        error: format!("subagent panicked: {message}"),
                    }
                }
            };
            (name.to_string(), result)
        });

        join_all(runs).await.into_iter().collect()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
