use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use hypo_quality::StatisticsSummary;

use super::*;
use crate::error::SubagentError;
use crate::trigger::Stage;

#[derive(Clone, Copy)]
enum Behavior {
    Succeed,
    Fail,
    Panic,
}

struct Fake {
    name: &'static str,
    stage: Stage,
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
}

impl Fake {
    fn boxed(name: &'static str, stage: Stage, behavior: Behavior) -> Box<dyn Subagent> {
        Box::new(Self {
            name,
            stage,
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl Subagent for Fake {
    fn name(&self) -> &'static str {
        self.name
    }

    fn should_trigger(&self, trigger: &SubagentTrigger) -> bool {
        trigger.stage == self.stage
    }

    async fn execute(&self, _input: &SubagentInput<'_>) -> Result<SubagentOutput, SubagentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Succeed => Ok(SubagentOutput::Statistics(StatisticsSummary::default())),
            Behavior::Fail => Err(SubagentError::Failed("source offline".to_string())),
            Behavior::Panic => panic!("index out of bounds"),
        }
    }
}

fn period() -> SubagentInput<'static> {
    SubagentInput::Period {
        start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        end: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        symbols: &[],
    }
}

#[test]
fn registration_keeps_order_and_replaces_in_place() {
    let mut orch = SubagentOrchestrator::new();
    orch.register(Fake::boxed("a", Stage::PreAnalysis, Behavior::Succeed));
    orch.register(Fake::boxed("b", Stage::PreAnalysis, Behavior::Succeed));
    orch.register(Fake::boxed("a", Stage::PostAnalysis, Behavior::Fail));
    assert_eq!(orch.names(), vec!["a", "b"]);
}

#[tokio::test]
async fn only_triggered_subagents_appear_in_results() {
    let mut orch = SubagentOrchestrator::new();
    orch.register(Fake::boxed("pre", Stage::PreAnalysis, Behavior::Succeed));
    orch.register(Fake::boxed("post", Stage::PostAnalysis, Behavior::Succeed));

    let results = orch
        .execute_relevant_subagents(&SubagentTrigger::at(Stage::PreAnalysis), &period())
        .await;
    assert_eq!(results.len(), 1);
    assert!(results.get("pre").is_some());
    assert!(results.get("post").is_none());
    assert!(results.statistics().is_some());
}

#[tokio::test]
async fn errors_and_panics_are_isolated() {
    let mut orch = SubagentOrchestrator::new();
    orch.register(Fake::boxed("ok", Stage::PreAnalysis, Behavior::Succeed));
    orch.register(Fake::boxed("err", Stage::PreAnalysis, Behavior::Fail));
    orch.register(Fake::boxed("boom", Stage::PreAnalysis, Behavior::Panic));

    let results = orch
        .execute_relevant_subagents(&SubagentTrigger::at(Stage::PreAnalysis), &period())
        .await;

    assert_eq!(results.len(), 3);
    assert!(!results.get("ok").unwrap().is_error());
    assert_eq!(
        results.get("err").unwrap(),
        &SubagentResult::Error {
            error: "source offline".to_string()
        }
    );
    match results.get("boom").unwrap() {
        SubagentResult::Error { error } => {
            assert_eq!(error, "subagent panicked: index out of bounds");
        }
        other => panic!("expected error entry, got {other:?}"),
    }
    assert_eq!(results.failed(), vec!["boom", "err"]);
}

#[tokio::test]
async fn only_and_disable_filters_skip_execution() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut orch = SubagentOrchestrator::new();
    orch.register(Box::new(Fake {
        name: "skipped",
        stage: Stage::PreAnalysis,
        behavior: Behavior::Succeed,
        calls: Arc::clone(&calls),
    }));
    orch.register(Fake::boxed("kept", Stage::PreAnalysis, Behavior::Succeed));
    orch.register(Fake::boxed("off", Stage::PreAnalysis, Behavior::Succeed));
    orch.set_only(["kept", "off"]);
    orch.disable("off");

    let results = orch
        .execute_relevant_subagents(&SubagentTrigger::at(Stage::PreAnalysis), &period())
        .await;
    assert_eq!(results.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>(), vec!["kept"]);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    orch.set_only(Vec::<String>::new());
    assert!(orch.is_active("skipped"));
    assert!(!orch.is_active("off"));
}

#[tokio::test]
async fn empty_orchestrator_returns_empty_results() {
    let orch = SubagentOrchestrator::new();
    let results = orch
        .execute_relevant_subagents(&SubagentTrigger::at(Stage::ReportGeneration), &period())
        .await;
    assert!(results.is_empty());
    assert!(results.validation().is_none());
    assert!(results.report().is_none());
}

#[tokio::test]
async fn repeated_calls_give_identical_results() {
    let mut orch = SubagentOrchestrator::new();
    orch.register(Fake::boxed("a", Stage::PostAnalysis, Behavior::Succeed));
    orch.register(Fake::boxed("b", Stage::PostAnalysis, Behavior::Fail));
    let trigger = SubagentTrigger::at(Stage::PostAnalysis);
    let first = orch.execute_relevant_subagents(&trigger, &period()).await;
    let second = orch.execute_relevant_subagents(&trigger, &period()).await;
    assert_eq!(first, second);
    let json = serde_json::to_value(&first).unwrap();
    assert_eq!(json["b"]["status"], "error");
    assert_eq!(json["a"]["status"], "success");
}
