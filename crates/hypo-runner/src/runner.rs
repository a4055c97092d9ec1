//! The end-to-end experiment pipeline.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Days, Duration, NaiveTime, Utc};
use hypo_agents::{
    render_summary, ReportInput, Stage, SubagentInput, SubagentOrchestrator, SubagentResults,
    SubagentTrigger,
};
use hypo_core::{
    AnalysisRecord, AppConfig, ClassificationResult, ClassificationSource, ExperimentConfig,
    ExportKind, ExportSpec, MarketData, Post, ReportSpec,
};
use hypo_quality::{
    render_markdown, validate, CheckStatus, QualityReport, ValidationDataset, Weights,
};
use hypo_sentiment::{build_prompt, prompt::TEXT_PLACEHOLDER, FallbackClassifier};
use hypo_sources::{filter_posts, MarketDataSource, PostQuery, PostSource};
use serde::Serialize;
use uuid::Uuid;

use crate::analysis::build_record;
use crate::collaborators::Collaborators;
use crate::error::{RunError, RunFailure};
use crate::output::{records_to_csv, Artifact, ArtifactWriter};
use crate::review;
use crate::stage::RunStage;

pub const QUALITY_REPORT_JSON: &str = "quality_report.json";
pub const QUALITY_REPORT_MD: &str = "quality_report.md";

/// Where a run writes and whether subagents take part.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Root output directory; artifacts land in a per-experiment subdirectory.
    pub output_root: PathBuf,
    pub subagents_enabled: bool,
}

impl RunOptions {
    #[must_use]
    pub fn from_app_config(app: &AppConfig) -> Self {
        Self {
            output_root: app.output_dir.clone(),
            subagents_enabled: true,
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub status: RunStage,
    pub experiment: String,
    pub posts_analyzed: usize,
    pub output_dir: PathBuf,
    pub quality_status: CheckStatus,
    pub quality_score: f64,
    pub artifacts: Vec<Artifact>,
    pub subagent_results: BTreeMap<Stage, SubagentResults>,
}

/// Directory name for an experiment: lower-cased, whitespace to `_`,
/// anything outside `[a-z0-9_-]` dropped.
#[must_use]
pub fn experiment_slug(name: &str) -> String {
    let slug: String = name
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            c if c.is_whitespace() => Some('_'),
            c if c.is_ascii_alphanumeric() || c == '_' || c == '-' => Some(c),
            _ => None,
        })
        .collect();
    if slug.is_empty() {
        "experiment".to_string()
    } else {
        slug
    }
}

/// Drives one experiment through the [`RunStage`] state machine.
pub struct ExperimentRunner {
    run_id: Uuid,
    config: ExperimentConfig,
    app: AppConfig,
    posts: Arc<dyn PostSource>,
    market: Arc<dyn MarketDataSource>,
    classifier: FallbackClassifier,
    orchestrator: SubagentOrchestrator,
    options: RunOptions,
    stage: RunStage,
    results: BTreeMap<Stage, SubagentResults>,
}

impl ExperimentRunner {
    #[must_use]
    pub fn new(
        config: ExperimentConfig,
        app: AppConfig,
        collaborators: Collaborators,
        orchestrator: SubagentOrchestrator,
        options: RunOptions,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            config,
            app,
            posts: collaborators.posts,
            market: collaborators.market,
            classifier: collaborators.classifier,
            orchestrator,
            options,
            stage: RunStage::Loaded,
            results: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    #[must_use]
    pub fn stage(&self) -> RunStage {
        self.stage
    }

    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.options
            .output_root
            .join(experiment_slug(&self.config.name))
    }

    fn advance(&mut self, next: RunStage) {
        tracing::info!(from = %self.stage, to = %next, experiment = %self.config.name, "stage complete");
        self.stage = next;
    }

    fn fail(&mut self, error: RunError) -> RunFailure {
        tracing::error!(stage = %self.stage, error = %error, "experiment failed");
        let failure = RunFailure {
            stage: self.stage,
            error,
            subagent_results: std::mem::take(&mut self.results),
        };
        self.stage = RunStage::Failed;
        failure
    }

    async fn invoke(&mut self, trigger: SubagentTrigger, input: &SubagentInput<'_>) -> SubagentResults {
        let results = self
            .orchestrator
            .execute_relevant_subagents(&trigger, input)
            .await;
        for name in results.failed() {
            tracing::warn!(subagent = name, stage = %trigger.stage, "subagent reported an error");
        }
        if !results.is_empty() {
            self.results.insert(trigger.stage, results.clone());
        }
        results
    }

    async fn pause(&self) {
        let delay = self.app.inter_call_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Run every stage in order.
    ///
    /// # Errors
    ///
    /// Returns [`RunFailure`] carrying the last stage reached and the cause
    /// when any fatal step fails.
    pub async fn run(&mut self) -> Result<RunSummary, RunFailure> {
        tracing::info!(run_id = %self.run_id, experiment = %self.config.name, "starting experiment");

        let missing = self
            .app
            .credentials
            .missing(&self.config.required_env_vars);
        if !missing.is_empty() {
            return Err(self.fail(RunError::Environment { missing }));
        }
        self.advance(RunStage::EnvValidated);

        self.quarterly_review(Utc::now()).await;

        let (posts, market) = match self.collect().await {
            Ok(data) => data,
            Err(e) => return Err(self.fail(e)),
        };
        self.advance(RunStage::DataCollected);

        let symbols = self.config.market.symbols.clone();
        let validation = self
            .invoke(
                SubagentTrigger::at(Stage::PreAnalysis).with_data_updated(),
                &SubagentInput::Collected {
                    posts: &posts,
                    market: &market,
                    symbols: &symbols,
                },
            )
            .await;
        if let Some(report) = validation.validation() {
            if report.is_failed() {
                let report = Box::new(report.clone());
                return Err(self.fail(RunError::ValidationFailed { report }));
            }
        }
        self.advance(RunStage::Validated);

        self.invoke(
            SubagentTrigger::at(Stage::PreStockAnalysis),
            &SubagentInput::Period {
                start: self.config.social.start,
                end: self.config.social.end,
                symbols: &symbols,
            },
        )
        .await;
        self.advance(RunStage::ContextEnriched);

        let classified = self.classify(posts).await;
        self.advance(RunStage::Classified);

        let config = self.config.clone();
        let records: Vec<AnalysisRecord> = classified
            .into_iter()
            .map(|(post, classification)| build_record(post, classification, &market, &config))
            .collect();
        if config.wants_statistical_analysis() {
            self.invoke(
                SubagentTrigger::at(Stage::PostAnalysis),
                &SubagentInput::Analysis {
                    records: &records,
                    config: &config,
                },
            )
            .await;
        }

        let mut writer = match ArtifactWriter::create(self.output_dir()) {
            Ok(w) => w,
            Err(e) => return Err(self.fail(e.into())),
        };
        let quality = self.audit(&records, &mut writer);
        self.advance(RunStage::Analyzed);

        self.report(&records, &mut writer).await;
        self.export(&records, &mut writer);
        if let Err(e) = writer.finish(self.run_id, &config.name) {
            tracing::error!(error = %e, "failed to write manifest");
        }
        self.advance(RunStage::Reported);

        self.advance(RunStage::Done);
        Ok(RunSummary {
            run_id: self.run_id,
            status: RunStage::Done,
            experiment: config.name.clone(),
            posts_analyzed: records.len(),
            output_dir: writer.dir().to_path_buf(),
            quality_status: quality.status,
            quality_score: quality.score,
            artifacts: writer.artifacts().to_vec(),
            subagent_results: std::mem::take(&mut self.results),
        })
    }

    /// Invoke the `quarterly_review` stage when the marker is stale. The
    /// marker is refreshed only after at least one review subagent ran and
    /// none failed. Never fatal.
    async fn quarterly_review(&mut self, now: DateTime<Utc>) {
        if !self.options.subagents_enabled {
            return;
        }
        let root = self.options.output_root.clone();
        if !review::review_due(&root, now) {
            tracing::debug!("quarterly review not due");
            return;
        }
        tracing::info!(marker = %review::marker_path(&root).display(), "quarterly review due");
        let config = self.config.clone();
        let results = self
            .invoke(
                SubagentTrigger::at(Stage::QuarterlyReview),
                &SubagentInput::Review { config: &config },
            )
            .await;
        if results.is_empty() || !results.failed().is_empty() {
            tracing::debug!(ran = results.len(), "review marker left unchanged");
            return;
        }
        if let Err(e) = review::record_review(&root, now) {
            tracing::warn!(error = %e, "failed to refresh review marker");
        }
    }

    async fn collect(&self) -> Result<(Vec<Post>, MarketData), RunError> {
        let social = &self.config.social;
        let fetched = self
            .posts
            .fetch_posts(&PostQuery::from_config(social))
            .await
            .map_err(|source| RunError::Fetch {
                what: format!("{} posts", social.platform),
                source,
            })?;
        let fetched_count = fetched.len();
        let posts = filter_posts(fetched, &social.keywords, social.max_posts);
        tracing::info!(fetched = fetched_count, kept = posts.len(), "posts collected");

        let (start, end) = self.bar_window();
        let mut market = MarketData::default();
        for (i, symbol) in self.config.market.symbols.iter().enumerate() {
            if i > 0 {
                self.pause().await;
            }
            let bars = self
                .market
                .fetch_bars(symbol, start, end)
                .await
                .map_err(|source| RunError::Fetch {
                    what: format!("{symbol} bars"),
                    source,
                })?;
            tracing::info!(symbol = %symbol, bars = bars.len(), "bars collected");
            market.insert(symbol.clone(), bars);
        }
        Ok((posts, market))
    }

    /// Bars are fetched from the start date through the end date plus the
    /// longest impact interval, so late posts can still be measured.
    fn bar_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let social = &self.config.social;
        let start = social.start.and_time(NaiveTime::MIN).and_utc();
        let end_of_range = social
            .end
            .checked_add_days(Days::new(1))
            .unwrap_or(social.end)
            .and_time(NaiveTime::MIN)
            .and_utc();
        let longest = self
            .config
            .analysis
            .time_intervals
            .iter()
            .copied()
            .max()
            .unwrap_or(0);
        (start, end_of_range + Duration::hours(i64::from(longest)))
    }

    async fn classify(&self, posts: Vec<Post>) -> Vec<(Post, ClassificationResult)> {
        let total = posts.len();
        let mut out = Vec::with_capacity(total);
        for (i, post) in posts.into_iter().enumerate() {
            if i > 0 {
                self.pause().await;
            }
            let result = self.classifier.classify_or_fallback(&post.text).await;
            tracing::debug!(post = %post.id, label = %result.label, source = %result.source, "classified");
            out.push((post, result));
        }
        let heuristic = out
            .iter()
            .filter(|(_, r)| r.source == ClassificationSource::Heuristic)
            .count();
        tracing::info!(total, heuristic, "classification complete");
        out
    }

    /// Full quality validation of the analysed dataset. Written out, never a gate.
    fn audit(&self, records: &[AnalysisRecord], writer: &mut ArtifactWriter) -> QualityReport {
        let statistics = self
            .results
            .get(&Stage::PostAnalysis)
            .and_then(SubagentResults::statistics)
            .cloned();
        let prompt = build_prompt(&self.config.sentiment, TEXT_PLACEHOLDER);
        let dataset = ValidationDataset::from_config(records, &self.config)
            .with_statistics(statistics)
            .with_prompt(prompt);
        let report = validate(&dataset, &Weights::default());
        tracing::info!(status = %report.status, score = report.score, "dataset quality audited");

        if let Err(e) = writer.write_json(QUALITY_REPORT_JSON, &report) {
            tracing::error!(error = %e, "failed to write quality report");
        }
        let markdown = render_markdown(&report, &self.config.name);
        if let Err(e) = writer.write(QUALITY_REPORT_MD, markdown.as_bytes()) {
            tracing::error!(error = %e, "failed to write quality report");
        }
        report
    }

    async fn report(&mut self, records: &[AnalysisRecord], writer: &mut ArtifactWriter) {
        if self.config.output.reports.is_empty() {
            return;
        }
        let config = self.config.clone();
        let prior = self.results.clone();
        let input = ReportInput {
            config: &config,
            records,
            validation: prior.get(&Stage::PreAnalysis).and_then(SubagentResults::validation),
            context: prior
                .get(&Stage::PreStockAnalysis)
                .and_then(SubagentResults::market_context),
            statistics: prior
                .get(&Stage::PostAnalysis)
                .and_then(SubagentResults::statistics),
            subagents_enabled: self.options.subagents_enabled,
        };
        let results = self
            .invoke(
                SubagentTrigger::at(Stage::ReportGeneration),
                &SubagentInput::Reporting(input),
            )
            .await;
        let markdown = results
            .report()
            .map_or_else(|| render_summary(&input), |r| r.markdown.clone());

        for spec in &config.output.reports {
            if let Err(e) = writer.write(&spec.file_name(), markdown.as_bytes()) {
                tracing::error!(report = %spec.filename, error = %e, "failed to write report");
            }
        }
    }

    fn export(&self, records: &[AnalysisRecord], writer: &mut ArtifactWriter) {
        let config = &self.config;
        for spec in &config.output.exports {
            let name = spec.file_name();
            let written = match spec.kind {
                ExportKind::Csv => {
                    let conditions: Vec<String> =
                        config.analysis.conditions.iter().map(|c| c.name.clone()).collect();
                    let csv = records_to_csv(
                        records,
                        &config.market.symbols,
                        &config.analysis.interval_labels(),
                        &conditions,
                    );
                    writer.write(&name, csv.as_bytes())
                }
                ExportKind::Json => writer.write_json(&name, records),
            };
            if let Err(e) = written {
                tracing::error!(export = %name, error = %e, "failed to write export");
            }
        }
    }
}

/// What a dry run would do, without touching the network or the disk.
#[must_use]
pub fn describe_plan(config: &ExperimentConfig, options: &RunOptions) -> String {
    let social = &config.social;
    let mut lines = vec![
        format!("experiment: {}", config.name),
        format!(
            "posts: {} accounts [{}], keywords [{}], {} to {}, max {}",
            social.platform,
            social.accounts.join(", "),
            social.keywords.join(", "),
            social.start,
            social.end,
            social.max_posts
        ),
        format!(
            "market data: {} ({} feed) for [{}]",
            config.market.provider,
            config.market.data_feed,
            config.market.symbols.join(", ")
        ),
        format!(
            "sentiment: {} {} at temperature {}, categories [{}]",
            config.sentiment.provider,
            config.sentiment.model,
            config.sentiment.temperature,
            config.sentiment.category_names().join(", ")
        ),
        format!(
            "intervals: [{}]",
            config.analysis.interval_labels().join(", ")
        ),
        format!(
            "statistical analysis: {}",
            if config.wants_statistical_analysis() { "yes" } else { "no" }
        ),
        format!(
            "subagents: {}",
            if options.subagents_enabled { "enabled" } else { "disabled" }
        ),
    ];
    let outputs: Vec<String> = config
        .output
        .reports
        .iter()
        .map(ReportSpec::file_name)
        .chain(config.output.exports.iter().map(ExportSpec::file_name))
        .collect();
    lines.push(format!(
        "output: {} [{}]",
        options
            .output_root
            .join(experiment_slug(&config.name))
            .display(),
        outputs.join(", ")
    ));
    lines.join("\n")
}

/// Re-run the quality validator over a previously exported JSON dataset.
#[must_use]
pub fn audit_records(records: &[AnalysisRecord], config: &ExperimentConfig) -> QualityReport {
    let dataset = ValidationDataset::from_config(records, config)
        .with_prompt(build_prompt(&config.sentiment, TEXT_PLACEHOLDER));
    validate(&dataset, &Weights::default())
}
