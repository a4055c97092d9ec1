//! Wiring of the live HTTP collaborators and the standard subagent set.

use std::sync::Arc;
use std::time::Duration;

use hypo_agents::{
    DataValidator, MarketContextAgent, ReportGenerator, StatisticalAnalyzer, SubagentOrchestrator,
};
use hypo_core::{AppConfig, ExperimentConfig};
use hypo_sentiment::{FallbackClassifier, KeywordClassifier, LlmClassifier};
use hypo_sources::{
    AlpacaClient, ApifyClient, HttpSettings, MarketDataSource, PostSource, SourceError,
};

use crate::error::RunError;

/// The external services a run talks to.
pub struct Collaborators {
    pub posts: Arc<dyn PostSource>,
    pub market: Arc<dyn MarketDataSource>,
    pub classifier: FallbackClassifier,
}

fn source_setup_error(component: &str, err: SourceError) -> RunError {
    match err {
        SourceError::MissingCredential(var) => RunError::Environment { missing: vec![var] },
        other => RunError::Setup {
            component: component.to_string(),
            reason: other.to_string(),
        },
    }
}

impl Collaborators {
    /// Build the Apify, Alpaca and model-backed clients from runtime settings.
    ///
    /// Without a key for the configured model provider the classifier runs
    /// on the keyword heuristic alone.
    ///
    /// # Errors
    ///
    /// [`RunError::Environment`] for a missing source credential and
    /// [`RunError::Setup`] when a client cannot be constructed.
    pub fn live(config: &ExperimentConfig, app: &AppConfig) -> Result<Self, RunError> {
        let http = HttpSettings::from_app_config(app);
        let creds = &app.credentials;

        let posts = ApifyClient::new(creds.apify_api_key().unwrap_or_default(), http)
            .map_err(|e| source_setup_error("apify client", e))?;
        let market = AlpacaClient::new(
            creds.alpaca_api_key().unwrap_or_default(),
            creds.alpaca_secret_key().unwrap_or_default(),
            &config.market.data_feed,
            http,
        )
        .map_err(|e| source_setup_error("alpaca client", e))?;

        let heuristic = KeywordClassifier::new(config.sentiment.category_names());
        let provider = config.sentiment.provider;
        let classifier = match creds.get(provider.credential_var()) {
            Some(key) => {
                let llm = LlmClassifier::new(config.sentiment.clone(), key, app.request_timeout_secs)
                    .map_err(|e| RunError::Setup {
                        component: format!("{provider} classifier"),
                        reason: e.to_string(),
                    })?;
                FallbackClassifier::new(Box::new(llm), heuristic)
            }
            None => {
                tracing::warn!(
                    %provider,
                    var = provider.credential_var(),
                    "no model credential, classifying with keyword heuristic only"
                );
                FallbackClassifier::heuristic_only(heuristic)
            }
        };

        Ok(Self {
            posts: Arc::new(posts),
            market: Arc::new(market),
            classifier,
        })
    }
}

/// Orchestrator with every built-in subagent registered.
///
/// The market-context subagent reads index bars from `market`, pausing
/// `delay` between requests.
#[must_use]
pub fn standard_orchestrator(
    market: Arc<dyn MarketDataSource>,
    delay: Duration,
) -> SubagentOrchestrator {
    let mut orchestrator = SubagentOrchestrator::new();
    orchestrator.register(Box::new(DataValidator::new()));
    orchestrator.register(Box::new(MarketContextAgent::new(market).with_delay(delay)));
    orchestrator.register(Box::new(StatisticalAnalyzer::new()));
    orchestrator.register(Box::new(ReportGenerator::new()));
    orchestrator
}
