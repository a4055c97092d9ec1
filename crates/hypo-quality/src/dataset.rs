use chrono::NaiveDate;
use hypo_core::{AnalysisRecord, ExperimentConfig};
use serde::{Deserialize, Serialize};

/// One sentiment-versus-impact comparison with whatever significance
/// measures were computed for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignificanceTest {
    pub symbol: String,
    pub interval: String,
    pub comparison: String,
    pub sample_size: usize,
    pub coefficient: Option<f64>,
    pub p_value: Option<f64>,
    pub confidence_interval: Option<(f64, f64)>,
    pub effect_size: Option<f64>,
}

impl SignificanceTest {
    /// `true` when at least one of CI, p-value or effect size is a finite number.
    #[must_use]
    pub fn has_measure(&self) -> bool {
        let finite = |v: Option<f64>| v.is_some_and(f64::is_finite);
        finite(self.p_value)
            || finite(self.effect_size)
            || self
                .confidence_interval
                .is_some_and(|(lo, hi)| lo.is_finite() && hi.is_finite())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSummary {
    pub tests: Vec<SignificanceTest>,
}

impl StatisticsSummary {
    #[must_use]
    pub fn has_significance_test(&self) -> bool {
        self.tests.iter().any(SignificanceTest::has_measure)
    }
}

/// What the run disclosed about how it was produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodologyDisclosure {
    pub classification_prompt: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub collection_method: Option<String>,
    pub market_data_source: Option<String>,
    pub keywords: Vec<String>,
}

impl MethodologyDisclosure {
    #[must_use]
    pub fn from_config(config: &ExperimentConfig) -> Self {
        Self {
            classification_prompt: None,
            provider: Some(config.sentiment.provider.to_string()),
            model: Some(config.sentiment.model.clone()),
            temperature: Some(config.sentiment.temperature),
            collection_method: config.social.collection_method.clone(),
            market_data_source: Some(format!(
                "{} ({} feed)",
                config.market.provider, config.market.data_feed
            )),
            keywords: config.social.keywords.clone(),
        }
    }
}

/// Everything the scoring rules look at.
#[derive(Debug, Clone)]
pub struct ValidationDataset<'a> {
    pub records: &'a [AnalysisRecord],
    pub categories: Vec<String>,
    pub symbols: Vec<String>,
    /// Interval labels such as `"24h"`.
    pub intervals: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub claimed_period: Option<String>,
    pub statistics: Option<StatisticsSummary>,
    pub methodology: MethodologyDisclosure,
}

impl<'a> ValidationDataset<'a> {
    #[must_use]
    pub fn from_config(records: &'a [AnalysisRecord], config: &ExperimentConfig) -> Self {
        Self {
            records,
            categories: config.sentiment.category_names(),
            symbols: config.market.symbols.clone(),
            intervals: config.analysis.interval_labels(),
            start: config.social.start,
            end: config.social.end,
            claimed_period: config.social.period_label.clone(),
            statistics: None,
            methodology: MethodologyDisclosure::from_config(config),
        }
    }

    #[must_use]
    pub fn with_statistics(mut self, statistics: Option<StatisticsSummary>) -> Self {
        self.statistics = statistics;
        self
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.methodology.classification_prompt = Some(prompt.into());
        self
    }

    /// Whole days covered, never less than one.
    #[must_use]
    pub fn day_span(&self) -> i64 {
        (self.end - self.start).num_days().max(1)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
