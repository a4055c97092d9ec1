//! Correlation and effect-size tests between sentiment and price impact.

use async_trait::async_trait;
use hypo_core::experiment::STATISTICAL_ANALYZER;
use hypo_core::AnalysisRecord;
use hypo_quality::{SignificanceTest, StatisticsSummary};

use crate::error::SubagentError;
use crate::stats;
use crate::subagent::{Subagent, SubagentInput, SubagentOutput};
use crate::trigger::{Stage, SubagentTrigger};

pub const POLARITY_CORRELATION: &str = "sentiment_polarity_correlation";
pub const BULLISH_VS_BEARISH: &str = "bullish_vs_bearish";

/// Signed polarity of a label: positive categories +1, negative −1, else 0.
#[must_use]
pub fn polarity(label: &str) -> f64 {
    match label.to_uppercase().as_str() {
        "BULLISH" | "POSITIVE" => 1.0,
        "BEARISH" | "NEGATIVE" => -1.0,
        _ => 0.0,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatisticalAnalyzer;

impl StatisticalAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// One correlation test and one effect-size test per symbol × interval.
    #[must_use]
    pub fn analyze(
        &self,
        records: &[AnalysisRecord],
        symbols: &[String],
        intervals: &[String],
    ) -> StatisticsSummary {
        let mut tests = Vec::new();
        for symbol in symbols {
            for interval in intervals {
                let pairs: Vec<(f64, f64)> = records
                    .iter()
                    .filter_map(|r| {
                        r.impact(symbol, interval)
                            .map(|impact| (polarity(&r.classification.label), impact))
                    })
                    .collect();
                tests.push(correlation_test(symbol, interval, &pairs));
                tests.push(effect_size_test(symbol, interval, &pairs));
            }
        }
        let summary = StatisticsSummary { tests };
        tracing::info!(
            tests = summary.tests.len(),
            measured = summary.tests.iter().filter(|t| t.has_measure()).count(),
            "statistical analysis complete"
        );
        summary
    }
}

fn correlation_test(symbol: &str, interval: &str, pairs: &[(f64, f64)]) -> SignificanceTest {
    let (xs, ys): (Vec<f64>, Vec<f64>) = pairs.iter().copied().unzip();
    let n = pairs.len();
    let r = stats::pearson(&xs, &ys);
    SignificanceTest {
        symbol: symbol.to_string(),
        interval: interval.to_string(),
        comparison: POLARITY_CORRELATION.to_string(),
        sample_size: n,
        coefficient: r,
        p_value: r.and_then(|r| stats::correlation_p_value(r, n)),
        confidence_interval: r.and_then(|r| stats::fisher_interval(r, n)),
        effect_size: None,
    }
}

fn effect_size_test(symbol: &str, interval: &str, pairs: &[(f64, f64)]) -> SignificanceTest {
    let bullish: Vec<f64> = pairs.iter().filter(|(p, _)| *p > 0.0).map(|(_, v)| *v).collect();
    let bearish: Vec<f64> = pairs.iter().filter(|(p, _)| *p < 0.0).map(|(_, v)| *v).collect();
    let mean_diff = stats::mean(&bullish).zip(stats::mean(&bearish)).map(|(b, s)| b - s);
    SignificanceTest {
        symbol: symbol.to_string(),
        interval: interval.to_string(),
        comparison: BULLISH_VS_BEARISH.to_string(),
        sample_size: bullish.len() + bearish.len(),
        coefficient: mean_diff,
        p_value: None,
        confidence_interval: None,
        effect_size: stats::cohens_d(&bullish, &bearish),
    }
}

#[async_trait]
impl Subagent for StatisticalAnalyzer {
    fn name(&self) -> &'static str {
        STATISTICAL_ANALYZER
    }

    fn should_trigger(&self, trigger: &SubagentTrigger) -> bool {
        trigger.stage == Stage::PostAnalysis
    }

    async fn execute(&self, input: &SubagentInput<'_>) -> Result<SubagentOutput, SubagentError> {
        let SubagentInput::Analysis { records, config } = input else {
            return Err(SubagentError::UnsupportedInput {
                agent: STATISTICAL_ANALYZER,
                received: input.kind(),
            });
        };
        if records.is_empty() {
            return Err(SubagentError::Failed(
                "no analysis records to test".to_string(),
            ));
        }
        Ok(SubagentOutput::Statistics(self.analyze(
            records,
            &config.market.symbols,
            &config.analysis.interval_labels(),
        )))
    }
}
