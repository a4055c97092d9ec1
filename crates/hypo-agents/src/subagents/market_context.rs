//! Broad-market backdrop for the analysis window.
//!
//! Index and sector ETF bars come from the same [`MarketDataSource`] as the
//! tracked symbols. The output is advisory; the runner never gates on it.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, Days, NaiveDate, NaiveTime};
use hypo_core::PriceBar;
use hypo_sources::MarketDataSource;
use serde::{Deserialize, Serialize};

use crate::error::SubagentError;
use crate::subagent::{Subagent, SubagentInput, SubagentOutput};
use crate::trigger::{Stage, SubagentTrigger};

pub const MARKET_CONTEXT: &str = "market_context";

const BROAD_INDEXES: &[(&str, &str)] = &[("SPY", "S&P 500"), ("QQQ", "Nasdaq 100")];
const SECTOR_ETF: (&str, &str) = ("XLK", "Technology");
const TREND_THRESHOLD_PCT: f64 = 1.0;
const EVENT_THRESHOLD_PCT: f64 = 2.0;
const HIGH_IMPACT_PCT: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketTrend {
    Bullish,
    Bearish,
    Neutral,
    Unknown,
}

impl std::fmt::Display for MarketTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MarketTrend::Bullish => "bullish",
            MarketTrend::Bearish => "bearish",
            MarketTrend::Neutral => "neutral",
            MarketTrend::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactTier {
    Medium,
    High,
}

impl std::fmt::Display for ImpactTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImpactTier::Medium => f.write_str("medium"),
            ImpactTier::High => f.write_str("high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEvent {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub impact: ImpactTier,
    /// Day's move in percent.
    pub price_movement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub general_trend: MarketTrend,
    /// Percent change over the window per index symbol.
    pub index_changes: BTreeMap<String, f64>,
    pub sector_performance: String,
    pub significant_events: Vec<MarketEvent>,
    pub confounding_factors: Vec<String>,
    pub summary: String,
}

pub struct MarketContextAgent {
    source: Arc<dyn MarketDataSource>,
    delay: Duration,
}

impl MarketContextAgent {
    #[must_use]
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self {
            source,
            delay: Duration::ZERO,
        }
    }

    /// Pause `delay` between consecutive index fetches.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fetch index bars for the window and derive the context.
    ///
    /// # Errors
    ///
    /// Returns the last source error when no index could be fetched at all.
    pub async fn build(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        symbols: &[String],
    ) -> Result<MarketContext, SubagentError> {
        let from = start.and_time(NaiveTime::MIN).and_utc();
        let to = end
            .checked_add_days(Days::new(1))
            .unwrap_or(end)
            .and_time(NaiveTime::MIN)
            .and_utc();

        let mut series: BTreeMap<&str, Vec<PriceBar>> = BTreeMap::new();
        let mut last_error = None;
        let wanted = BROAD_INDEXES.iter().chain(std::iter::once(&SECTOR_ETF));
        for (i, &(symbol, _)) in wanted.enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match self.source.fetch_bars(symbol, from, to).await {
                Ok(mut bars) => {
                    bars.sort_by_key(|b| b.timestamp);
                    series.insert(symbol, bars);
                }
                Err(err) => {
                    tracing::warn!(symbol, error = %err, "index bars unavailable");
                    last_error = Some(err);
                }
            }
        }
        if series.values().all(Vec::is_empty) {
            if let Some(err) = last_error {
                return Err(SubagentError::Source(err));
            }
        }

        Ok(derive_context(start, end, &series, symbols))
    }
}

#[async_trait]
impl Subagent for MarketContextAgent {
    fn name(&self) -> &'static str {
        MARKET_CONTEXT
    }

    fn should_trigger(&self, trigger: &SubagentTrigger) -> bool {
        trigger.stage == Stage::PreStockAnalysis
    }

    async fn execute(&self, input: &SubagentInput<'_>) -> Result<SubagentOutput, SubagentError> {
        let SubagentInput::Period {
            start,
            end,
            symbols,
        } = input
        else {
            return Err(SubagentError::UnsupportedInput {
                agent: MARKET_CONTEXT,
                received: input.kind(),
            });
        };
        let context = self.build(*start, *end, symbols).await?;
        tracing::info!(
            trend = %context.general_trend,
            events = context.significant_events.len(),
            "market context compiled"
        );
        Ok(SubagentOutput::MarketContext(context))
    }
}

/// Percent change from the first open to the last close.
fn period_change(bars: &[PriceBar]) -> Option<f64> {
    let first = bars.first()?;
    let last = bars.last()?;
    (first.open > 0.0).then(|| (last.close - first.open) / first.open * 100.0)
}

/// Days whose open-to-close move exceeded the event threshold.
fn daily_events(symbol: &str, label: &str, bars: &[PriceBar]) -> Vec<MarketEvent> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&PriceBar>> = BTreeMap::new();
    for bar in bars {
        by_day.entry(bar.timestamp.date_naive()).or_default().push(bar);
    }
    by_day
        .into_iter()
        .filter_map(|(date, day)| {
            let open = day.first()?.open;
            let close = day.last()?.close;
            if open <= 0.0 {
                return None;
            }
            let change = (close - open) / open * 100.0;
            (change.abs() > EVENT_THRESHOLD_PCT).then(|| MarketEvent {
                date,
                kind: "market".to_string(),
                description: format!("{label} ({symbol}) moved {change:+.1}% on the day"),
                impact: if change.abs() > HIGH_IMPACT_PCT {
                    ImpactTier::High
                } else {
                    ImpactTier::Medium
                },
                price_movement: change,
            })
        })
        .collect()
}

fn overlaps_earnings_season(start: NaiveDate, end: NaiveDate) -> bool {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .any(|d| matches!(d.month(), 1 | 4 | 7 | 10) && d.day() >= 15)
}

fn derive_context(
    start: NaiveDate,
    end: NaiveDate,
    series: &BTreeMap<&str, Vec<PriceBar>>,
    symbols: &[String],
) -> MarketContext {
    let index_changes: BTreeMap<String, f64> = series
        .iter()
        .filter_map(|(symbol, bars)| period_change(bars).map(|c| ((*symbol).to_string(), c)))
        .collect();

    let broad: Vec<f64> = BROAD_INDEXES
        .iter()
        .filter_map(|(s, _)| index_changes.get(*s).copied())
        .collect();
    #[allow(clippy::cast_precision_loss)]
    let general_trend = if broad.is_empty() {
        MarketTrend::Unknown
    } else {
        let avg = broad.iter().sum::<f64>() / broad.len() as f64;
        if avg > TREND_THRESHOLD_PCT {
            MarketTrend::Bullish
        } else if avg < -TREND_THRESHOLD_PCT {
            MarketTrend::Bearish
        } else {
            MarketTrend::Neutral
        }
    };

    let (sector_symbol, sector_label) = SECTOR_ETF;
    let sector_performance = index_changes.get(sector_symbol).map_or_else(
        || format!("{sector_label} ({sector_symbol}) unavailable"),
        |c| format!("{sector_label} ({sector_symbol}) {c:+.1}%"),
    );

    let mut significant_events: Vec<MarketEvent> = BROAD_INDEXES
        .iter()
        .filter_map(|(s, label)| series.get(s).map(|bars| daily_events(s, label, bars)))
        .flatten()
        .collect();
    significant_events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.description.cmp(&b.description)));

    let mut confounding_factors =
        vec!["Broad market trends may influence individual stock movements".to_string()];
    if matches!(general_trend, MarketTrend::Bullish | MarketTrend::Bearish) {
        confounding_factors.push(format!(
            "Market-wide {general_trend} drift during the analysis period"
        ));
    }
    let high_impact = significant_events
        .iter()
        .filter(|e| e.impact == ImpactTier::High)
        .count();
    if high_impact > 0 {
        confounding_factors.push(format!(
            "{high_impact} high-volatility market day(s) in the period"
        ));
    }
    if overlaps_earnings_season(start, end) {
        confounding_factors.push(
            "Quarterly earnings announcements fall inside the analysis period".to_string(),
        );
    }
    if symbols.iter().any(|s| s == sector_symbol || s == "QQQ" || s == "SPY") {
        confounding_factors
            .push("Tracked symbols overlap the reference indexes".to_string());
    }

    let summary = match general_trend {
        MarketTrend::Unknown => format!("No index data was available for {start} to {end}."),
        trend => format!(
            "Market was {trend} from {start} to {end}; {sector_performance}; {} significant move(s).",
            significant_events.len()
        ),
    };

    MarketContext {
        start,
        end,
        general_trend,
        index_changes,
        sector_performance,
        significant_events,
        confounding_factors,
        summary,
    }
}

#[cfg(test)]
#[path = "market_context_test.rs"]
mod tests;
