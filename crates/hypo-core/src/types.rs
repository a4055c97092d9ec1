use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel written by upstream reports for a value that was never measured.
pub const NOT_AVAILABLE: &str = "N/A";

/// Label used for a price-impact interval, e.g. `24` → `"24h"`.
#[must_use]
pub fn interval_label(hours: u32) -> String {
    format!("{hours}h")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub likes: u64,
    pub shares: u64,
}

impl EngagementMetrics {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.likes.saturating_add(self.shares)
    }
}

/// One social-media item as returned by a post source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub text: String,
    /// `None` when the source timestamp could not be resolved to a UTC instant.
    pub timestamp: Option<DateTime<Utc>>,
    pub author: String,
    #[serde(default)]
    pub engagement: EngagementMetrics,
}

/// Where a classification came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationSource {
    /// Parsed from the configured language model's reply.
    Model,
    /// Keyword-overlap fallback used after a model failure.
    Heuristic,
}

impl std::fmt::Display for ClassificationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassificationSource::Model => write!(f, "model"),
            ClassificationSource::Heuristic => write!(f, "heuristic"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: String,
    /// In `[0.0, 1.0]`.
    pub confidence: f64,
    pub reason: String,
    pub source: ClassificationSource,
}

/// One OHLC bar for a tracked symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    /// A bar is well-formed when every price is positive and finite and
    /// `low <= open, close <= high`.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        prices.iter().all(|p| p.is_finite() && *p > 0.0)
            && self.low <= self.high
            && (self.low..=self.high).contains(&self.open)
            && (self.low..=self.high).contains(&self.close)
    }
}

/// Bars per symbol, each series sorted by timestamp ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub bars: BTreeMap<String, Vec<PriceBar>>,
}

impl MarketData {
    pub fn insert(&mut self, symbol: impl Into<String>, mut bars: Vec<PriceBar>) {
        bars.sort_by_key(|b| b.timestamp);
        self.bars.insert(symbol.into(), bars);
    }

    #[must_use]
    pub fn bars_for(&self, symbol: &str) -> &[PriceBar] {
        self.bars.get(symbol).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn total_bars(&self) -> usize {
        self.bars.values().map(Vec::len).sum()
    }
}

/// Value derived for one analysis condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Flag(bool),
    Tier(String),
}

impl std::fmt::Display for ConditionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConditionValue::Flag(b) => write!(f, "{b}"),
            ConditionValue::Tier(t) => write!(f, "{t}"),
        }
    }
}

/// A post joined with its classification, price impacts and condition tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub post: Post,
    pub classification: ClassificationResult,
    /// `symbol → "{hours}h" → percent change`; `None` when no bar was available.
    pub price_impacts: BTreeMap<String, BTreeMap<String, Option<f64>>>,
    pub conditions: BTreeMap<String, ConditionValue>,
}

impl AnalysisRecord {
    /// `true` if at least one symbol/interval carries a measured value.
    #[must_use]
    pub fn has_any_impact(&self) -> bool {
        self.price_impacts
            .values()
            .flat_map(BTreeMap::values)
            .any(|v| v.is_some_and(f64::is_finite))
    }

    #[must_use]
    pub fn impact(&self, symbol: &str, interval: &str) -> Option<f64> {
        self.price_impacts
            .get(symbol)
            .and_then(|m| m.get(interval))
            .copied()
            .flatten()
            .filter(|v| v.is_finite())
    }

    #[must_use]
    pub fn market_hours(&self) -> Option<bool> {
        match self.conditions.get("market_hours") {
            Some(ConditionValue::Flag(b)) => Some(*b),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar(close: f64) -> PriceBar {
        PriceBar {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 4, 15, 0, 0).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 100,
        }
    }

    #[test]
    fn interval_label_formats_hours() {
        assert_eq!(interval_label(24), "24h");
    }

    #[test]
    fn engagement_total_saturates() {
        let m = EngagementMetrics {
            likes: u64::MAX,
            shares: 5,
        };
        assert_eq!(m.total(), u64::MAX);
    }

    #[test]
    fn bar_with_inverted_range_is_malformed() {
        let mut b = bar(10.0);
        b.low = 12.0;
        assert!(!b.is_well_formed());
        assert!(bar(10.0).is_well_formed());
    }

    #[test]
    fn market_data_sorts_on_insert() {
        let mut later = bar(11.0);
        later.timestamp = Utc.with_ymd_and_hms(2024, 3, 5, 15, 0, 0).unwrap();
        let mut data = MarketData::default();
        data.insert("TSLA", vec![later, bar(10.0)]);
        assert!((data.bars_for("TSLA")[0].close - 10.0).abs() < f64::EPSILON);
        assert!(data.bars_for("AAPL").is_empty());
        assert_eq!(data.total_bars(), 2);
    }

    #[test]
    fn condition_value_serializes_untagged() {
        let flag = serde_json::to_string(&ConditionValue::Flag(true)).unwrap();
        let tier = serde_json::to_string(&ConditionValue::Tier("viral".into())).unwrap();
        assert_eq!(flag, "true");
        assert_eq!(tier, "\"viral\"");
    }
}
