//! Record builders shared by the rule tests.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use hypo_core::{
    AnalysisRecord, ClassificationResult, ClassificationSource, ConditionValue,
    EngagementMetrics, Post,
};

use crate::dataset::{MethodologyDisclosure, SignificanceTest, StatisticsSummary};
use crate::ValidationDataset;

pub(crate) fn record(
    id: usize,
    label: &str,
    impact: Option<f64>,
    market_hours: Option<bool>,
) -> AnalysisRecord {
    let base = Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap();
    let post = Post {
        id: format!("post-{id}"),
        text: format!("post number {id}"),
        timestamp: Some(base + Duration::hours(i64::try_from(id).unwrap() * 24)),
        author: "someone".to_string(),
        engagement: EngagementMetrics::default(),
    };
    let mut intervals = BTreeMap::new();
    intervals.insert("1h".to_string(), impact);
    intervals.insert("24h".to_string(), impact);
    let mut price_impacts = BTreeMap::new();
    price_impacts.insert("TSLA".to_string(), intervals);
    let mut conditions = BTreeMap::new();
    if let Some(flag) = market_hours {
        conditions.insert("market_hours".to_string(), ConditionValue::Flag(flag));
    }
    AnalysisRecord {
        post,
        classification: ClassificationResult {
            label: label.to_string(),
            confidence: 0.8,
            reason: "test".to_string(),
            source: ClassificationSource::Model,
        },
        price_impacts,
        conditions,
    }
}

/// 18 BULLISH + 2 NEUTRAL, 7 in market hours and 13 outside.
pub(crate) fn scenario_a() -> Vec<AnalysisRecord> {
    (0..20)
        .map(|i| {
            let label = if i < 18 { "BULLISH" } else { "NEUTRAL" };
            record(i, label, Some(0.5), Some(i < 7))
        })
        .collect()
}

pub(crate) fn statistics() -> StatisticsSummary {
    StatisticsSummary {
        tests: vec![SignificanceTest {
            symbol: "TSLA".to_string(),
            interval: "24h".to_string(),
            comparison: "sentiment_vs_impact".to_string(),
            sample_size: 20,
            coefficient: Some(0.21),
            p_value: Some(0.37),
            confidence_interval: Some((-0.25, 0.59)),
            effect_size: None,
        }],
    }
}

pub(crate) fn methodology() -> MethodologyDisclosure {
    MethodologyDisclosure {
        classification_prompt: Some("Classify: {tweet_text}".to_string()),
        provider: Some("openai".to_string()),
        model: Some("gpt-4o-mini".to_string()),
        temperature: Some(0.1),
        collection_method: Some("keyword filter over account timeline".to_string()),
        market_data_source: Some("alpaca (iex feed)".to_string()),
        keywords: vec!["tesla".to_string()],
    }
}

/// A 100-day window with tri-state categories and one tracked symbol.
pub(crate) fn dataset(records: &[AnalysisRecord]) -> ValidationDataset<'_> {
    ValidationDataset {
        records,
        categories: vec![
            "BULLISH".to_string(),
            "BEARISH".to_string(),
            "NEUTRAL".to_string(),
        ],
        symbols: vec!["TSLA".to_string()],
        intervals: vec!["1h".to_string(), "24h".to_string()],
        start: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        end: NaiveDate::from_ymd_opt(2024, 4, 24).unwrap(),
        claimed_period: None,
        statistics: Some(statistics()),
        methodology: methodology(),
    }
}
