//! Joins classified posts with price movement and condition tags.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use chrono_tz::America::New_York;
use hypo_core::{
    interval_label, AnalysisRecord, ClassificationResult, ConditionSpec, ConditionValue,
    ExperimentConfig, MarketData, Post, PriceBar,
};

pub const MARKET_HOURS: &str = "market_hours";
pub const ENGAGEMENT_LEVEL: &str = "engagement_level";

/// 09:30 and 16:00 as seconds after local midnight.
const SESSION_OPEN_SECS: u32 = 9 * 3600 + 30 * 60;
const SESSION_CLOSE_SECS: u32 = 16 * 3600;

const ENGAGEMENT_TIERS: &[(&str, u64)] = &[
    ("viral", 1_000_000),
    ("high", 500_000),
    ("medium", 100_000),
];

/// Whether `ts` falls in the regular New York session on a weekday.
/// Both session bounds are inclusive.
#[must_use]
pub fn is_market_hours(ts: DateTime<Utc>) -> bool {
    let local = ts.with_timezone(&New_York);
    if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
        return false;
    }
    let secs = local.time().num_seconds_from_midnight();
    (SESSION_OPEN_SECS..=SESSION_CLOSE_SECS).contains(&secs)
}

/// Engagement tier for `likes + shares`, using the configured thresholds
/// and falling back to the defaults for any tier left unset.
#[must_use]
pub fn engagement_level(total: u64, thresholds: &BTreeMap<String, u64>) -> &'static str {
    ENGAGEMENT_TIERS
        .iter()
        .find(|(tier, default)| total >= thresholds.get(*tier).copied().unwrap_or(*default))
        .map_or("low", |&(tier, _)| tier)
}

fn first_at_or_after(bars: &[PriceBar], ts: DateTime<Utc>) -> Option<&PriceBar> {
    let idx = bars.partition_point(|b| b.timestamp < ts);
    bars.get(idx)
}

/// Percent change from the first bar at or after `at` to the first bar at
/// or after `at + hours`. `bars` must be sorted by timestamp.
#[must_use]
pub fn price_impact(bars: &[PriceBar], at: DateTime<Utc>, hours: u32) -> Option<f64> {
    let base = first_at_or_after(bars, at)?;
    let target = first_at_or_after(bars, at + Duration::hours(i64::from(hours)))?;
    if base.close <= 0.0 {
        return None;
    }
    let change = (target.close - base.close) / base.close * 100.0;
    change.is_finite().then_some(change)
}

fn condition_value(spec: &ConditionSpec, post: &Post) -> Option<ConditionValue> {
    match spec.name.as_str() {
        MARKET_HOURS => post.timestamp.map(|ts| ConditionValue::Flag(is_market_hours(ts))),
        ENGAGEMENT_LEVEL => Some(ConditionValue::Tier(
            engagement_level(post.engagement.total(), &spec.thresholds).to_string(),
        )),
        other => {
            tracing::debug!(condition = other, "no handler for condition, skipping");
            None
        }
    }
}

/// Build the record for one post. A post without a timestamp gets `None`
/// for every impact and no market-hours tag.
#[must_use]
pub fn build_record(
    post: Post,
    classification: ClassificationResult,
    market: &MarketData,
    config: &ExperimentConfig,
) -> AnalysisRecord {
    let price_impacts = config
        .market
        .symbols
        .iter()
        .map(|symbol| {
            let bars = market.bars_for(symbol);
            let by_interval = config
                .analysis
                .time_intervals
                .iter()
                .map(|&hours| {
                    let impact = post.timestamp.and_then(|ts| price_impact(bars, ts, hours));
                    (interval_label(hours), impact)
                })
                .collect();
            (symbol.clone(), by_interval)
        })
        .collect();

    let conditions = config
        .analysis
        .conditions
        .iter()
        .filter_map(|spec| condition_value(spec, &post).map(|v| (spec.name.clone(), v)))
        .collect();

    AnalysisRecord {
        post,
        classification,
        price_impacts,
        conditions,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn bar(day: u32, hour: u32, close: f64) -> PriceBar {
        PriceBar {
            timestamp: Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 10,
        }
    }

    #[test]
    fn market_hours_follow_new_york_session() {
        // 2024-03-04 is a Monday; EST is UTC-5 until March 10.
        let open = Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap();
        let close = Utc.with_ymd_and_hms(2024, 3, 4, 21, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 3, 4, 21, 0, 1).unwrap();
        let early = Utc.with_ymd_and_hms(2024, 3, 4, 14, 29, 59).unwrap();
        let saturday = Utc.with_ymd_and_hms(2024, 3, 9, 15, 0, 0).unwrap();
        assert!(is_market_hours(open));
        assert!(is_market_hours(close));
        assert!(!is_market_hours(after));
        assert!(!is_market_hours(early));
        assert!(!is_market_hours(saturday));
    }

    #[test]
    fn market_hours_track_daylight_saving() {
        // EDT (UTC-4) from March 10: 13:30 UTC is 09:30 local.
        let open = Utc.with_ymd_and_hms(2024, 3, 11, 13, 30, 0).unwrap();
        assert!(is_market_hours(open));
    }

    #[test]
    fn engagement_tiers_use_defaults_and_overrides() {
        let none = BTreeMap::new();
        assert_eq!(engagement_level(1_000_000, &none), "viral");
        assert_eq!(engagement_level(999_999, &none), "high");
        assert_eq!(engagement_level(100_000, &none), "medium");
        assert_eq!(engagement_level(99_999, &none), "low");

        let custom = BTreeMap::from([("viral".to_string(), 50_000)]);
        assert_eq!(engagement_level(60_000, &custom), "viral");
    }

    #[test]
    fn price_impact_uses_first_bars_at_or_after() {
        let bars = vec![bar(4, 14, 100.0), bar(4, 15, 102.0), bar(5, 14, 110.0)];
        let at = Utc.with_ymd_and_hms(2024, 3, 4, 13, 45, 0).unwrap();
        let one = price_impact(&bars, at, 1).unwrap();
        assert!((one - 2.0).abs() < 1e-9);
        let day = price_impact(&bars, at, 24).unwrap();
        assert!((day - 10.0).abs() < 1e-9);
        assert!(price_impact(&bars, at, 48).is_none());
        assert!(price_impact(&[], at, 1).is_none());
    }
}
