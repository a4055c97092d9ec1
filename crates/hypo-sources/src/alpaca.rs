//! Market-data source backed by the Alpaca historical bars API.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use hypo_core::PriceBar;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::SourceError;
use crate::http::{build_client, parse_base_url, send_json, HttpSettings};
use crate::source::MarketDataSource;

const DEFAULT_BASE_URL: &str = "https://data.alpaca.markets/";
const PAGE_LIMIT: &str = "10000";
const MAX_PAGES: usize = 50;

/// Client for Alpaca's `/v2/stocks/{symbol}/bars` endpoint, hourly timeframe.
pub struct AlpacaClient {
    client: Client,
    key_id: String,
    secret_key: String,
    feed: String,
    base_url: Url,
    settings: HttpSettings,
}

#[derive(Debug, Deserialize)]
struct BarsPage {
    #[serde(default)]
    bars: Option<Vec<RawBar>>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawBar {
    t: DateTime<Utc>,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    #[serde(default)]
    v: u64,
}

impl From<RawBar> for PriceBar {
    fn from(raw: RawBar) -> Self {
        PriceBar {
            timestamp: raw.t,
            open: raw.o,
            high: raw.h,
            low: raw.l,
            close: raw.c,
            volume: raw.v,
        }
    }
}

impl AlpacaClient {
    /// Creates a client pointed at the production Alpaca data API.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::MissingCredential`] for a blank key,
    /// or [`SourceError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        key_id: &str,
        secret_key: &str,
        feed: &str,
        settings: HttpSettings,
    ) -> Result<Self, SourceError> {
        Self::with_base_url(key_id, secret_key, feed, settings, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// As [`AlpacaClient::new`], plus [`SourceError::InvalidBaseUrl`].
    pub fn with_base_url(
        key_id: &str,
        secret_key: &str,
        feed: &str,
        settings: HttpSettings,
        base_url: &str,
    ) -> Result<Self, SourceError> {
        if key_id.trim().is_empty() {
            return Err(SourceError::MissingCredential(
                hypo_core::app_config::ALPACA_API_KEY.to_string(),
            ));
        }
        if secret_key.trim().is_empty() {
            return Err(SourceError::MissingCredential(
                hypo_core::app_config::ALPACA_SECRET_KEY.to_string(),
            ));
        }
        Ok(Self {
            client: build_client(&settings)?,
            key_id: key_id.to_owned(),
            secret_key: secret_key.to_owned(),
            feed: feed.to_owned(),
            base_url: parse_base_url(base_url)?,
            settings,
        })
    }

    fn bars_url(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        page_token: Option<&str>,
    ) -> Result<Url, SourceError> {
        let mut url = self
            .base_url
            .join(&format!("v2/stocks/{symbol}/bars"))
            .map_err(|e| SourceError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("timeframe", "1Hour")
                .append_pair("start", &start.to_rfc3339_opts(SecondsFormat::Secs, true))
                .append_pair("end", &end.to_rfc3339_opts(SecondsFormat::Secs, true))
                .append_pair("feed", &self.feed)
                .append_pair("limit", PAGE_LIMIT)
                .append_pair("adjustment", "raw");
            if let Some(token) = page_token {
                pairs.append_pair("page_token", token);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl MarketDataSource for AlpacaClient {
    async fn fetch_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceBar>, SourceError> {
        let mut bars: Vec<PriceBar> = Vec::new();
        let mut page_token: Option<String> = None;

        for page in 1..=MAX_PAGES {
            let url = self.bars_url(symbol, start, end, page_token.as_deref())?;
            let context = format!("alpaca bars(symbol={symbol}, page={page})");
            let body = send_json(&self.settings, "alpaca", &context, || {
                self.client
                    .get(url.clone())
                    .header("APCA-API-KEY-ID", &self.key_id)
                    .header("APCA-API-SECRET-KEY", &self.secret_key)
            })
            .await?;

            let parsed: BarsPage =
                serde_json::from_value(body).map_err(|e| SourceError::Deserialize {
                    context,
                    source: e,
                })?;

            bars.extend(parsed.bars.unwrap_or_default().into_iter().map(PriceBar::from));

            match parsed.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => {
                    bars.sort_by_key(|b| b.timestamp);
                    tracing::info!(symbol, pages = page, count = bars.len(), "fetched bars");
                    return Ok(bars);
                }
            }
        }

        Err(SourceError::PaginationLimit {
            symbol: symbol.to_owned(),
            max_pages: MAX_PAGES,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn client() -> AlpacaClient {
        AlpacaClient::with_base_url(
            "key",
            "secret",
            "iex",
            HttpSettings::default(),
            "http://localhost:1",
        )
        .unwrap()
    }

    #[test]
    fn bars_url_carries_window_feed_and_token() {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 16, 0, 0, 0).unwrap();
        let url = client().bars_url("TSLA", start, end, Some("abc")).unwrap();
        assert_eq!(url.path(), "/v2/stocks/TSLA/bars");
        let query = url.query().unwrap();
        assert!(query.contains("timeframe=1Hour"));
        assert!(query.contains("start=2024-01-15T00%3A00%3A00Z"));
        assert!(query.contains("feed=iex"));
        assert!(query.contains("page_token=abc"));
    }

    #[test]
    fn missing_secret_is_rejected() {
        let err = AlpacaClient::new("key", "", "iex", HttpSettings::default()).err();
        assert!(matches!(err, Some(SourceError::MissingCredential(v)) if v == "ALPACA_SECRET_KEY"));
    }

    #[test]
    fn null_bars_page_parses() {
        let page: BarsPage =
            serde_json::from_str(r#"{"bars":null,"symbol":"TSLA","next_page_token":null}"#)
                .unwrap();
        assert!(page.bars.is_none());
    }
}
