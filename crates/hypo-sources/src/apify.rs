//! Post source backed by an Apify tweet-scraper actor.
//!
//! The actor is run synchronously and its dataset items are returned in the
//! same response. Item shapes vary between actors, so the mapping accepts the
//! common field spellings and skips items without an id or text.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hypo_core::{EngagementMetrics, Post};
use reqwest::{Client, Url};
use serde_json::{json, Value};

use crate::error::SourceError;
use crate::http::{build_client, parse_base_url, send_json, HttpSettings};
use crate::source::{PostQuery, PostSource};

const DEFAULT_BASE_URL: &str = "https://api.apify.com/";
const DEFAULT_ACTOR: &str = "apidojo/tweet-scraper";
const TWITTER_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Client for the Apify actor-run API.
pub struct ApifyClient {
    client: Client,
    api_key: String,
    base_url: Url,
    settings: HttpSettings,
}

impl ApifyClient {
    /// Creates a client pointed at the production Apify API.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, settings: HttpSettings) -> Result<Self, SourceError> {
        Self::with_base_url(api_key, settings, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`SourceError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        settings: HttpSettings,
        base_url: &str,
    ) -> Result<Self, SourceError> {
        if api_key.trim().is_empty() {
            return Err(SourceError::MissingCredential(
                hypo_core::app_config::APIFY_API_KEY.to_string(),
            ));
        }
        Ok(Self {
            client: build_client(&settings)?,
            api_key: api_key.to_owned(),
            base_url: parse_base_url(base_url)?,
            settings,
        })
    }

    fn run_url(&self, actor_id: &str) -> Result<Url, SourceError> {
        // Apify addresses actors as `user~name` in URL paths.
        let path = format!(
            "v2/acts/{}/run-sync-get-dataset-items",
            actor_id.replace('/', "~")
        );
        let mut url = self
            .base_url
            .join(&path)
            .map_err(|e| SourceError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut().append_pair("token", &self.api_key);
        Ok(url)
    }
}

#[async_trait]
impl PostSource for ApifyClient {
    async fn fetch_posts(&self, query: &PostQuery) -> Result<Vec<Post>, SourceError> {
        let actor_id = query.actor_id.as_deref().unwrap_or(DEFAULT_ACTOR);
        let url = self.run_url(actor_id)?;
        let input = json!({
            "handles": query.accounts,
            "searchTerms": query.keywords,
            "tweetsDesired": query.max_posts,
            "startDate": query.start.format("%Y-%m-%d").to_string(),
            "endDate": query.end.format("%Y-%m-%d").to_string(),
            "includeReplies": false,
            "includeRetweets": false,
        });

        tracing::info!(
            actor = actor_id,
            accounts = query.accounts.len(),
            start = %query.start,
            end = %query.end,
            "running apify actor"
        );

        let body = send_json(&self.settings, "apify", "apify dataset items", || {
            self.client.post(url.clone()).json(&input)
        })
        .await?;

        let Value::Array(items) = body else {
            return Err(SourceError::Api {
                provider: "apify".to_string(),
                message: "expected an array of dataset items".to_string(),
            });
        };

        let fallback_author = query.accounts.first().map_or("", String::as_str);
        let total = items.len();
        let posts: Vec<Post> = items
            .iter()
            .filter_map(|item| map_item(item, fallback_author))
            .collect();

        if posts.len() < total {
            tracing::warn!(
                skipped = total - posts.len(),
                "dropped dataset items without an id or text"
            );
        }
        tracing::info!(count = posts.len(), "fetched posts from apify");
        Ok(posts)
    }
}

fn str_field<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|k| item.get(*k).and_then(Value::as_str))
        .filter(|s| !s.is_empty())
}

fn count_field(item: &Value, keys: &[&str]) -> u64 {
    keys.iter()
        .find_map(|k| item.get(*k).and_then(Value::as_u64))
        .unwrap_or(0)
}

/// Parse an RFC 3339 timestamp or Twitter's `created_at` format into UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, TWITTER_DATE_FORMAT))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn map_item(item: &Value, fallback_author: &str) -> Option<Post> {
    let id = str_field(item, &["id", "id_str"])
        .map(str::to_owned)
        .or_else(|| item.get("id").and_then(Value::as_u64).map(|n| n.to_string()))?;
    let text = str_field(item, &["text", "full_text"])?.to_owned();

    let timestamp = str_field(item, &["createdAt", "created_at"]).and_then(parse_timestamp);
    if timestamp.is_none() {
        tracing::debug!(id = %id, "post timestamp missing or unparseable");
    }

    let author = item
        .get("author")
        .and_then(|a| str_field(a, &["userName"]))
        .or_else(|| item.get("user").and_then(|u| str_field(u, &["screen_name"])))
        .unwrap_or(fallback_author)
        .to_owned();

    Some(Post {
        id,
        text,
        timestamp,
        author,
        engagement: EngagementMetrics {
            likes: count_field(item, &["likeCount", "favorite_count"]),
            shares: count_field(item, &["retweetCount", "retweet_count"]),
        },
    })
}
