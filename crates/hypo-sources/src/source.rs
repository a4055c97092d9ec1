use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use hypo_core::{Post, PriceBar, SocialMediaConfig};

use crate::error::SourceError;

/// What to ask a post source for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub actor_id: Option<String>,
    pub accounts: Vec<String>,
    pub keywords: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub max_posts: usize,
}

impl PostQuery {
    #[must_use]
    pub fn from_config(config: &SocialMediaConfig) -> Self {
        Self {
            actor_id: config.actor_id.clone(),
            accounts: config.accounts.clone(),
            keywords: config.keywords.clone(),
            start: config.start,
            end: config.end,
            max_posts: config.max_posts,
        }
    }
}

/// Anything that can return raw posts for a query.
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch_posts(&self, query: &PostQuery) -> Result<Vec<Post>, SourceError>;
}

/// Anything that can return OHLC bars for a symbol over a UTC window.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PriceBar>, SourceError>;
}

/// Keep posts whose lowercased text contains any keyword, then cap at `max`.
///
/// An empty keyword list keeps everything.
#[must_use]
pub fn filter_posts(posts: Vec<Post>, keywords: &[String], max: usize) -> Vec<Post> {
    let needles: Vec<String> = keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();

    posts
        .into_iter()
        .filter(|p| {
            if needles.is_empty() {
                return true;
            }
            let text = p.text.to_lowercase();
            needles.iter().any(|k| text.contains(k.as_str()))
        })
        .take(max)
        .collect()
}
