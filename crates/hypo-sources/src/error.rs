use thiserror::Error;

/// Errors returned by post and market-data sources.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {provider} (retry after {retry_after_secs}s)")]
    RateLimited {
        provider: String,
        retry_after_secs: u64,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The provider answered but reported an application-level error.
    #[error("{provider} API error: {message}")]
    Api { provider: String, message: String },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("pagination limit reached for {symbol}: exceeded {max_pages} pages")]
    PaginationLimit { symbol: String, max_pages: usize },

    #[error("{0} is not configured")]
    MissingCredential(String),
}
