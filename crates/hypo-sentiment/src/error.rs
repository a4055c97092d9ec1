use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned status {status}")]
    Status { provider: String, status: u16 },

    #[error("{provider} returned no completion text")]
    EmptyResponse { provider: String },

    /// The reply did not contain a parseable JSON verdict.
    #[error("malformed model reply: {0}")]
    MalformedReply(String),

    #[error("label '{label}' is not one of the configured categories")]
    UnknownLabel { label: String },

    #[error("{0} is not configured")]
    MissingCredential(String),

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
