//! Shared request plumbing for the HTTP-backed sources.

use std::time::Duration;

use hypo_core::AppConfig;
use reqwest::{Client, RequestBuilder, Url};

use crate::error::SourceError;
use crate::retry::Backoff;

const USER_AGENT: &str = "hypo/0.1 (hypothesis-verification)";

/// Timeout and retry policy shared by every source client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl HttpSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.request_timeout_secs,
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 3,
            backoff_base_ms: 1_000,
        }
    }
}

pub(crate) fn build_client(settings: &HttpSettings) -> Result<Client, SourceError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(USER_AGENT)
        .build()?)
}

/// Parse and normalise a base URL so that it ends with exactly one slash.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, SourceError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| SourceError::InvalidBaseUrl {
        url: base_url.to_owned(),
        reason: e.to_string(),
    })
}

/// Send the request built by `make_request`, retrying transient failures,
/// and decode a JSON body.
///
/// `make_request` is called once per attempt since a `RequestBuilder`
/// cannot be replayed.
pub(crate) async fn send_json<F>(
    settings: &HttpSettings,
    provider: &str,
    context: &str,
    make_request: F,
) -> Result<serde_json::Value, SourceError>
where
    F: Fn() -> RequestBuilder,
{
    Backoff::from_settings(settings).run(|| async {
        let response = make_request().send().await?;
        let status = response.status();
        let url = response.url().to_string();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(SourceError::RateLimited {
                provider: provider.to_owned(),
                retry_after_secs,
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.is_client_error() {
                if let Some(message) = api_message(&body) {
                    return Err(SourceError::Api {
                        provider: provider.to_owned(),
                        message,
                    });
                }
            }
            return Err(SourceError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| SourceError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    })
    .await
}

/// Pull a human-readable message out of a JSON error body, if there is one.
fn api_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(serde_json::Value::as_str)
        .or_else(|| {
            value
                .get("error")
                .and_then(|e| e.get("message").or(Some(e)))
                .and_then(serde_json::Value::as_str)
        })
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_base_url_normalises_trailing_slash() {
        assert_eq!(
            parse_base_url("https://api.apify.com//").unwrap().as_str(),
            "https://api.apify.com/"
        );
        assert!(matches!(
            parse_base_url("not a url"),
            Err(SourceError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn api_message_reads_common_shapes() {
        assert_eq!(
            api_message(r#"{"message":"forbidden"}"#).as_deref(),
            Some("forbidden")
        );
        assert_eq!(
            api_message(r#"{"error":{"type":"x","message":"actor not found"}}"#).as_deref(),
            Some("actor not found")
        );
        assert_eq!(api_message(r#"{"error":"bad token"}"#).as_deref(), Some("bad token"));
        assert!(api_message("<html>").is_none());
    }
}
