//! Back-off policy for transient source failures.

use std::future::Future;
use std::time::Duration;

use crate::error::SourceError;
use crate::http::HttpSettings;

const MAX_DELAY: Duration = Duration::from_secs(60);

/// Whether a failed call could succeed if repeated: timeouts, refused
/// connections, 429 and 5xx.
pub(crate) fn is_transient(err: &SourceError) -> bool {
    match err {
        SourceError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        SourceError::RateLimited { .. } => true,
        SourceError::UnexpectedStatus { status, .. } => *status >= 500,
        SourceError::Deserialize { .. }
        | SourceError::Api { .. }
        | SourceError::InvalidBaseUrl { .. }
        | SourceError::PaginationLimit { .. }
        | SourceError::MissingCredential(_) => false,
    }
}

/// Exponential back-off: retry `n` waits `base_ms * 2^(n-1)` with ±25 %
/// jitter, never less than a server `Retry-After` hint and never more than
/// a minute. A zero base disables waiting altogether.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Backoff {
    pub max_retries: u32,
    pub base_ms: u64,
}

impl Backoff {
    pub(crate) fn from_settings(settings: &HttpSettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            base_ms: settings.backoff_base_ms,
        }
    }

    /// Un-jittered delay before retry `retry` (1-based).
    fn nominal(self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(16);
        Duration::from_millis(self.base_ms.saturating_mul(1u64 << exp)).min(MAX_DELAY)
    }

    fn delay(self, retry: u32, err: &SourceError) -> Duration {
        if self.base_ms == 0 {
            return Duration::ZERO;
        }
        let jittered = self.nominal(retry).mul_f64(0.75 + rand::random::<f64>() * 0.5);
        let hint = match err {
            SourceError::RateLimited {
                retry_after_secs, ..
            } => Duration::from_secs(*retry_after_secs),
            _ => Duration::ZERO,
        };
        jittered.max(hint).min(MAX_DELAY)
    }

    /// Run `call` until it succeeds, fails permanently, or the retry budget
    /// is spent. The last error is returned.
    pub(crate) async fn run<T, F, Fut>(self, mut call: F) -> Result<T, SourceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let mut retry = 0u32;
        loop {
            let err = match call().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if retry >= self.max_retries || !is_transient(&err) {
                return Err(err);
            }
            retry += 1;
            let wait = self.delay(retry, &err);
            tracing::warn!(
                retry,
                max_retries = self.max_retries,
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "transient source failure"
            );
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
        }
    }
}
