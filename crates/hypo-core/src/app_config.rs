use std::collections::BTreeMap;
use std::path::PathBuf;

pub const APIFY_API_KEY: &str = "APIFY_API_KEY";
pub const ALPACA_API_KEY: &str = "ALPACA_API_KEY";
pub const ALPACA_SECRET_KEY: &str = "ALPACA_SECRET_KEY";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";

/// Variables captured into [`Credentials`] whether or not a template requires them.
pub const KNOWN_CREDENTIAL_VARS: &[&str] = &[
    APIFY_API_KEY,
    ALPACA_API_KEY,
    ALPACA_SECRET_KEY,
    OPENAI_API_KEY,
    ANTHROPIC_API_KEY,
];

/// Snapshot of credential-bearing environment variables, taken once at startup.
///
/// Empty values are dropped at capture time, so a variable set to `""` is
/// indistinguishable from one that is not set at all.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    values: BTreeMap<String, String>,
}

impl Credentials {
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v)| !v.trim().is_empty())
            .collect();
        Self { values }
    }

    /// Read each of `names` not already captured through `lookup`, keeping
    /// non-empty values. Already captured names are left untouched.
    pub fn capture<F>(&mut self, names: &[String], lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for name in names {
            if self.values.contains_key(name) {
                continue;
            }
            if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
                self.values.insert(name.clone(), value);
            }
        }
    }

    #[must_use]
    pub fn get(&self, var: &str) -> Option<&str> {
        self.values.get(var).map(String::as_str)
    }

    /// Returns every name in `required` that has no non-empty value, in input order.
    #[must_use]
    pub fn missing(&self, required: &[String]) -> Vec<String> {
        required
            .iter()
            .filter(|var| self.get(var).is_none())
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn apify_api_key(&self) -> Option<&str> {
        self.get(APIFY_API_KEY)
    }

    #[must_use]
    pub fn alpaca_api_key(&self) -> Option<&str> {
        self.get(ALPACA_API_KEY)
    }

    #[must_use]
    pub fn alpaca_secret_key(&self) -> Option<&str> {
        self.get(ALPACA_SECRET_KEY)
    }

    #[must_use]
    pub fn openai_api_key(&self) -> Option<&str> {
        self.get(OPENAI_API_KEY)
    }

    #[must_use]
    pub fn anthropic_api_key(&self) -> Option<&str> {
        self.get(ANTHROPIC_API_KEY)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for key in self.values.keys() {
            map.entry(key, &"[redacted]");
        }
        map.finish()
    }
}

/// Process-wide runtime settings. Built once and passed explicitly to every
/// component that needs credentials or throttling knobs.
#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub output_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub inter_call_delay_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub credentials: Credentials,
}

impl AppConfig {
    /// Fixed pause between consecutive calls to the same external service.
    #[must_use]
    pub fn inter_call_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.inter_call_delay_ms)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("output_dir", &self.output_dir)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("inter_call_delay_ms", &self.inter_call_delay_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("credentials", &self.credentials)
            .finish()
    }
}
