//! Model-backed classifier for the OpenAI chat-completions and Anthropic
//! messages endpoints.

use std::time::Duration;

use async_trait::async_trait;
use hypo_core::{ClassificationResult, LlmProvider, SentimentSettings};
use reqwest::{Client, Url};
use serde_json::{json, Value};

use crate::classifier::SentimentClassifier;
use crate::error::ClassificationError;
use crate::prompt::{build_prompt, parse_reply};

const OPENAI_BASE_URL: &str = "https://api.openai.com/";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 150;
const SYSTEM_PROMPT: &str = "You are a financial sentiment analysis expert.";

pub struct LlmClassifier {
    client: Client,
    api_key: String,
    base_url: Url,
    settings: SentimentSettings,
}

impl LlmClassifier {
    /// Creates a classifier pointed at the provider's production endpoint.
    ///
    /// # Errors
    ///
    /// [`ClassificationError::MissingCredential`] for a blank key, or
    /// [`ClassificationError::Http`] if the client cannot be built.
    pub fn new(
        settings: SentimentSettings,
        api_key: &str,
        timeout_secs: u64,
    ) -> Result<Self, ClassificationError> {
        let base = match settings.provider {
            LlmProvider::OpenAi => OPENAI_BASE_URL,
            LlmProvider::Anthropic => ANTHROPIC_BASE_URL,
        };
        Self::with_base_url(settings, api_key, timeout_secs, base)
    }

    /// Creates a classifier with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// As [`LlmClassifier::new`], plus [`ClassificationError::InvalidBaseUrl`].
    pub fn with_base_url(
        settings: SentimentSettings,
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, ClassificationError> {
        if api_key.trim().is_empty() {
            return Err(ClassificationError::MissingCredential(
                settings.provider.credential_var().to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| ClassificationError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url: parsed,
            settings,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &SentimentSettings {
        &self.settings
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClassificationError> {
        self.base_url
            .join(path)
            .map_err(|e| ClassificationError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn complete(&self, prompt: &str) -> Result<String, ClassificationError> {
        let provider = self.settings.provider;
        let request = match provider {
            LlmProvider::OpenAi => self
                .client
                .post(self.endpoint("v1/chat/completions")?)
                .bearer_auth(&self.api_key)
                .json(&json!({
                    "model": self.settings.model,
                    "messages": [
                        { "role": "system", "content": SYSTEM_PROMPT },
                        { "role": "user", "content": prompt }
                    ],
                    "temperature": self.settings.temperature,
                    "max_tokens": MAX_TOKENS,
                })),
            LlmProvider::Anthropic => self
                .client
                .post(self.endpoint("v1/messages")?)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&json!({
                    "model": self.settings.model,
                    "system": SYSTEM_PROMPT,
                    "messages": [{ "role": "user", "content": prompt }],
                    "temperature": self.settings.temperature,
                    "max_tokens": MAX_TOKENS,
                })),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClassificationError::Status {
                provider: provider.to_string(),
                status: status.as_u16(),
            });
        }
        let body: Value = response.json().await?;

        let text = match provider {
            LlmProvider::OpenAi => body
                .pointer("/choices/0/message/content")
                .and_then(Value::as_str),
            LlmProvider::Anthropic => body.pointer("/content/0/text").and_then(Value::as_str),
        };
        text.filter(|t| !t.trim().is_empty())
            .map(str::to_owned)
            .ok_or_else(|| ClassificationError::EmptyResponse {
                provider: provider.to_string(),
            })
    }
}

#[async_trait]
impl SentimentClassifier for LlmClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassificationError> {
        let prompt = build_prompt(&self.settings, text);
        let reply = self.complete(&prompt).await?;
        let result = parse_reply(&reply, &self.settings)?;
        tracing::debug!(
            provider = %self.settings.provider,
            label = %result.label,
            confidence = result.confidence,
            "classified post"
        );
        Ok(result)
    }
}
