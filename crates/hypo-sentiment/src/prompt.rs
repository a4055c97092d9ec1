//! Prompt construction and reply parsing shared by every model provider.

use std::sync::OnceLock;

use hypo_core::{ClassificationResult, ClassificationSource, SentimentSettings};
use regex::Regex;
use serde::Deserialize;

use crate::error::ClassificationError;

/// Placeholder replaced with the post text in a custom prompt.
pub const TEXT_PLACEHOLDER: &str = "{tweet_text}";

fn json_object_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid json object regex"))
}

#[derive(Debug, Deserialize)]
struct Verdict {
    sentiment: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    reason: Option<String>,
}

/// The prompt sent to the model for one post.
///
/// A custom prompt has its `{tweet_text}` placeholder substituted; otherwise
/// the categories are enumerated with their descriptions.
#[must_use]
pub fn build_prompt(settings: &SentimentSettings, text: &str) -> String {
    if let Some(custom) = &settings.custom_prompt {
        return custom.replace(TEXT_PLACEHOLDER, text);
    }

    let mut prompt =
        String::from("Classify the sentiment of the following text into one of these categories:\n\n");
    for (i, category) in settings.categories.iter().enumerate() {
        prompt.push_str(&format!("{}. {}: {}\n", i + 1, category.name, category.description));
    }
    prompt.push_str(&format!("\nText: \"{text}\"\n\n"));
    prompt.push_str("Respond in JSON format:\n");
    prompt.push_str(
        r#"{"sentiment": "CATEGORY_NAME", "confidence": 0.0-1.0, "reason": "brief explanation"}"#,
    );
    prompt
}

/// Extract and validate the JSON verdict from a model reply.
///
/// The reply may wrap the object in prose or a code fence. The label is
/// upper-cased and must name a configured category; confidence is clamped to
/// `[0, 1]` and defaults to 0.5 when absent or non-finite.
///
/// # Errors
///
/// [`ClassificationError::MalformedReply`] when no JSON object can be read,
/// [`ClassificationError::UnknownLabel`] when the label is not configured.
pub fn parse_reply(
    reply: &str,
    settings: &SentimentSettings,
) -> Result<ClassificationResult, ClassificationError> {
    let object = json_object_pattern()
        .find(reply)
        .ok_or_else(|| ClassificationError::MalformedReply(truncate(reply)))?;

    let verdict: Verdict = serde_json::from_str(object.as_str())
        .map_err(|e| ClassificationError::MalformedReply(format!("{e}: {}", truncate(reply))))?;

    let label = verdict.sentiment.trim().to_uppercase();
    if !settings.has_category(&label) {
        return Err(ClassificationError::UnknownLabel { label });
    }

    let confidence = verdict
        .confidence
        .filter(|c| c.is_finite())
        .map_or(0.5, |c| c.clamp(0.0, 1.0));

    Ok(ClassificationResult {
        label,
        confidence,
        reason: verdict.reason.unwrap_or_default(),
        source: ClassificationSource::Model,
    })
}

fn truncate(reply: &str) -> String {
    reply.chars().take(120).collect()
}
