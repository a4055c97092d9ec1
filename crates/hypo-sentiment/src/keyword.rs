//! Keyword-overlap heuristic used when the model cannot be reached.

use async_trait::async_trait;
use hypo_core::{ClassificationResult, ClassificationSource};

use crate::classifier::SentimentClassifier;
use crate::error::ClassificationError;

pub(crate) const BULLISH_WORDS: &[&str] = &[
    "great",
    "amazing",
    "excellent",
    "success",
    "breakthrough",
    "bullish",
    "moon",
    "rocket",
    "record",
    "best",
];

pub(crate) const BEARISH_WORDS: &[&str] = &[
    "bad",
    "terrible",
    "failure",
    "problem",
    "concern",
    "issue",
    "difficult",
    "challenge",
    "delay",
    "recall",
];

const HEURISTIC_CONFIDENCE: f64 = 0.5;

/// Labels a post by counting bullish and bearish keywords in its text.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    categories: Vec<String>,
}

impl KeywordClassifier {
    #[must_use]
    pub fn new(categories: Vec<String>) -> Self {
        Self { categories }
    }

    fn has(&self, label: &str) -> bool {
        self.categories.iter().any(|c| c == label)
    }

    /// Never fails. With no configured categories the label is `NEUTRAL`.
    #[must_use]
    pub fn classify_text(&self, text: &str) -> ClassificationResult {
        let lower = text.to_lowercase();
        let bullish = BULLISH_WORDS.iter().filter(|w| lower.contains(**w)).count();
        let bearish = BEARISH_WORDS.iter().filter(|w| lower.contains(**w)).count();

        let preferred = if bullish > bearish && self.has("BULLISH") {
            Some("BULLISH")
        } else if bearish > bullish && self.has("BEARISH") {
            Some("BEARISH")
        } else if self.has("NEUTRAL") {
            Some("NEUTRAL")
        } else {
            None
        };

        let (label, reason) = match preferred {
            Some(label) => (label.to_string(), "Keyword-based"),
            None => (
                self.categories
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "NEUTRAL".to_string()),
                "Default",
            ),
        };

        ClassificationResult {
            label,
            confidence: HEURISTIC_CONFIDENCE,
            reason: reason.to_string(),
            source: ClassificationSource::Heuristic,
        }
    }
}

#[async_trait]
impl SentimentClassifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassificationError> {
        Ok(self.classify_text(text))
    }
}
