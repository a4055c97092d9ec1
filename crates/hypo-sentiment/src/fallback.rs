use async_trait::async_trait;
use hypo_core::ClassificationResult;

use crate::classifier::SentimentClassifier;
use crate::error::ClassificationError;
use crate::keyword::KeywordClassifier;

/// A primary classifier backed by the keyword heuristic.
///
/// Any primary failure is logged and replaced by the heuristic result, so
/// [`FallbackClassifier::classify_or_fallback`] always yields a label.
pub struct FallbackClassifier {
    primary: Option<Box<dyn SentimentClassifier>>,
    heuristic: KeywordClassifier,
}

impl FallbackClassifier {
    #[must_use]
    pub fn new(primary: Box<dyn SentimentClassifier>, heuristic: KeywordClassifier) -> Self {
        Self {
            primary: Some(primary),
            heuristic,
        }
    }

    /// Heuristic-only classification, used when no model credential exists.
    #[must_use]
    pub fn heuristic_only(heuristic: KeywordClassifier) -> Self {
        Self {
            primary: None,
            heuristic,
        }
    }

    pub async fn classify_or_fallback(&self, text: &str) -> ClassificationResult {
        let Some(primary) = &self.primary else {
            return self.heuristic.classify_text(text);
        };
        match primary.classify(text).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(error = %err, "model classification failed, using keyword heuristic");
                self.heuristic.classify_text(text)
            }
        }
    }
}

#[async_trait]
impl SentimentClassifier for FallbackClassifier {
    async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassificationError> {
        Ok(self.classify_or_fallback(text).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypo_core::ClassificationSource;

    struct Failing;

    #[async_trait]
    impl SentimentClassifier for Failing {
        async fn classify(&self, _text: &str) -> Result<ClassificationResult, ClassificationError> {
            Err(ClassificationError::MalformedReply("nope".to_string()))
        }
    }

    struct Fixed;

    #[async_trait]
    impl SentimentClassifier for Fixed {
        async fn classify(&self, _text: &str) -> Result<ClassificationResult, ClassificationError> {
            Ok(ClassificationResult {
                label: "BEARISH".to_string(),
                confidence: 0.9,
                reason: "model".to_string(),
                source: ClassificationSource::Model,
            })
        }
    }

    fn heuristic() -> KeywordClassifier {
        KeywordClassifier::new(vec![
            "BULLISH".to_string(),
            "BEARISH".to_string(),
            "NEUTRAL".to_string(),
        ])
    }

    #[tokio::test]
    async fn primary_result_is_kept() {
        let c = FallbackClassifier::new(Box::new(Fixed), heuristic());
        let r = c.classify_or_fallback("great").await;
        assert_eq!(r.label, "BEARISH");
        assert_eq!(r.source, ClassificationSource::Model);
    }

    #[tokio::test]
    async fn failure_falls_back_to_tagged_heuristic() {
        let c = FallbackClassifier::new(Box::new(Failing), heuristic());
        let r = c.classify("amazing breakthrough").await.unwrap();
        assert_eq!(r.label, "BULLISH");
        assert_eq!(r.source, ClassificationSource::Heuristic);
        assert!((r.confidence - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn heuristic_only_never_calls_a_model() {
        let c = FallbackClassifier::heuristic_only(heuristic());
        assert_eq!(c.classify_or_fallback("recall").await.label, "BEARISH");
    }
}
