use async_trait::async_trait;
use hypo_core::ClassificationResult;

use crate::error::ClassificationError;

/// Anything that can label a post's text with one of the configured categories.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ClassificationResult, ClassificationError>;
}
