//! Sentiment classification for collected posts.
//!
//! [`LlmClassifier`] asks the configured model for a JSON verdict.
//! [`KeywordClassifier`] is the keyword-overlap heuristic, and
//! [`FallbackClassifier`] combines the two so that a post always gets a
//! label, tagged with the source that produced it.

pub mod classifier;
pub mod error;
pub mod fallback;
pub mod keyword;
pub mod llm;
pub mod prompt;

pub use classifier::SentimentClassifier;
pub use error::ClassificationError;
pub use fallback::FallbackClassifier;
pub use keyword::KeywordClassifier;
pub use llm::LlmClassifier;
pub use prompt::{build_prompt, parse_reply};
