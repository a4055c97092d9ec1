//! Shared configuration and domain types for hypothesis verification runs.
//!
//! Templates are YAML documents resolved once into an immutable
//! [`ExperimentConfig`]; runtime knobs and credentials come from the
//! environment via [`load_app_config`].

pub mod app_config;
pub mod config;
pub mod error;
pub mod experiment;
pub mod template;
pub mod types;

pub use app_config::{AppConfig, Credentials};
pub use config::{capture_required_vars, load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use experiment::{
    resolve_date_token, AnalysisConfig, ConditionSpec, ExperimentConfig, ExportKind, ExportSpec,
    LlmProvider, MarketDataConfig, OutputConfig, ReportKind, ReportSpec, SentimentCategory,
    SentimentSettings, SocialMediaConfig,
};
pub use template::{load_template, parse_template, TemplateFile};
pub use types::{
    interval_label, AnalysisRecord, ClassificationResult, ClassificationSource, ConditionValue,
    EngagementMetrics, MarketData, Post, PriceBar, NOT_AVAILABLE,
};
