//! Experiment template schema and loading.
//!
//! A template is the YAML document an analyst edits; [`crate::ExperimentConfig`]
//! is the resolved, validated form a run actually uses.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateFile {
    #[serde(default)]
    pub metadata: Option<TemplateMetadata>,
    pub experiment: ExperimentSection,
    pub validation: ValidationSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateMetadata {
    pub template_version: Option<String>,
    pub created_date: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentSection {
    pub name: String,
    pub description: Option<String>,
    pub hypothesis: Option<String>,
    pub data_sources: DataSourcesSection,
    pub sentiment_analysis: SentimentSection,
    pub analysis: AnalysisSection,
    pub output: OutputSection,
    #[serde(default)]
    pub subagents: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSourcesSection {
    pub social_media: SocialMediaSection,
    pub market_data: MarketDataSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialMediaSection {
    pub platform: String,
    pub actor_id: Option<String>,
    #[serde(default)]
    pub accounts: Vec<String>,
    pub keywords: Vec<String>,
    pub date_range: DateRangeSection,
    pub max_posts: usize,
    /// Free-text description of how posts were collected and filtered.
    pub collection_method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRangeSection {
    pub start: String,
    pub end: String,
    /// Human label for the period the analysis claims to cover, e.g. `"past 12 months"`.
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDataSection {
    #[serde(default = "default_market_provider")]
    pub provider: String,
    pub symbols: Vec<SymbolEntry>,
    #[serde(default = "default_data_feed")]
    pub data_feed: String,
}

fn default_market_provider() -> String {
    "alpaca".to_string()
}

fn default_data_feed() -> String {
    "iex".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolEntry {
    pub symbol: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentSection {
    pub llm_provider: String,
    pub model: String,
    pub temperature: f64,
    pub categories: Vec<CategoryEntry>,
    pub custom_prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSection {
    pub time_intervals: Vec<u32>,
    #[serde(default)]
    pub conditions: Vec<ConditionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionEntry {
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub thresholds: BTreeMap<String, u64>,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSection {
    #[serde(default)]
    pub reports: Vec<ReportEntry>,
    #[serde(default)]
    pub data_exports: Vec<ExportEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub filename: String,
    pub style: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSection {
    #[serde(default)]
    pub required_env_vars: Vec<String>,
}

/// Load and validate an experiment template from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_template(path: &Path) -> Result<TemplateFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TemplateIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_template(&content)
}

/// Parse and validate an experiment template from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the text is not valid YAML for the schema or fails validation.
pub fn parse_template(content: &str) -> Result<TemplateFile, ConfigError> {
    let template: TemplateFile = serde_yaml::from_str(content)?;
    validate_template(&template)?;
    Ok(template)
}

fn validate_template(template: &TemplateFile) -> Result<(), ConfigError> {
    let exp = &template.experiment;
    let invalid = |msg: String| Err(ConfigError::Validation(msg));

    if exp.name.trim().is_empty() {
        return invalid("experiment.name must be non-empty".to_string());
    }

    let social = &exp.data_sources.social_media;
    if social.keywords.iter().all(|k| k.trim().is_empty()) {
        return invalid("social_media.keywords must contain at least one keyword".to_string());
    }
    if social.max_posts == 0 {
        return invalid("social_media.max_posts must be greater than zero".to_string());
    }

    let market = &exp.data_sources.market_data;
    if market.symbols.is_empty() {
        return invalid("market_data.symbols must contain at least one symbol".to_string());
    }
    if let Some(s) = market.symbols.iter().find(|s| s.symbol.trim().is_empty()) {
        return invalid(format!("market_data symbol entry {:?} is blank", s.name));
    }

    let sentiment = &exp.sentiment_analysis;
    if sentiment.model.trim().is_empty() {
        return invalid("sentiment_analysis.model must be non-empty".to_string());
    }
    if !(0.0..=2.0).contains(&sentiment.temperature) {
        return invalid(format!(
            "sentiment_analysis.temperature {} is outside [0, 2]",
            sentiment.temperature
        ));
    }
    if sentiment.categories.is_empty() {
        return invalid("sentiment_analysis.categories must not be empty".to_string());
    }
    let mut seen = HashSet::new();
    for cat in &sentiment.categories {
        let name = cat.name.trim().to_uppercase();
        if name.is_empty() {
            return invalid("sentiment category names must be non-empty".to_string());
        }
        if !seen.insert(name) {
            return invalid(format!("duplicate sentiment category: '{}'", cat.name));
        }
    }

    if exp.analysis.time_intervals.is_empty() {
        return invalid("analysis.time_intervals must not be empty".to_string());
    }
    if exp.analysis.time_intervals.contains(&0) {
        return invalid("analysis.time_intervals must be positive hour counts".to_string());
    }

    for report in &exp.output.reports {
        if report.filename.trim().is_empty() {
            return invalid("output report filename must be non-empty".to_string());
        }
    }
    for export in &exp.output.data_exports {
        if export.filename.trim().is_empty() {
            return invalid("output data_export filename must be non-empty".to_string());
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "template_test.rs"]
mod tests;
