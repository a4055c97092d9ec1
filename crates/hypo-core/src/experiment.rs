use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::template::{ReportEntry, TemplateFile};
use crate::types::interval_label;
use crate::ConfigError;

/// Name under which the statistical analyzer can be explicitly opted in.
pub const STATISTICAL_ANALYZER: &str = "statistical_analyzer";

fn days_ago_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d+)_days_ago$").expect("valid days_ago regex"))
}

/// Resolve a template date token against `today`.
///
/// Accepts `"now"`, `"<N>_days_ago"` and absolute `YYYY-MM-DD` dates.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidDateToken`] for anything else, including a
/// day count too large to subtract from `today`.
pub fn resolve_date_token(token: &str, today: NaiveDate) -> Result<NaiveDate, ConfigError> {
    let token = token.trim();
    if token == "now" {
        return Ok(today);
    }
    if let Some(caps) = days_ago_pattern().captures(token) {
        let days: i64 = caps[1]
            .parse()
            .map_err(|_| ConfigError::InvalidDateToken(token.to_string()))?;
        return Duration::try_days(days)
            .and_then(|d| today.checked_sub_signed(d))
            .ok_or_else(|| ConfigError::InvalidDateToken(token.to_string()));
    }
    NaiveDate::parse_from_str(token, "%Y-%m-%d")
        .map_err(|_| ConfigError::InvalidDateToken(token.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAi,
    Anthropic,
}

impl LlmProvider {
    /// Environment variable holding this provider's API key.
    #[must_use]
    pub fn credential_var(self) -> &'static str {
        match self {
            LlmProvider::OpenAi => crate::app_config::OPENAI_API_KEY,
            LlmProvider::Anthropic => crate::app_config::ANTHROPIC_API_KEY,
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAi),
            "anthropic" => Ok(LlmProvider::Anthropic),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm_provider '{other}'; expected 'openai' or 'anthropic'"
            ))),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::OpenAi => write!(f, "openai"),
            LlmProvider::Anthropic => write!(f, "anthropic"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentCategory {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSettings {
    pub provider: LlmProvider,
    pub model: String,
    pub temperature: f64,
    pub categories: Vec<SentimentCategory>,
    pub custom_prompt: Option<String>,
}

impl SentimentSettings {
    #[must_use]
    pub fn category_names(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.name.clone()).collect()
    }

    #[must_use]
    pub fn has_category(&self, label: &str) -> bool {
        self.categories.iter().any(|c| c.name == label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialMediaConfig {
    pub platform: String,
    pub actor_id: Option<String>,
    pub accounts: Vec<String>,
    pub keywords: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Period the analysis claims to cover, e.g. `"past 12 months"`.
    pub period_label: Option<String>,
    pub max_posts: usize,
    pub collection_method: Option<String>,
}

impl SocialMediaConfig {
    /// Whole days between start and end, never less than one.
    #[must_use]
    pub fn day_span(&self) -> i64 {
        (self.end - self.start).num_days().max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketDataConfig {
    pub provider: String,
    pub symbols: Vec<String>,
    pub data_feed: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionSpec {
    pub name: String,
    pub thresholds: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub time_intervals: Vec<u32>,
    /// Enabled conditions only.
    pub conditions: Vec<ConditionSpec>,
}

impl AnalysisConfig {
    #[must_use]
    pub fn interval_labels(&self) -> Vec<String> {
        self.time_intervals.iter().copied().map(interval_label).collect()
    }

    #[must_use]
    pub fn condition(&self, name: &str) -> Option<&ConditionSpec> {
        self.conditions.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Markdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Csv,
    Json,
}

impl ExportKind {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            ExportKind::Csv => "csv",
            ExportKind::Json => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSpec {
    pub kind: ReportKind,
    pub filename: String,
    pub style: Option<String>,
}

impl ReportSpec {
    /// `true` for the `academic` and `publication` styles.
    #[must_use]
    pub fn is_rigorous(&self) -> bool {
        self.style
            .as_deref()
            .is_some_and(|s| matches!(s.to_lowercase().as_str(), "academic" | "publication"))
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        with_extension(&self.filename, "md")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSpec {
    pub kind: ExportKind,
    pub filename: String,
}

impl ExportSpec {
    #[must_use]
    pub fn file_name(&self) -> String {
        with_extension(&self.filename, self.kind.extension())
    }
}

fn with_extension(filename: &str, ext: &str) -> String {
    let suffix = format!(".{ext}");
    if filename.to_lowercase().ends_with(&suffix) {
        filename.to_string()
    } else {
        format!("{filename}{suffix}")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub reports: Vec<ReportSpec>,
    pub exports: Vec<ExportSpec>,
}

impl OutputConfig {
    #[must_use]
    pub fn wants_statistical_rigor(&self) -> bool {
        self.reports.iter().any(ReportSpec::is_rigorous)
    }
}

/// Resolved experiment settings for one run. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub name: String,
    pub description: Option<String>,
    pub hypothesis: Option<String>,
    pub social: SocialMediaConfig,
    pub market: MarketDataConfig,
    pub sentiment: SentimentSettings,
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
    /// Subagent names explicitly opted in by the template.
    pub subagents: Vec<String>,
    pub required_env_vars: Vec<String>,
}

impl ExperimentConfig {
    /// Resolve a parsed template into an experiment configuration.
    ///
    /// Date tokens are resolved against `today` so callers control the clock.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for unresolvable date tokens, an inverted date
    /// range, or unsupported provider/report/export kinds.
    pub fn from_template(template: &TemplateFile, today: NaiveDate) -> Result<Self, ConfigError> {
        let exp = &template.experiment;
        let social = &exp.data_sources.social_media;

        let start = resolve_date_token(&social.date_range.start, today)?;
        let end = resolve_date_token(&social.date_range.end, today)?;
        if start > end {
            return Err(ConfigError::Validation(format!(
                "date_range start {start} is after end {end}"
            )));
        }

        let sentiment = &exp.sentiment_analysis;
        let categories = sentiment
            .categories
            .iter()
            .map(|c| SentimentCategory {
                name: c.name.trim().to_uppercase(),
                description: c.description.trim().to_string(),
            })
            .collect();

        let reports = exp
            .output
            .reports
            .iter()
            .map(report_spec)
            .collect::<Result<Vec<_>, _>>()?;
        let exports = exp
            .output
            .data_exports
            .iter()
            .map(|e| {
                let kind = match e.kind.to_lowercase().as_str() {
                    "csv" => ExportKind::Csv,
                    "json" => ExportKind::Json,
                    other => {
                        return Err(ConfigError::Validation(format!(
                            "unsupported data_export type '{other}'"
                        )))
                    }
                };
                Ok(ExportSpec {
                    kind,
                    filename: e.filename.trim().to_string(),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self {
            name: exp.name.trim().to_string(),
            description: exp.description.clone(),
            hypothesis: exp.hypothesis.clone(),
            social: SocialMediaConfig {
                platform: social.platform.clone(),
                actor_id: social.actor_id.clone(),
                accounts: social.accounts.clone(),
                keywords: social
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect(),
                start,
                end,
                period_label: social.date_range.label.clone(),
                max_posts: social.max_posts,
                collection_method: social.collection_method.clone(),
            },
            market: MarketDataConfig {
                provider: exp.data_sources.market_data.provider.clone(),
                symbols: exp
                    .data_sources
                    .market_data
                    .symbols
                    .iter()
                    .map(|s| s.symbol.trim().to_uppercase())
                    .collect(),
                data_feed: exp.data_sources.market_data.data_feed.clone(),
            },
            sentiment: SentimentSettings {
                provider: sentiment.llm_provider.parse()?,
                model: sentiment.model.clone(),
                temperature: sentiment.temperature,
                categories,
                custom_prompt: sentiment.custom_prompt.clone(),
            },
            analysis: AnalysisConfig {
                time_intervals: exp.analysis.time_intervals.clone(),
                conditions: exp
                    .analysis
                    .conditions
                    .iter()
                    .filter(|c| c.enabled)
                    .map(|c| ConditionSpec {
                        name: c.name.clone(),
                        thresholds: c.thresholds.clone(),
                    })
                    .collect(),
            },
            output: OutputConfig { reports, exports },
            subagents: exp.subagents.clone(),
            required_env_vars: template.validation.required_env_vars.clone(),
        })
    }

    #[must_use]
    pub fn opts_in(&self, subagent: &str) -> bool {
        self.subagents.iter().any(|s| s == subagent)
    }

    /// Whether the post-analysis stage should run for this experiment.
    #[must_use]
    pub fn wants_statistical_analysis(&self) -> bool {
        self.output.wants_statistical_rigor() || self.opts_in(STATISTICAL_ANALYZER)
    }
}

fn report_spec(entry: &ReportEntry) -> Result<ReportSpec, ConfigError> {
    let kind = match entry.kind.to_lowercase().as_str() {
        "markdown" | "md" => ReportKind::Markdown,
        other => {
            return Err(ConfigError::Validation(format!(
                "unsupported report type '{other}'"
            )))
        }
    };
    Ok(ReportSpec {
        kind,
        filename: entry.filename.trim().to_string(),
        style: entry.style.clone(),
    })
}
