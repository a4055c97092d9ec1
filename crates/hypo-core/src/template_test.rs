use std::path::Path;

use super::*;

const VALID: &str = r#"
experiment:
  name: Sample
  data_sources:
    social_media:
      platform: twitter
      keywords: [tesla]
      date_range: { start: 7_days_ago, end: now }
      max_posts: 5
    market_data:
      symbols: [{ symbol: TSLA }]
  sentiment_analysis:
    llm_provider: anthropic
    model: claude-3-haiku-20240307
    temperature: 0.1
    categories:
      - { name: BULLISH, description: up }
      - { name: BEARISH, description: down }
  analysis:
    time_intervals: [24]
  output:
    reports: []
    data_exports: []
validation:
  required_env_vars: [ANTHROPIC_API_KEY]
"#;

fn expect_validation(yaml: &str, needle: &str) {
    let result = parse_template(yaml);
    match result {
        Err(ConfigError::Validation(msg)) => assert!(
            msg.contains(needle),
            "expected message containing {needle:?}, got {msg:?}"
        ),
        other => panic!("expected Validation error, got {other:?}"),
    }
}

#[test]
fn parse_fills_optional_fields_with_defaults() {
    let template = parse_template(VALID).unwrap();
    let exp = &template.experiment;
    assert_eq!(exp.data_sources.market_data.provider, "alpaca");
    assert_eq!(exp.data_sources.market_data.data_feed, "iex");
    assert!(exp.output.reports.is_empty());
    assert!(exp.output.data_exports.is_empty());
    assert!(exp.subagents.is_empty());
    assert!(template.metadata.is_none());
    assert_eq!(template.validation.required_env_vars, vec!["ANTHROPIC_API_KEY"]);
}

#[test]
fn parse_rejects_missing_section() {
    let yaml = VALID.replace("validation:\n  required_env_vars: [ANTHROPIC_API_KEY]\n", "");
    let result = parse_template(&yaml);
    assert!(
        matches!(result, Err(ConfigError::TemplateParse(_))),
        "got: {result:?}"
    );
}

#[test]
fn parse_rejects_missing_output_section() {
    let yaml = VALID.replace("  output:\n    reports: []\n    data_exports: []\n", "");
    assert_ne!(yaml, VALID);
    let result = parse_template(&yaml);
    assert!(
        matches!(result, Err(ConfigError::TemplateParse(ref e)) if e.to_string().contains("output")),
        "got: {result:?}"
    );
}

#[test]
fn output_lists_may_be_omitted_inside_the_section() {
    let yaml = VALID.replace("    reports: []\n    data_exports: []\n", "    {}\n");
    let template = parse_template(&yaml).unwrap();
    assert!(template.experiment.output.reports.is_empty());
    assert!(template.experiment.output.data_exports.is_empty());
}

#[test]
fn validate_rejects_empty_name() {
    expect_validation(&VALID.replace("name: Sample", "name: \"  \""), "experiment.name");
}

#[test]
fn validate_rejects_empty_keywords() {
    expect_validation(&VALID.replace("keywords: [tesla]", "keywords: []"), "keywords");
}

#[test]
fn validate_rejects_out_of_range_temperature() {
    expect_validation(
        &VALID.replace("temperature: 0.1", "temperature: 3.5"),
        "temperature",
    );
}

#[test]
fn validate_rejects_duplicate_categories_case_insensitively() {
    expect_validation(
        &VALID.replace("name: BEARISH, description: down", "name: bullish, description: dup"),
        "duplicate sentiment category",
    );
}

#[test]
fn validate_rejects_zero_interval() {
    expect_validation(
        &VALID.replace("time_intervals: [24]", "time_intervals: [0, 24]"),
        "time_intervals",
    );
}

#[test]
fn validate_rejects_zero_max_posts() {
    expect_validation(&VALID.replace("max_posts: 5", "max_posts: 0"), "max_posts");
}

#[test]
fn load_template_reports_missing_file() {
    let result = load_template(Path::new("/nonexistent/template.yaml"));
    assert!(
        matches!(result, Err(ConfigError::TemplateIo { ref path, .. }) if path.contains("nonexistent")),
        "got: {result:?}"
    );
}

#[test]
fn load_template_from_real_file() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("config")
        .join("experiments")
        .join("example.yaml");
    assert!(path.exists(), "example.yaml missing at {path:?}");
    let template = load_template(&path).expect("failed to load example.yaml");
    let exp = &template.experiment;
    assert!(!exp.data_sources.market_data.symbols.is_empty());
    assert_eq!(exp.sentiment_analysis.categories.len(), 3);
    assert_eq!(
        exp.data_sources.social_media.date_range.label.as_deref(),
        Some("past 90 days")
    );
    let engagement = exp
        .analysis
        .conditions
        .iter()
        .find(|c| c.name == "engagement_level")
        .expect("engagement_level condition");
    assert_eq!(engagement.thresholds.get("viral"), Some(&1_000_000));
}
