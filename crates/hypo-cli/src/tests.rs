use std::io::Write as _;

use chrono::NaiveDate;
use hypo_agents::{DataValidator, ReportGenerator, SubagentOrchestrator};
use hypo_core::{AppConfig, Credentials};

use super::*;

const TEMPLATE: &str = r#"
experiment:
  name: CLI Check
  data_sources:
    social_media:
      platform: twitter
      accounts: [elonmusk]
      keywords: [tesla]
      date_range: { start: "30_days_ago", end: "now" }
      max_posts: 5
    market_data:
      symbols: [{ symbol: TSLA }]
  sentiment_analysis:
    llm_provider: openai
    model: gpt-4o-mini
    temperature: 0.1
    categories:
      - { name: BULLISH, description: up }
      - { name: BEARISH, description: down }
  analysis:
    time_intervals: [24]
  output:
    data_exports:
      - { type: json, filename: records }
validation:
  required_env_vars: [APIFY_API_KEY]
"#;

fn template_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(TEMPLATE.as_bytes()).expect("write template");
    file
}

fn run_args(argv: &[&str]) -> RunArgs {
    let cli = Cli::try_parse_from(argv).expect("expected valid cli args");
    match cli.command {
        Commands::Run(args) => args,
        Commands::Audit(_) => panic!("expected run command"),
    }
}

fn app() -> AppConfig {
    AppConfig {
        log_level: "info".to_string(),
        output_dir: "./results".into(),
        request_timeout_secs: 5,
        inter_call_delay_ms: 0,
        max_retries: 0,
        retry_backoff_base_ms: 1,
        credentials: Credentials::default(),
    }
}

#[test]
fn parses_run_with_defaults() {
    let args = run_args(&["hypo-cli", "run", "exp.yaml"]);
    assert_eq!(args.template, PathBuf::from("exp.yaml"));
    assert!(args.output_dir.is_none());
    assert!(!args.dry_run);
    assert!(!args.no_subagents);
    assert!(args.only.is_empty());
    assert!(args.disable.is_empty());
}

#[test]
fn parses_subagent_filters() {
    let args = run_args(&[
        "hypo-cli",
        "run",
        "exp.yaml",
        "--only",
        "data_validator,report_generator",
        "--disable",
        "market_context",
        "--dry-run",
    ]);
    assert_eq!(args.only, vec!["data_validator", "report_generator"]);
    assert_eq!(args.disable, vec!["market_context"]);
    assert!(args.dry_run);
}

#[test]
fn no_subagents_conflicts_with_filters() {
    let result = Cli::try_parse_from(["hypo-cli", "run", "exp.yaml", "--no-subagents", "--only", "x"]);
    assert!(result.is_err());
}

#[test]
fn missing_command_is_rejected() {
    assert!(Cli::try_parse_from(["hypo-cli"]).is_err());
}

#[test]
fn parses_audit_command() {
    let cli = Cli::try_parse_from([
        "hypo-cli",
        "audit",
        "records.json",
        "--template",
        "exp.yaml",
        "--json",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Audit(AuditArgs { ref records, json: true, .. }) if records == &PathBuf::from("records.json")
    ));
}

#[test]
fn audit_requires_template() {
    assert!(Cli::try_parse_from(["hypo-cli", "audit", "records.json"]).is_err());
}

#[test]
fn load_experiment_resolves_relative_dates() {
    let file = template_file();
    let today = NaiveDate::from_ymd_opt(2024, 4, 30).unwrap();
    let config = run::load_experiment(file.path(), today).unwrap();
    assert_eq!(config.name, "CLI Check");
    assert_eq!(config.social.end, today);
    assert_eq!(config.social.start, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
}

#[test]
fn load_experiment_reports_missing_file() {
    let today = NaiveDate::from_ymd_opt(2024, 4, 30).unwrap();
    let err = run::load_experiment(std::path::Path::new("/nonexistent/exp.yaml"), today)
        .unwrap_err();
    assert!(err.to_string().contains("/nonexistent/exp.yaml"));
}

#[test]
fn run_options_follow_flags() {
    let args = run_args(&["hypo-cli", "run", "exp.yaml", "--output-dir", "/tmp/out", "--no-subagents"]);
    let options = run::run_options(&app(), &args);
    assert_eq!(options.output_root, PathBuf::from("/tmp/out"));
    assert!(!options.subagents_enabled);

    let args = run_args(&["hypo-cli", "run", "exp.yaml"]);
    let options = run::run_options(&app(), &args);
    assert_eq!(options.output_root, PathBuf::from("./results"));
    assert!(options.subagents_enabled);
}

#[test]
fn orchestrator_filters_are_applied() {
    let mut orchestrator = SubagentOrchestrator::new();
    orchestrator.register(Box::new(DataValidator::new()));
    orchestrator.register(Box::new(ReportGenerator::new()));

    let args = run_args(&[
        "hypo-cli",
        "run",
        "exp.yaml",
        "--only",
        "data_validator,report_generator,unknown",
        "--disable",
        "report_generator",
    ]);
    let orchestrator = run::configure_orchestrator(orchestrator, &args);
    assert!(orchestrator.is_active("data_validator"));
    assert!(!orchestrator.is_active("report_generator"));
}

#[tokio::test]
async fn dry_run_touches_nothing() {
    let file = template_file();
    let out = tempfile::tempdir().unwrap();
    let out_path = out.path().join("results");
    let args = run_args(&[
        "hypo-cli",
        "run",
        file.path().to_str().unwrap(),
        "--dry-run",
        "--output-dir",
        out_path.to_str().unwrap(),
    ]);
    run::run_experiment(&app(), &args).await.unwrap();
    assert!(!out_path.exists());
}

#[tokio::test]
async fn missing_credentials_fail_before_any_call() {
    let file = template_file();
    let args = run_args(&["hypo-cli", "run", file.path().to_str().unwrap()]);
    let err = run::run_experiment(&app(), &args).await.unwrap_err();
    assert!(err.to_string().contains("APIFY_API_KEY"));
}

#[test]
fn custom_required_vars_are_read_after_the_template_is_loaded() {
    std::env::set_var("HYPO_CLI_TEST_FEED_TOKEN", "feed-secret");
    let file = template_file();
    let today = NaiveDate::from_ymd_opt(2024, 4, 30).unwrap();
    let mut config = run::load_experiment(file.path(), today).unwrap();
    config.required_env_vars = vec![
        "HYPO_CLI_TEST_FEED_TOKEN".to_string(),
        "HYPO_CLI_TEST_NEVER_SET".to_string(),
    ];

    let err = run::check_environment(&app(), &config).unwrap_err();
    match err {
        hypo_runner::RunError::Environment { missing } => {
            assert_eq!(missing, vec!["HYPO_CLI_TEST_NEVER_SET"]);
        }
        other => panic!("expected environment error, got {other}"),
    }

    config.required_env_vars.pop();
    let captured = run::check_environment(&app(), &config).unwrap();
    assert_eq!(captured.credentials.get("HYPO_CLI_TEST_FEED_TOKEN"), Some("feed-secret"));
}

#[test]
fn audit_of_empty_export_fails_sample_size() {
    let template = template_file();
    let today = NaiveDate::from_ymd_opt(2024, 4, 30).unwrap();
    let config = run::load_experiment(template.path(), today).unwrap();

    let mut records = tempfile::NamedTempFile::new().unwrap();
    records.write_all(b"[]").unwrap();
    let report = audit::audit_file(records.path(), &config).unwrap();
    assert_eq!(report.checks.len(), 7);
    assert!(report.is_failed());
}

#[test]
fn audit_rejects_malformed_export() {
    let template = template_file();
    let today = NaiveDate::from_ymd_opt(2024, 4, 30).unwrap();
    let config = run::load_experiment(template.path(), today).unwrap();

    let mut records = tempfile::NamedTempFile::new().unwrap();
    records.write_all(b"{\"not\": \"records\"}").unwrap();
    let err = audit::audit_file(records.path(), &config).unwrap_err();
    assert!(err.to_string().contains("not a JSON analysis export"));
}
