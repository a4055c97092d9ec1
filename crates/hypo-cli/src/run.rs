//! Handler for `hypo-cli run`.
//!
//! A failed run is returned as an error so the process exits non-zero; a
//! validation failure also prints the full quality report to stderr.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use chrono::{NaiveDate, Utc};
use hypo_agents::SubagentOrchestrator;
use hypo_core::{AppConfig, ExperimentConfig};
use hypo_runner::{
    describe_plan, standard_orchestrator, Collaborators, ExperimentRunner, RunError, RunOptions,
};

use crate::RunArgs;

/// Load a template and resolve it against `today`.
pub(crate) fn load_experiment(path: &Path, today: NaiveDate) -> anyhow::Result<ExperimentConfig> {
    let template = hypo_core::load_template(path)?;
    ExperimentConfig::from_template(&template, today)
        .with_context(|| format!("invalid experiment template {}", path.display()))
}

pub(crate) fn run_options(app: &AppConfig, args: &RunArgs) -> RunOptions {
    let mut options = RunOptions::from_app_config(app);
    if let Some(dir) = &args.output_dir {
        options.output_root.clone_from(dir);
    }
    options.subagents_enabled = !args.no_subagents;
    options
}

/// Apply `--only` / `--disable` to a registered orchestrator. Unknown names
/// are logged and otherwise ignored.
pub(crate) fn configure_orchestrator(
    mut orchestrator: SubagentOrchestrator,
    args: &RunArgs,
) -> SubagentOrchestrator {
    let known = orchestrator.names();
    for name in args.only.iter().chain(&args.disable) {
        if !known.contains(&name.as_str()) {
            tracing::warn!(subagent = %name, ?known, "unknown subagent name ignored");
        }
    }
    if !args.only.is_empty() {
        orchestrator.set_only(args.only.iter().cloned());
    }
    for name in &args.disable {
        orchestrator.disable(name.clone());
    }
    orchestrator
}

/// Capture the template's required variables on top of `app` and fail with
/// the full list of those still unset.
pub(crate) fn check_environment(
    app: &AppConfig,
    config: &ExperimentConfig,
) -> Result<AppConfig, RunError> {
    let mut app = app.clone();
    hypo_core::capture_required_vars(&mut app, &config.required_env_vars);
    let missing = app.credentials.missing(&config.required_env_vars);
    if missing.is_empty() {
        Ok(app)
    } else {
        Err(RunError::Environment { missing })
    }
}

/// Load, wire and run one experiment, printing the run summary as JSON.
///
/// # Errors
///
/// Returns an error if the template is invalid, credentials are missing,
/// a client cannot be built, or the run fails at any fatal step.
pub(crate) async fn run_experiment(app: &AppConfig, args: &RunArgs) -> anyhow::Result<()> {
    let config = load_experiment(&args.template, Utc::now().date_naive())?;
    let options = run_options(app, args);

    if args.dry_run {
        println!("dry-run: would run\n{}", describe_plan(&config, &options));
        return Ok(());
    }

    let app = check_environment(app, &config)?;

    let collaborators = Collaborators::live(&config, &app)?;
    let orchestrator = if args.no_subagents {
        SubagentOrchestrator::new()
    } else {
        configure_orchestrator(
            standard_orchestrator(Arc::clone(&collaborators.market), app.inter_call_delay()),
            args,
        )
    };

    let name = config.name.clone();
    let mut runner = ExperimentRunner::new(config, app, collaborators, orchestrator, options);
    match runner.run().await {
        Ok(summary) => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Err(failure) => {
            if let RunError::ValidationFailed { report } = &failure.error {
                eprintln!("{}", hypo_quality::render_markdown(report, &name));
            }
            Err(failure.into())
        }
    }
}
