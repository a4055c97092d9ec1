mod audit;
mod run;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "hypo-cli")]
#[command(about = "Run hypothesis verification experiments from YAML templates")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collect, classify and analyse posts as described by a template.
    Run(RunArgs),
    /// Re-run the quality validator over an exported JSON dataset.
    Audit(AuditArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Experiment template (YAML).
    template: PathBuf,

    /// Root directory for results; overrides `HYPO_OUTPUT_DIR`.
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Validate the template and print the plan without calling any service.
    #[arg(long)]
    dry_run: bool,

    /// Run without any subagents.
    #[arg(long, conflicts_with_all = ["only", "disable"])]
    no_subagents: bool,

    /// Restrict the run to these subagents.
    #[arg(long, value_name = "NAME", value_delimiter = ',')]
    only: Vec<String>,

    /// Skip these subagents.
    #[arg(long, value_name = "NAME", value_delimiter = ',')]
    disable: Vec<String>,
}

#[derive(Debug, Args)]
struct AuditArgs {
    /// JSON export of analysis records from a previous run.
    records: PathBuf,

    /// Template the records were produced from.
    #[arg(long, value_name = "FILE")]
    template: PathBuf,

    /// Print the report as JSON instead of Markdown.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = hypo_core::load_app_config(&[])?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Run(args) => run::run_experiment(&config, &args).await,
        Commands::Audit(args) => audit::run_audit(&args),
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
