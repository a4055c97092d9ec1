//! Handler for `hypo-cli audit`.

use std::path::Path;

use anyhow::Context as _;
use chrono::Utc;
use hypo_core::{AnalysisRecord, ExperimentConfig};
use hypo_quality::{render_markdown, QualityReport};
use hypo_runner::audit_records;

use crate::run::load_experiment;
use crate::AuditArgs;

/// Read a JSON records export and validate it against `config`.
pub(crate) fn audit_file(path: &Path, config: &ExperimentConfig) -> anyhow::Result<QualityReport> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read records {}", path.display()))?;
    let records: Vec<AnalysisRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("records {} are not a JSON analysis export", path.display()))?;
    tracing::info!(records = records.len(), path = %path.display(), "auditing exported records");
    Ok(audit_records(&records, config))
}

/// # Errors
///
/// Returns an error if either file cannot be loaded or the audit status is
/// FAILED.
pub(crate) fn run_audit(args: &AuditArgs) -> anyhow::Result<()> {
    let config = load_experiment(&args.template, Utc::now().date_naive())?;
    let report = audit_file(&args.records, &config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", render_markdown(&report, &config.name));
    }

    if report.is_failed() {
        anyhow::bail!(
            "dataset quality FAILED with {} critical issue(s)",
            report.critical_issues.len()
        );
    }
    Ok(())
}
