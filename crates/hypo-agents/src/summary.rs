//! Markdown summary report for a finished experiment.

use std::collections::BTreeMap;
use std::fmt;

use chrono::Utc;
use hypo_core::{ClassificationSource, NOT_AVAILABLE};

use crate::stats;
use crate::subagent::ReportInput;
use crate::subagents::statistical_analyzer::{BULLISH_VS_BEARISH, POLARITY_CORRELATION};

const SIGNIFICANCE_LEVEL: f64 = 0.05;

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v:.decimals$}"))
}

/// Render the Markdown summary.
///
/// Every configured sentiment category gets a row in the distribution table,
/// including those with no posts.
#[must_use]
pub fn render_summary(input: &ReportInput<'_>) -> String {
    let mut out = String::new();
    if let Err(e) = write_summary(&mut out, input) {
        tracing::error!(error = %e, "summary rendering stopped early");
    }
    out
}

/// Write the Markdown summary into any [`fmt::Write`] sink.
///
/// # Errors
///
/// Propagates the first error returned by `out`.
#[allow(clippy::cast_precision_loss, clippy::too_many_lines)]
pub fn write_summary<W: fmt::Write>(out: &mut W, input: &ReportInput<'_>) -> fmt::Result {
    let config = input.config;
    let records = input.records;

    writeln!(out, "# {} Results\n", config.name)?;
    writeln!(out, "**Generated**: {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"))?;
    if let Some(hypothesis) = &config.hypothesis {
        writeln!(out, "**Hypothesis**: {hypothesis}")?;
    }
    writeln!(
        out,
        "**Subagent System**: {}\n",
        if input.subagents_enabled { "Enabled" } else { "Disabled" }
    )?;

    out.write_str("## Summary\n\n")?;
    writeln!(out, "- Total posts analyzed: {}", records.len())?;
    writeln!(
        out,
        "- Date range: {} to {}",
        config.social.start, config.social.end
    )?;
    if let Some(label) = &config.social.period_label {
        writeln!(out, "- Claimed period: {label}")?;
    }
    writeln!(out, "- Symbols tracked: {}\n", config.market.symbols.join(", "))?;

    if let Some(validation) = input.validation {
        out.write_str("## Data Quality\n\n")?;
        writeln!(out, "- Validation Status: **{}**", validation.status)?;
        if let Some(completeness) = validation.check("completeness") {
            writeln!(out, "- Data Coverage: {:.1}%", completeness.score * 100.0)?;
        }
        if !validation.recommendations.is_empty() {
            out.write_str("\n### Data Quality Recommendations\n\n")?;
            for rec in &validation.recommendations {
                writeln!(out, "- [{}] {}", rec.priority, rec.action)?;
            }
        }
        out.write_char('\n')?;
    }

    if let Some(context) = input.context {
        out.write_str("## Market Context\n\n")?;
        writeln!(out, "- General Trend: {}", context.general_trend)?;
        for (symbol, change) in &context.index_changes {
            writeln!(out, "- {symbol} Change: {change:+.1}%")?;
        }
        writeln!(out, "- Sector Performance: {}", context.sector_performance)?;
        if !context.significant_events.is_empty() {
            out.write_str("\n### Significant Events\n\n")?;
            for event in &context.significant_events {
                writeln!(
                    out,
                    "- {} ({}, {} impact): {}",
                    event.date, event.kind, event.impact, event.description
                )?;
            }
        }
        if !context.confounding_factors.is_empty() {
            out.write_str("\n### Confounding Factors\n\n")?;
            for factor in &context.confounding_factors {
                writeln!(out, "- {factor}")?;
            }
        }
        out.write_char('\n')?;
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for r in records {
        *counts.entry(r.classification.label.as_str()).or_default() += 1;
    }
    let mut labels: Vec<&str> = config
        .sentiment
        .categories
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    for label in counts.keys() {
        if !labels.contains(label) {
            labels.push(label);
        }
    }

    out.write_str("## Sentiment Distribution\n\n")?;
    out.write_str("| Sentiment | Count | Percentage |\n")?;
    out.write_str("|-----------|-------|------------|\n")?;
    for label in &labels {
        let count = counts.get(label).copied().unwrap_or(0);
        let pct = if records.is_empty() {
            0.0
        } else {
            count as f64 / records.len() as f64 * 100.0
        };
        writeln!(out, "| {label} | {count} | {pct:.1}% |")?;
    }
    out.write_char('\n')?;

    let intervals = config.analysis.interval_labels();
    out.write_str("## Average Price Impact by Sentiment\n\n")?;
    out.write_str("| Sentiment | Symbol |")?;
    for interval in &intervals {
        write!(out, " {interval} |")?;
    }
    out.write_str("\n|-----------|--------|")?;
    for _ in &intervals {
        out.write_str("------|")?;
    }
    out.write_char('\n')?;
    for label in &labels {
        for symbol in &config.market.symbols {
            write!(out, "| {label} | {symbol} |")?;
            for interval in &intervals {
                let values: Vec<f64> = records
                    .iter()
                    .filter(|r| r.classification.label == *label)
                    .filter_map(|r| r.impact(symbol, interval))
                    .collect();
                let avg = stats::mean(&values).map_or_else(
                    || NOT_AVAILABLE.to_string(),
                    |v| format!("{v:+.2}%"),
                );
                write!(out, " {avg} |")?;
            }
            out.write_char('\n')?;
        }
    }
    out.write_char('\n')?;

    if let Some(statistics) = input.statistics {
        out.write_str("## Statistical Analysis\n\n### Correlations\n\n")?;
        for test in statistics
            .tests
            .iter()
            .filter(|t| t.comparison == POLARITY_CORRELATION)
        {
            let ci = test.confidence_interval.map_or_else(
                || NOT_AVAILABLE.to_string(),
                |(lo, hi)| format!("[{lo:.3}, {hi:.3}]"),
            );
            let significant = test
                .p_value
                .map_or(NOT_AVAILABLE, |p| if p < SIGNIFICANCE_LEVEL { "yes" } else { "no" });
            writeln!(
                out,
                "- **{} {}**: r={}, p={}, 95% CI {ci}, n={}, significant: {significant}",
                test.symbol,
                test.interval,
                fmt_opt(test.coefficient, 3),
                fmt_opt(test.p_value, 4),
                test.sample_size
            )?;
        }
        out.write_str("\n### Bullish vs Bearish Effect Sizes\n\n")?;
        for test in statistics
            .tests
            .iter()
            .filter(|t| t.comparison == BULLISH_VS_BEARISH)
        {
            writeln!(
                out,
                "- **{} {}**: mean difference={}, Cohen's d={}, n={}",
                test.symbol,
                test.interval,
                fmt_opt(test.coefficient, 3),
                fmt_opt(test.effect_size, 3),
                test.sample_size
            )?;
        }
        out.write_char('\n')?;
    }

    let heuristic = records
        .iter()
        .filter(|r| r.classification.source == ClassificationSource::Heuristic)
        .count();
    out.write_str("## Methodology\n\n")?;
    writeln!(
        out,
        "- Sentiment Model: {} ({})",
        config.sentiment.model, config.sentiment.provider
    )?;
    writeln!(out, "- Temperature: {}", config.sentiment.temperature)?;
    writeln!(
        out,
        "- Time intervals analyzed: {:?} hours",
        config.analysis.time_intervals
    )?;
    writeln!(out, "- Keywords: {}", config.social.keywords.join(", "))?;
    if let Some(method) = &config.social.collection_method {
        writeln!(out, "- Collection method: {method}")?;
    }
    writeln!(
        out,
        "- Market data: {} ({} feed)",
        config.market.provider, config.market.data_feed
    )?;
    writeln!(
        out,
        "- Classifications: {} model, {heuristic} keyword fallback",
        records.len() - heuristic
    )?;

    if input.subagents_enabled {
        out.write_str("\n### Subagents Used\n\n")?;
        out.write_str("- Data Validator: Quality assurance\n")?;
        out.write_str("- Market Context: External factor analysis\n")?;
        if input.statistics.is_some() {
            out.write_str("- Statistical Analyzer: Rigorous validation\n")?;
        }
        out.write_str("- Report Generator: Professional outputs\n")?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "summary_test.rs"]
mod tests;
