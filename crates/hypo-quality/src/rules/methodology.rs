use super::ratio;
use crate::types::{CheckResult, CheckStatus, Issue, Severity};
use crate::ValidationDataset;

fn documented(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

#[must_use]
pub fn methodology(dataset: &ValidationDataset<'_>) -> CheckResult {
    let m = &dataset.methodology;

    let items = [
        (
            documented(m.classification_prompt.as_deref()),
            Issue::new(Severity::High, "Sentiment classification prompt not included")
                .with_impact("Cannot reproduce sentiment analysis"),
        ),
        (
            documented(m.provider.as_deref())
                && documented(m.model.as_deref())
                && m.temperature.is_some_and(f64::is_finite),
            Issue::new(
                Severity::Medium,
                "LLM provider, model and temperature are not all specified",
            ),
        ),
        (
            documented(m.collection_method.as_deref()),
            Issue::new(Severity::Medium, "No data collection methodology details")
                .with_impact("Readers cannot tell how posts were filtered and collected"),
        ),
        (
            documented(m.market_data_source.as_deref()),
            Issue::new(Severity::Low, "Market data source not identified"),
        ),
        (
            m.keywords.iter().any(|k| !k.trim().is_empty()),
            Issue::new(Severity::Low, "Keyword list not disclosed"),
        ),
    ];

    let tracked = items.len();
    let mut present = 0;
    let mut issues = Vec::new();
    for (ok, issue) in items {
        if ok {
            present += 1;
        } else {
            issues.push(issue);
        }
    }

    let status = if issues.is_empty() {
        CheckStatus::Passed
    } else {
        CheckStatus::Warning
    };
    CheckResult::new(status, issues, ratio(present, tracked))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{dataset, scenario_a};

    #[test]
    fn full_disclosure_passes() {
        let records = scenario_a();
        assert_eq!(methodology(&dataset(&records)), CheckResult::passed());
    }

    #[test]
    fn missing_prompt_and_collection_method() {
        let records = scenario_a();
        let mut ds = dataset(&records);
        ds.methodology.classification_prompt = None;
        ds.methodology.collection_method = Some("   ".to_string());
        let result = methodology(&ds);
        assert_eq!(result.status, CheckStatus::Warning);
        assert!((result.score - 0.6).abs() < 1e-12);
        let severities: Vec<_> = result.issues.iter().map(|i| i.severity).collect();
        assert_eq!(severities, vec![Severity::High, Severity::Medium]);
    }

    #[test]
    fn nan_temperature_counts_as_undocumented() {
        let records = scenario_a();
        let mut ds = dataset(&records);
        ds.methodology.temperature = Some(f64::NAN);
        ds.methodology.keywords.clear();
        let result = methodology(&ds);
        assert_eq!(result.issues.len(), 2);
        assert_eq!(result.issues[1].severity, Severity::Low);
    }
}
