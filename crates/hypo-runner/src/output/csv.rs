use hypo_core::AnalysisRecord;

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Flatten records into CSV: one row per post, one `{symbol}_{interval}`
/// column per impact and one column per condition. Missing values are blank.
#[must_use]
pub fn records_to_csv(
    records: &[AnalysisRecord],
    symbols: &[String],
    intervals: &[String],
    conditions: &[String],
) -> String {
    let mut header: Vec<String> = [
        "post_id",
        "timestamp",
        "author",
        "text",
        "likes",
        "shares",
        "sentiment",
        "confidence",
        "reason",
        "classification_source",
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    for symbol in symbols {
        for interval in intervals {
            header.push(format!("{symbol}_{interval}"));
        }
    }
    header.extend(conditions.iter().cloned());

    let mut out = header
        .iter()
        .map(String::as_str)
        .map(escape)
        .collect::<Vec<_>>()
        .join(",");
    out.push('\n');

    for r in records {
        let mut row = vec![
            escape(&r.post.id),
            r.post.timestamp.map(|t| t.to_rfc3339()).unwrap_or_default(),
            escape(&r.post.author),
            escape(&r.post.text),
            r.post.engagement.likes.to_string(),
            r.post.engagement.shares.to_string(),
            escape(&r.classification.label),
            format!("{:.3}", r.classification.confidence),
            escape(&r.classification.reason),
            r.classification.source.to_string(),
        ];
        for symbol in symbols {
            for interval in intervals {
                row.push(
                    r.impact(symbol, interval)
                        .map(|v| format!("{v:.4}"))
                        .unwrap_or_default(),
                );
            }
        }
        for condition in conditions {
            row.push(
                r.conditions
                    .get(condition)
                    .map(|v| escape(&v.to_string()))
                    .unwrap_or_default(),
            );
        }
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}
