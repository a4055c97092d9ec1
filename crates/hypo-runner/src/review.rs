//! Quarterly methodology review bookkeeping.
//!
//! The marker file holds the RFC 3339 time of the last review. A missing or
//! unreadable marker counts as overdue.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};

use crate::error::OutputError;
use crate::output::write_atomic;

pub const MARKER_FILE: &str = ".last_spec_research";
pub const REVIEW_INTERVAL_DAYS: i64 = 90;

#[must_use]
pub fn marker_path(output_root: &Path) -> PathBuf {
    output_root.join(MARKER_FILE)
}

/// When the last review happened, if the marker can be read.
#[must_use]
pub fn last_review(output_root: &Path) -> Option<DateTime<Utc>> {
    let raw = std::fs::read_to_string(marker_path(output_root)).ok()?;
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[must_use]
pub fn review_due(output_root: &Path, now: DateTime<Utc>) -> bool {
    last_review(output_root).map_or(true, |last| {
        now - last >= Duration::days(REVIEW_INTERVAL_DAYS)
    })
}

/// # Errors
///
/// [`OutputError::Io`] if the directory or marker cannot be written.
pub fn record_review(output_root: &Path, now: DateTime<Utc>) -> Result<(), OutputError> {
    std::fs::create_dir_all(output_root).map_err(|e| OutputError::io(output_root, e))?;
    write_atomic(&marker_path(output_root), now.to_rfc3339().as_bytes())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn missing_marker_is_due() {
        let dir = tempfile::tempdir().unwrap();
        assert!(review_due(dir.path(), Utc::now()));
    }

    #[test]
    fn recent_review_is_not_due_until_interval_passes() {
        let dir = tempfile::tempdir().unwrap();
        let reviewed = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        record_review(dir.path(), reviewed).unwrap();

        assert_eq!(last_review(dir.path()), Some(reviewed));
        assert!(!review_due(dir.path(), reviewed + Duration::days(89)));
        assert!(review_due(dir.path(), reviewed + Duration::days(90)));
    }

    #[test]
    fn garbage_marker_is_due() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(marker_path(dir.path()), "last tuesday").unwrap();
        assert!(review_due(dir.path(), Utc::now()));
    }
}
