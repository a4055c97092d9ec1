//! One pure function per analysis-level quality check.

mod completeness;
mod consistency;
mod integration;
mod methodology;
mod sample_size;
mod statistical;
mod temporal;

pub use completeness::completeness;
pub use consistency::consistency;
pub use integration::source_integration;
pub use methodology::methodology;
pub use sample_size::{sample_adequacy, sample_size, SampleAdequacy, SAMPLE_REQUIREMENTS};
pub use statistical::statistical_validity;
pub use temporal::{claimed_period_days, temporal_coverage, temporal_coverage_with_tolerance};

use crate::types::{CheckName, CheckResult};
use crate::ValidationDataset;

/// Run one named check.
#[must_use]
pub fn run(name: CheckName, dataset: &ValidationDataset<'_>) -> CheckResult {
    match name {
        CheckName::Completeness => completeness(dataset),
        CheckName::Consistency => consistency(dataset),
        CheckName::StatisticalValidity => statistical_validity(dataset),
        CheckName::TemporalCoverage => temporal_coverage(dataset),
        CheckName::SourceIntegration => source_integration(dataset),
        CheckName::SampleSize => sample_size(dataset),
        CheckName::Methodology => methodology(dataset),
    }
}

/// `part / whole` as a fraction, zero for an empty whole.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
