//! Numeric helpers for the statistical analyzer, on top of `statrs`.
//!
//! `statrs` returns NaN for undefined statistics; these wrappers turn that
//! into `None` so callers can serialize the gaps as nulls.

use statrs::function::erf::{erf_inv, erfc};
use statrs::statistics::Statistics;

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// z for a two-sided 95 % interval.
#[must_use]
pub fn z_95() -> f64 {
    std::f64::consts::SQRT_2 * erf_inv(0.95)
}

#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    finite(values.iter().mean())
}

/// Sample standard deviation (n − 1 denominator).
#[must_use]
pub fn sample_sd(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    finite(values.iter().std_dev())
}

/// Pearson correlation, `None` for fewer than three pairs or zero variance.
#[must_use]
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 3 {
        return None;
    }
    let (sx, sy) = (sample_sd(xs)?, sample_sd(ys)?);
    if sx <= 0.0 || sy <= 0.0 {
        return None;
    }
    let cov = finite(xs.iter().covariance(ys.iter()))?;
    Some((cov / (sx * sy)).clamp(-1.0, 1.0))
}

// Keeps atanh finite for |r| = 1.
fn fisher_z(r: f64) -> f64 {
    r.clamp(-0.999_999, 0.999_999).atanh()
}

/// 95 % confidence interval for `r` via the Fisher z-transform. Needs n > 3.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn fisher_interval(r: f64, n: usize) -> Option<(f64, f64)> {
    if n <= 3 {
        return None;
    }
    let z = fisher_z(r);
    let half = z_95() / ((n - 3) as f64).sqrt();
    Some(((z - half).tanh(), (z + half).tanh()))
}

/// Two-sided p-value for H0: ρ = 0, normal approximation on Fisher z. Needs n > 3.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn correlation_p_value(r: f64, n: usize) -> Option<f64> {
    if n <= 3 {
        return None;
    }
    let stat = fisher_z(r).abs() * ((n - 3) as f64).sqrt();
    Some(erfc(stat / std::f64::consts::SQRT_2).clamp(0.0, 1.0))
}

/// Cohen's d with pooled standard deviation; each group needs two values.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn cohens_d(a: &[f64], b: &[f64]) -> Option<f64> {
    let (sa, sb) = (sample_sd(a)?, sample_sd(b)?);
    let (na, nb) = (a.len() as f64, b.len() as f64);
    let pooled = (((na - 1.0) * sa * sa + (nb - 1.0) * sb * sb) / (na + nb - 2.0)).sqrt();
    if pooled <= 0.0 || !pooled.is_finite() {
        return None;
    }
    Some((mean(a)? - mean(b)?) / pooled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn pearson_perfect_and_inverse() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        assert!(close(pearson(&xs, &[2.0, 4.0, 6.0, 8.0]).unwrap(), 1.0, 1e-12));
        assert!(close(pearson(&xs, &[8.0, 6.0, 4.0, 2.0]).unwrap(), -1.0, 1e-12));
    }

    #[test]
    fn pearson_undefined_without_variance() {
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_none());
        assert!(pearson(&[1.0, 2.0], &[1.0, 2.0]).is_none());
        assert!(pearson(&[1.0, 2.0, 3.0], &[1.0, 2.0]).is_none());
    }

    #[test]
    fn empty_and_single_inputs_have_no_statistics() {
        assert!(mean(&[]).is_none());
        assert!(sample_sd(&[4.0]).is_none());
        assert!(close(sample_sd(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap(), 2.138_089_935, 1e-8));
    }

    #[test]
    fn z_95_matches_normal_quantile() {
        assert!(close(z_95(), 1.959_963_985, 1e-8));
    }

    #[test]
    fn zero_correlation_is_not_significant() {
        assert!(close(correlation_p_value(0.0, 50).unwrap(), 1.0, 1e-6));
        assert!(correlation_p_value(0.5, 103).unwrap() < 0.001);
        assert!(correlation_p_value(0.5, 3).is_none());
    }

    #[test]
    fn fisher_interval_brackets_r() {
        let (lo, hi) = fisher_interval(0.3, 50).unwrap();
        assert!(lo < 0.3 && 0.3 < hi);
        assert!(lo > -1.0 && hi < 1.0);
    }

    #[test]
    fn cohens_d_of_shifted_groups() {
        let a = [2.0, 3.0, 4.0];
        let b = [1.0, 2.0, 3.0];
        assert!(close(cohens_d(&a, &b).unwrap(), 1.0, 1e-12));
        assert!(cohens_d(&[1.0], &b).is_none());
    }
}
