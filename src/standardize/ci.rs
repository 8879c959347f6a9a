//! Confidence-interval constructions for crude and standardized rates
//!
//! Both intervals are gamma-type intervals expressed through chi-squared
//! quantiles. All rate arguments are per-person probabilities; scaling to
//! per-100k happens exactly once, on the returned bounds.

use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::error::{AnalysisError, Result};
use crate::rates::PER_100K;

/// Default two-sided significance level (95% intervals)
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Inverse CDF of the chi-squared distribution with `df` degrees of freedom
fn chi_squared_quantile(p: f64, df: f64) -> Result<f64> {
    let dist = ChiSquared::new(df).map_err(|e| {
        AnalysisError::DataIntegrity(format!(
            "chi-squared quantile with {df} degrees of freedom: {e}"
        ))
    })?;
    Ok(dist.inverse_cdf(p))
}

/// Exact Poisson (gamma) interval for a crude rate
///
/// `lower = 0.5 * chi2_inv(alpha/2; 2D)` (0 when `D = 0`),
/// `upper = 0.5 * chi2_inv(1 - alpha/2; 2(D+1))`, both divided by the
/// population total. Bounds are returned per 100k.
pub fn poisson_interval(deaths: u64, population: f64, alpha: f64) -> Result<(f64, f64)> {
    let d = deaths as f64;
    let lower_count = if deaths > 0 {
        0.5 * chi_squared_quantile(alpha / 2.0, 2.0 * d)?
    } else {
        0.0
    };
    let upper_count = 0.5 * chi_squared_quantile(1.0 - alpha / 2.0, 2.0 * (d + 1.0))?;

    Ok((
        lower_count / population * PER_100K,
        upper_count / population * PER_100K,
    ))
}

/// Fay-Feuer gamma interval for a directly standardized rate
///
/// `rate` is the per-person standardized rate and `k` the effective shape
/// parameter `(sum w_i r_i)^2 / sum(w_i^2 d_i / n_i^2)`. When `k <= 0` no
/// age class contributes variance (only possible with zero deaths overall)
/// and both bounds collapse to exactly 0. Bounds are returned per 100k,
/// unclamped.
pub fn fay_feuer_interval(rate: f64, k: f64, alpha: f64) -> Result<(f64, f64)> {
    if k <= 0.0 {
        return Ok((0.0, 0.0));
    }

    let lower = rate * 2.0 * k / chi_squared_quantile(1.0 - alpha / 2.0, 2.0 * k)?;
    let upper = rate * 2.0 * (k + 1.0) / chi_squared_quantile(alpha / 2.0, 2.0 * (k + 1.0))?;

    Ok((lower * PER_100K, upper * PER_100K))
}
