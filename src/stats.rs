//! Descriptive statistics shared by the detector, the least-squares baseline
//! and experiment reports.
//!
//! All dispersion figures are population statistics (divide by N), which is
//! what the window tests in [`crate::detector`] are calibrated against.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::{Error, Result};

/// Arithmetic mean. Empty input yields 0.0.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance. Empty input yields 0.0.
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Standard error of the mean, `std / sqrt(N)`.
pub fn standard_error(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    std_dev(values) / (values.len() as f64).sqrt()
}

/// Quantile function of the standard normal distribution.
///
/// `p` must lie strictly inside (0, 1).
pub fn normal_quantile(p: f64) -> Result<f64> {
    if !(p > 0.0 && p < 1.0) {
        return Err(Error::InvalidParameter {
            name: "probability",
            reason: format!("{} is outside (0, 1)", p),
        });
    }
    let standard = Normal::new(0.0, 1.0).map_err(|e| Error::InvalidParameter {
        name: "normal",
        reason: e.to_string(),
    })?;
    Ok(standard.inverse_cdf(p))
}

/// Critical value for a two-sided confidence level, e.g. 0.95 -> 1.96.
pub fn two_sided_z(confidence: f64) -> Result<f64> {
    normal_quantile(1.0 - (1.0 - confidence) / 2.0)
}

/// Mean squared error over the common prefix of two sequences.
pub fn mse(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>() / n as f64
}

/// Mean absolute error over the common prefix of two sequences.
pub fn mae(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum::<f64>() / n as f64
}

/// Summary of a sequence as shown in experiment reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleStats {
    pub len: usize,
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
}

impl SampleStats {
    pub fn of(values: &[f64]) -> Self {
        let variance = variance(values);
        SampleStats {
            len: values.len(),
            mean: mean(values),
            variance,
            std_dev: variance.sqrt(),
        }
    }
}
