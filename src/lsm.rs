//! Least-squares polynomial baseline.
//!
//! Fits `c0 + c1*i + c2*i^2 (+ c3*i^3)` over the sample positions `i = 0..N`
//! by solving the normal equations. Used as a global alternative to the
//! recursive filters: it can both smooth the sample and extrapolate past it.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::stats;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeastSquares {
    /// Polynomial coefficients, lowest power first
    coefficients: Vec<f64>,
    /// Sample the model was fitted to
    observed: Vec<f64>,
}

impl LeastSquares {
    /// Fit a quadratic, or a cubic when `cubic` is set.
    pub fn fit(values: &[f64], cubic: bool) -> Result<Self> {
        let degree = if cubic { 3 } else { 2 };
        let dim = degree + 1;
        if values.len() < dim {
            return Err(Error::InsufficientData {
                required: dim,
                got: values.len(),
            });
        }

        let mut a = vec![vec![0.0; dim]; dim];
        let mut b = vec![0.0; dim];
        for (i, y) in values.iter().enumerate() {
            let t = i as f64;
            let mut powers = vec![1.0; dim * 2];
            for p in 1..powers.len() {
                powers[p] = powers[p - 1] * t;
            }
            for row in 0..dim {
                b[row] += y * powers[row];
                for col in 0..dim {
                    a[row][col] += powers[row + col];
                }
            }
        }

        let coefficients = solve_linear_system(a, b).ok_or(Error::SingularSystem)?;
        debug!("LSM degree {} coefficients: {:?}", degree, coefficients);

        Ok(LeastSquares {
            coefficients,
            observed: values.to_vec(),
        })
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Polynomial value at position `i`.
    pub fn evaluate(&self, i: usize) -> f64 {
        let t = i as f64;
        self.coefficients.iter().rev().fold(0.0, |acc, c| acc * t + c)
    }

    /// Fitted values over the observed positions.
    pub fn smooth(&self) -> Vec<f64> {
        (0..self.observed.len()).map(|i| self.evaluate(i)).collect()
    }

    /// Fitted values over the observed positions followed by `range`
    /// extrapolated positions.
    pub fn extrapolate(&self, range: usize) -> Vec<f64> {
        (0..self.observed.len() + range).map(|i| self.evaluate(i)).collect()
    }

    /// Coefficient of determination of `predicted` against the fitted sample,
    /// over the positions both cover.
    pub fn r2_score(&self, predicted: &[f64]) -> Result<f64> {
        let n = predicted.len().min(self.observed.len());
        let observed = &self.observed[..n];
        let center = stats::mean(observed);

        let ss_res: f64 = observed
            .iter()
            .zip(predicted)
            .map(|(y, p)| (y - p).powi(2))
            .sum();
        let ss_tot: f64 = observed.iter().map(|y| (y - center).powi(2)).sum();

        if ss_tot == 0.0 {
            return Err(Error::DegenerateScore {
                reason: "sample has no variance",
            });
        }
        Ok(1.0 - ss_res / ss_tot)
    }
}

/// Gauss-Jordan elimination with partial pivoting. None when singular.
fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for pivot in 0..n {
        let (best_row, best_abs) = a
            .iter()
            .enumerate()
            .skip(pivot)
            .map(|(row, coeffs)| (row, coeffs[pivot].abs()))
            .max_by(|x, y| x.1.total_cmp(&y.1))?;
        if !best_abs.is_finite() || best_abs <= f64::EPSILON {
            return None;
        }
        a.swap(pivot, best_row);
        b.swap(pivot, best_row);

        let scale = a[pivot][pivot];
        a[pivot][pivot..].iter_mut().for_each(|v| *v /= scale);
        b[pivot] /= scale;

        let pivot_row = a[pivot].clone();
        let pivot_rhs = b[pivot];
        for (row, (coeffs, rhs)) in a.iter_mut().zip(b.iter_mut()).enumerate() {
            let factor = coeffs[pivot];
            if row == pivot || factor == 0.0 {
                continue;
            }
            for (v, p) in coeffs[pivot..].iter_mut().zip(&pivot_row[pivot..]) {
                *v -= factor * p;
            }
            *rhs -= factor * pivot_rhs;
        }
    }
    Some(b)
}
