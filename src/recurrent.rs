//! Recursive tracking filters (alpha-beta and alpha-beta-gamma).
//!
//! One forward pass over the measurements, no lookahead. The running estimate
//! lives in a [`FilterState`] value that is created per pass, so a configured
//! [`RecurrentFilter`] can be shared between independent sequences.

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Fixed sampling interval
const T0: f64 = 1.0;

/// Starting acceleration gain of the three-parameter filter
const GAMMA_SEED: f64 = 0.001;

/// Samples needed to seed the velocity estimate
pub const MIN_SAMPLES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterOrder {
    AlphaBeta,
    AlphaBetaGamma,
}

impl FromStr for FilterOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "alpha-beta" => Ok(FilterOrder::AlphaBeta),
            "alpha-beta-gamma" => Ok(FilterOrder::AlphaBetaGamma),
            _ => Err(Error::Configuration {
                kind: "filter order",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for FilterOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterOrder::AlphaBeta => write!(f, "alpha-beta"),
            FilterOrder::AlphaBetaGamma => write!(f, "alpha-beta-gamma"),
        }
    }
}

/// Position gain for step `n >= 1`: 2(2n - 1) / (n(n + 1))
pub fn alpha_gain(n: usize) -> f64 {
    let n = n as f64;
    2.0 * (2.0 * n - 1.0) / (n * (n + 1.0))
}

/// Velocity gain for step `n >= 1`: 6 / (n(n + 1))
pub fn beta_gain(n: usize) -> f64 {
    let n = n as f64;
    6.0 / (n * (n + 1.0))
}

/// Running estimate of one filtering pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterState {
    /// Prediction for the next measurement
    pub extrapolated: f64,
    pub velocity: f64,
    pub acceleration: f64,
    /// Schedule value of the position gain for the next step
    pub alpha: f64,
    /// Velocity gain. Compounds its decay in the alpha-beta-gamma filter.
    pub beta: f64,
    /// Acceleration gain. Only used by the alpha-beta-gamma filter.
    pub gamma: f64,
}

impl FilterState {
    /// Seed from the first two measurements using the first finite difference.
    pub fn seed(first: f64, second: f64) -> Self {
        let velocity = (second - first) / T0;
        FilterState {
            extrapolated: first + velocity,
            velocity,
            acceleration: 0.0,
            alpha: alpha_gain(1),
            beta: beta_gain(1),
            gamma: GAMMA_SEED,
        }
    }

    /// Second-order update for measurement index `n`. Returns the estimate.
    pub fn step_alpha_beta(&mut self, measurement: f64, n: usize) -> f64 {
        let error = measurement - self.extrapolated;

        let estimate = self.extrapolated + self.alpha * error;
        self.velocity += (self.beta / T0) * error;
        self.extrapolated = estimate + self.velocity;

        self.alpha = alpha_gain(n);
        self.beta = beta_gain(n);
        estimate
    }

    /// Third-order update for measurement index `n`, with all gains scaled
    /// by `1 / (1 + |error|)` before they are applied.
    pub fn step_alpha_beta_gamma(&mut self, measurement: f64, n: usize) -> f64 {
        let error = measurement - self.extrapolated;
        let penalty = 1.0 / (1.0 + error.abs());

        let alpha = self.alpha * penalty;
        // Beta and gamma keep their decayed values across steps.
        self.beta *= penalty;
        self.gamma *= penalty;

        let estimate = self.extrapolated + alpha * error;
        self.velocity += (self.beta / T0) * error;
        self.acceleration += (self.gamma / T0) * error;
        self.extrapolated = estimate + self.velocity + 0.5 * self.acceleration * T0 * T0;

        self.alpha = alpha_gain(n);
        estimate
    }
}

/// Recursive tracking filter of a fixed order.
#[derive(Debug, Clone)]
pub struct RecurrentFilter {
    order: FilterOrder,
    processed: Option<Vec<f64>>,
}

impl RecurrentFilter {
    pub fn new(order: FilterOrder) -> Self {
        RecurrentFilter {
            order,
            processed: None,
        }
    }

    pub fn from_selector(selector: &str) -> Result<Self> {
        Ok(Self::new(selector.parse()?))
    }

    pub fn order(&self) -> FilterOrder {
        self.order
    }

    /// Filter `sequence` and keep the result for [`Self::processed`].
    pub fn process(&mut self, sequence: &[f64]) -> Result<&[f64]> {
        let output = self.run(sequence)?;
        Ok(self.processed.insert(output).as_slice())
    }

    /// Filter `sequence` without touching the instance.
    ///
    /// The output has the same length as the input. Fails with
    /// [`Error::InsufficientData`] for fewer than two samples.
    pub fn run(&self, sequence: &[f64]) -> Result<Vec<f64>> {
        if sequence.len() < MIN_SAMPLES {
            return Err(Error::InsufficientData {
                required: MIN_SAMPLES,
                got: sequence.len(),
            });
        }

        let mut state = FilterState::seed(sequence[0], sequence[1]);
        let mut output = Vec::with_capacity(sequence.len());
        // Seed step: gain applied to the first measurement itself.
        output.push(sequence[0] + state.alpha * sequence[0]);

        for (n, &measurement) in sequence.iter().enumerate().skip(1) {
            let estimate = match self.order {
                FilterOrder::AlphaBeta => state.step_alpha_beta(measurement, n),
                FilterOrder::AlphaBetaGamma => state.step_alpha_beta_gamma(measurement, n),
            };
            output.push(estimate);
        }

        debug!(
            "Filter {}: {} samples, v={:.4}, a={:.6}, beta={:.3e}, gamma={:.3e}",
            self.order,
            output.len(),
            state.velocity,
            state.acceleration,
            state.beta,
            state.gamma
        );
        Ok(output)
    }

    /// Output of the last [`Self::process`] call
    pub fn processed(&self) -> Option<&[f64]> {
        self.processed.as_deref()
    }
}
