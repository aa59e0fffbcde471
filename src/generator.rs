//! Synthetic sample generation: deterministic trends, random noise and their
//! additive composition.
//!
//! Randomness always comes from an `StdRng` owned by the generator. Seeding it
//! explicitly makes a run reproducible without any process-wide state.

use anyhow::Context;
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp, Normal, Uniform};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::{ExperimentConfig, NoiseConfig};
use crate::error::{Error, Result};
use crate::traits::SampleSource;

/// Ordered measurements plus a label used only for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub values: Vec<f64>,
    pub label: String,
}

impl Sample {
    pub fn new(values: Vec<f64>, label: impl Into<String>) -> Self {
        Sample {
            values,
            label: label.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ============================================================================
// TRENDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendKind {
    Linear,
    Quadratic,
    Constant,
}

impl FromStr for TrendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.to_lowercase();
        if lowered.contains("linear") {
            Ok(TrendKind::Linear)
        } else if lowered.contains("quadratic") {
            Ok(TrendKind::Quadratic)
        } else if lowered.contains("constant") {
            Ok(TrendKind::Constant)
        } else {
            Err(Error::Configuration {
                kind: "trend",
                value: s.to_string(),
            })
        }
    }
}

impl fmt::Display for TrendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendKind::Linear => write!(f, "linear"),
            TrendKind::Quadratic => write!(f, "quadratic"),
            TrendKind::Constant => write!(f, "constant"),
        }
    }
}

/// Coefficients for every trend law. Each law reads only its own fields:
/// linear `slope`, `intercept`; quadratic `a`, `b`, `c`; constant `c`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendParams {
    pub slope: f64,
    pub intercept: f64,
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

/// `size` evenly spaced points over `[min, max]`, both ends included.
pub fn linspace(min: f64, max: f64, size: usize) -> Vec<f64> {
    match size {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let step = (max - min) / (size - 1) as f64;
            (0..size).map(|i| min + step * i as f64).collect()
        }
    }
}

impl TrendKind {
    /// Evaluate the trend law over `size` points spanning `[min, max]`.
    pub fn create(&self, min: f64, max: f64, size: usize, params: &TrendParams) -> Sample {
        let xs = linspace(min, max, size);
        let values = match self {
            TrendKind::Linear => xs.iter().map(|x| params.slope * x + params.intercept).collect(),
            TrendKind::Quadratic => xs
                .iter()
                .map(|x| params.a * x * x + params.b * x + params.c)
                .collect(),
            TrendKind::Constant => vec![params.c; size],
        };
        Sample::new(values, self.to_string())
    }
}

// ============================================================================
// NOISE
// ============================================================================

/// Random error law with its parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoiseKind {
    Normal { mu: f64, sigma: f64 },
    Uniform { min: f64, max: f64 },
    Exponential { lambda: f64 },
}

impl NoiseKind {
    pub fn from_selector(selector: &str, params: &NoiseConfig) -> Result<Self> {
        let lowered = selector.to_lowercase();
        let kind = if lowered.contains("normal") {
            NoiseKind::Normal {
                mu: params.mu,
                sigma: params.sigma,
            }
        } else if lowered.contains("uniform") {
            NoiseKind::Uniform {
                min: params.min,
                max: params.max,
            }
        } else if lowered.contains("exponential") {
            NoiseKind::Exponential {
                lambda: params.lambda,
            }
        } else {
            return Err(Error::Configuration {
                kind: "noise distribution",
                value: selector.to_string(),
            });
        };
        kind.check()?;
        Ok(kind)
    }

    fn check(&self) -> Result<()> {
        match *self {
            NoiseKind::Normal { sigma, .. } if !(sigma > 0.0) => Err(Error::InvalidParameter {
                name: "sigma",
                reason: format!("must be positive, got {}", sigma),
            }),
            NoiseKind::Uniform { min, max } if !(max > min) => Err(Error::InvalidParameter {
                name: "max",
                reason: format!("must exceed min ({} <= {})", max, min),
            }),
            NoiseKind::Exponential { lambda } if !(lambda > 0.0) => Err(Error::InvalidParameter {
                name: "lambda",
                reason: format!("must be positive, got {}", lambda),
            }),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            NoiseKind::Normal { .. } => "normal",
            NoiseKind::Uniform { .. } => "uniform",
            NoiseKind::Exponential { .. } => "exponential",
        }
    }
}

/// Draws noise samples from a private, optionally seeded generator
#[derive(Debug)]
pub struct NoiseGenerator {
    rng: StdRng,
}

impl NoiseGenerator {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        NoiseGenerator { rng }
    }

    pub fn sample(&mut self, kind: &NoiseKind, size: usize) -> Result<Sample> {
        kind.check()?;
        let invalid = |reason: String| Error::InvalidParameter {
            name: "noise",
            reason,
        };

        let values: Vec<f64> = match *kind {
            NoiseKind::Normal { mu, sigma } => {
                let dist = Normal::new(mu, sigma).map_err(|e| invalid(e.to_string()))?;
                (0..size).map(|_| dist.sample(&mut self.rng)).collect()
            }
            NoiseKind::Uniform { min, max } => {
                let dist = Uniform::new(min, max).map_err(|e| invalid(e.to_string()))?;
                (0..size).map(|_| dist.sample(&mut self.rng)).collect()
            }
            NoiseKind::Exponential { lambda } => {
                let dist = Exp::new(lambda).map_err(|e| invalid(e.to_string()))?;
                (0..size).map(|_| dist.sample(&mut self.rng)).collect()
            }
        };

        Ok(Sample::new(values, kind.name()))
    }
}

/// Element-wise sum of a trend and an error sample.
pub fn additive(trend: &Sample, noise: &Sample) -> Result<Sample> {
    if trend.len() != noise.len() {
        return Err(Error::InvalidParameter {
            name: "noise",
            reason: format!("length {} does not match trend length {}", noise.len(), trend.len()),
        });
    }
    let values = trend
        .values
        .iter()
        .zip(&noise.values)
        .map(|(t, e)| t + e)
        .collect();
    Ok(Sample::new(values, format!("{} + {}", trend.label, noise.label)))
}

// ============================================================================
// SYNTHETIC SOURCE
// ============================================================================

/// Trend + noise sample producer built from an [`ExperimentConfig`]
#[derive(Debug)]
pub struct SyntheticSource {
    trend: TrendKind,
    params: TrendParams,
    range: (f64, f64),
    size: usize,
    noise: NoiseKind,
    generator: NoiseGenerator,
}

impl SyntheticSource {
    pub fn from_config(config: &ExperimentConfig) -> Result<Self> {
        Ok(SyntheticSource {
            trend: config.trend.kind.parse()?,
            params: config.trend.params,
            range: (config.trend.min, config.trend.max),
            size: config.trend.size,
            noise: config.noise.distribution()?,
            generator: NoiseGenerator::new(config.seed),
        })
    }
}

impl SampleSource for SyntheticSource {
    fn produce(&mut self) -> anyhow::Result<Sample> {
        let trend = self.trend.create(self.range.0, self.range.1, self.size, &self.params);
        let noise = self
            .generator
            .sample(&self.noise, self.size)
            .context("Noise generation failed")?;
        let sample = additive(&trend, &noise)?;
        debug!("Generated {} samples ({})", sample.len(), sample.label);
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_linspace_includes_endpoints() {
        let xs = linspace(0.0, 1.0, 5);
        assert_eq!(xs.len(), 5);
        assert_abs_diff_eq!(xs[0], 0.0);
        assert_abs_diff_eq!(xs[2], 0.5);
        assert_abs_diff_eq!(xs[4], 1.0);
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_trend_laws() {
        let params = TrendParams {
            slope: 2.0,
            intercept: 1.0,
            a: 1.0,
            b: 0.0,
            c: 3.0,
        };
        let linear = TrendKind::Linear.create(0.0, 4.0, 5, &params);
        assert_eq!(linear.values, vec![1.0, 3.0, 5.0, 7.0, 9.0]);
        assert_eq!(linear.label, "linear");

        let quadratic = TrendKind::Quadratic.create(0.0, 2.0, 3, &params);
        assert_eq!(quadratic.values, vec![3.0, 4.0, 7.0]);

        let constant = TrendKind::Constant.create(0.0, 100.0, 4, &params);
        assert_eq!(constant.values, vec![3.0; 4]);
    }

    #[test]
    fn test_trend_selector() {
        assert_eq!("Linear".parse::<TrendKind>().unwrap(), TrendKind::Linear);
        assert!(matches!(
            "cubic".parse::<TrendKind>(),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn test_noise_parameter_checks() {
        let mut params = NoiseConfig::default();
        params.sigma = 0.0;
        assert!(matches!(
            NoiseKind::from_selector("normal", &params),
            Err(Error::InvalidParameter { name: "sigma", .. })
        ));

        params.min = 2.0;
        params.max = 1.0;
        assert!(NoiseKind::from_selector("uniform", &params).is_err());

        params.lambda = -1.0;
        assert!(NoiseKind::from_selector("exponential", &params).is_err());
        assert!(NoiseKind::from_selector("poisson", &params).is_err());
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let kind = NoiseKind::Normal { mu: 0.0, sigma: 1.0 };
        let a = NoiseGenerator::new(Some(42)).sample(&kind, 50).unwrap();
        let b = NoiseGenerator::new(Some(42)).sample(&kind, 50).unwrap();
        let c = NoiseGenerator::new(Some(43)).sample(&kind, 50).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.values, c.values);
    }

    #[test]
    fn test_noise_ranges() {
        let mut generator = NoiseGenerator::new(Some(1));
        let uniform = generator
            .sample(&NoiseKind::Uniform { min: -1.0, max: 1.0 }, 500)
            .unwrap();
        assert!(uniform.values.iter().all(|v| (-1.0..1.0).contains(v)));

        let exponential = generator
            .sample(&NoiseKind::Exponential { lambda: 2.0 }, 500)
            .unwrap();
        assert!(exponential.values.iter().all(|&v| v >= 0.0));
        assert_eq!(exponential.label, "exponential");
    }

    #[test]
    fn test_additive_composition() {
        let trend = Sample::new(vec![1.0, 2.0, 3.0], "linear");
        let noise = Sample::new(vec![0.5, -0.5, 0.0], "normal");
        let model = additive(&trend, &noise).unwrap();
        assert_eq!(model.values, vec![1.5, 1.5, 3.0]);
        assert_eq!(model.label, "linear + normal");

        let short = Sample::new(vec![0.0], "normal");
        assert!(additive(&trend, &short).is_err());
    }

    #[test]
    fn test_synthetic_source_from_config() {
        let mut config = ExperimentConfig::default();
        config.seed = Some(9);
        config.trend.size = 64;

        let mut source = SyntheticSource::from_config(&config).unwrap();
        let first = source.produce().unwrap();
        assert_eq!(first.len(), 64);
        assert_eq!(first.label, "linear + normal");

        let mut again = SyntheticSource::from_config(&config).unwrap();
        assert_eq!(again.produce().unwrap(), first);
    }
}
