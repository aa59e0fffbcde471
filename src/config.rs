use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::detector::DetectionMethod;
use crate::generator::{NoiseKind, TrendKind, TrendParams};
use crate::recurrent::FilterOrder;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub trend: TrendConfig,
    pub noise: NoiseConfig,
    pub anomalies: AnomalyConfig,
    pub detector: DetectorConfig,
    pub filter: FilterConfig,
    pub lsm: LsmConfig,
    /// Seed for sample generation and anomaly injection (None = OS entropy)
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub kind: String, // "linear" | "quadratic" | "constant"
    pub min: f64,
    pub max: f64,
    pub size: usize,
    #[serde(flatten)]
    pub params: TrendParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub kind: String, // "normal" | "uniform" | "exponential"
    pub mu: f64,
    pub sigma: f64,
    pub min: f64,
    pub max: f64,
    pub lambda: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    pub count: usize,
    pub scale: f64, // multiplier applied to each corrupted sample
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub method: String, // "sliding_window" | "custom"
    pub window_size: usize,
    pub threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub order: String, // "alpha-beta" | "alpha-beta-gamma"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LsmConfig {
    pub enabled: bool,
    pub cubic: bool,
    pub extrapolate: usize, // extra positions past the sample (0 = smoothing only)
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        ExperimentConfig {
            trend: TrendConfig::default(),
            noise: NoiseConfig::default(),
            anomalies: AnomalyConfig::default(),
            detector: DetectorConfig::default(),
            filter: FilterConfig::default(),
            lsm: LsmConfig::default(),
            seed: None,
        }
    }
}

impl Default for TrendConfig {
    fn default() -> Self {
        TrendConfig {
            kind: "linear".to_string(),
            min: 0.0,
            max: 100.0,
            size: 200,
            params: TrendParams {
                slope: 2.0,
                intercept: 5.0,
                ..TrendParams::default()
            },
        }
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        NoiseConfig {
            kind: "normal".to_string(),
            mu: 0.0,
            sigma: 5.0,
            min: -5.0,
            max: 5.0,
            lambda: 0.2,
        }
    }
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        AnomalyConfig {
            count: 10,
            scale: 3.0,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            method: "sliding_window".to_string(),
            window_size: 5,
            threshold: 1.8,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            order: "alpha-beta".to_string(),
        }
    }
}

impl Default for LsmConfig {
    fn default() -> Self {
        LsmConfig {
            enabled: true,
            cubic: false,
            extrapolate: 20,
        }
    }
}

impl ExperimentConfig {
    /// Load a JSON configuration. Missing sections fall back to defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Check every selector before anything is generated.
    pub fn validate(&self) -> crate::error::Result<()> {
        self.trend.kind.parse::<TrendKind>()?;
        self.noise.distribution()?;
        self.detector.method.parse::<DetectionMethod>()?;
        self.filter.order.parse::<FilterOrder>()?;
        Ok(())
    }
}

impl NoiseConfig {
    /// Resolve the selector into a parameterised distribution.
    pub fn distribution(&self) -> crate::error::Result<NoiseKind> {
        NoiseKind::from_selector(&self.kind, self)
    }
}
