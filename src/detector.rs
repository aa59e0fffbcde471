//! Windowed Anomaly Detection
//!
//! Finds measurements that are inconsistent with their neighbourhood and
//! repairs them in place.
//!
//! ## Strategies
//! Two mutually exclusive strategies are available, fixed at construction:
//!
//! - **Sliding window**: every window of `window_size` samples yields a moving
//!   average and a local standard deviation. The sample that closes a window is
//!   flagged when `|value - average| > threshold * std` and is replaced by that
//!   window's average. All windows are evaluated against the uncorrected input.
//!
//! - **Peak** ("custom"): local maxima are visited largest first. The mean of a
//!   symmetric neighbourhood (peak excluded) is tested against a confidence
//!   interval of the global mean; when it falls inside, the whole neighbourhood
//!   is pulled halfway towards its mean. Because corrections happen in place,
//!   handling large peaks first keeps them from inflating the neighbourhood
//!   statistics of smaller peaks nearby.
//!
//! ## Scoring
//! After a pass, [`AnomalyDetector::detection_score`] compares the flagged
//! indices with externally supplied ground truth.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::stats;

/// Detection strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Moving average / local deviation test
    SlidingWindow,
    /// Peak-centric confidence interval test
    Peak,
}

impl FromStr for DetectionMethod {
    type Err = Error;

    /// Accepts any selector containing `sliding_wind` or `custom` / `peak`,
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.to_lowercase();
        if lowered.contains("sliding_wind") {
            Ok(DetectionMethod::SlidingWindow)
        } else if lowered.contains("custom") || lowered.contains("peak") {
            Ok(DetectionMethod::Peak)
        } else {
            Err(Error::Configuration {
                kind: "detection method",
                value: s.to_string(),
            })
        }
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionMethod::SlidingWindow => write!(f, "sliding_window"),
            DetectionMethod::Peak => write!(f, "custom"),
        }
    }
}

/// Detection quality against ground truth, both in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionScore {
    /// Share of true anomalies that were found
    pub accuracy: f64,
    /// Share of found anomalies that are true anomalies
    pub precision: f64,
}

/// Anomaly detector holding the outcome of its most recent pass
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    method: DetectionMethod,

    /// Copy of the sequence after the last cleaning pass
    cleaned: Option<Vec<f64>>,

    /// Indices flagged by the last pass, in evaluation order
    found: Vec<usize>,
}

impl AnomalyDetector {
    pub fn new(method: DetectionMethod) -> Self {
        Self {
            method,
            cleaned: None,
            found: Vec::new(),
        }
    }

    /// Build a detector from a textual selector such as `"sliding_window"`.
    pub fn from_selector(selector: &str) -> Result<Self> {
        Ok(Self::new(selector.parse()?))
    }

    pub fn method(&self) -> DetectionMethod {
        self.method
    }

    /// Detect anomalies in `sequence` and repair them in place.
    ///
    /// # Arguments
    /// * `window_size` - sliding window width, or peak neighbourhood half-width
    /// * `threshold` - deviation multiplier (sliding window) or two-sided
    ///   confidence level in (0, 1) (peak)
    ///
    /// # Returns
    /// The flagged indices, also retained for [`Self::detection_score`].
    /// A failed pass leaves no result behind.
    pub fn detect_and_clean(
        &mut self,
        sequence: &mut [f64],
        window_size: usize,
        threshold: f64,
    ) -> Result<&[usize]> {
        self.found.clear();
        self.cleaned = None;

        if window_size == 0 {
            return Err(Error::InvalidWindow {
                window: window_size,
                len: sequence.len(),
            });
        }
        if !(threshold > 0.0) || !threshold.is_finite() {
            return Err(Error::InvalidParameter {
                name: "threshold",
                reason: format!("must be a positive number, got {}", threshold),
            });
        }

        let found = match self.method {
            DetectionMethod::SlidingWindow => sliding_window(sequence, window_size, threshold)?,
            DetectionMethod::Peak => peak_correction(sequence, window_size, threshold)?,
        };

        info!(
            "[Detect] {}: {} anomalies in {} samples (window={}, threshold={})",
            self.method,
            found.len(),
            sequence.len(),
            window_size,
            threshold
        );

        self.found = found;
        self.cleaned = Some(sequence.to_vec());
        Ok(&self.found)
    }

    /// Score the last pass against ground-truth anomaly indices.
    ///
    /// Fails with [`Error::DegenerateScore`] when there is no ground truth or
    /// when the last pass found nothing.
    pub fn detection_score(&self, truth: &[usize]) -> Result<DetectionScore> {
        if truth.is_empty() {
            return Err(Error::DegenerateScore {
                reason: "no ground-truth anomalies supplied",
            });
        }
        if self.found.is_empty() {
            return Err(Error::DegenerateScore {
                reason: "detector found no anomalies",
            });
        }

        let truth_set: HashSet<usize> = truth.iter().copied().collect();
        let hits = self.found.iter().filter(|i| truth_set.contains(i)).count() as f64;

        let score = DetectionScore {
            accuracy: hits / truth_set.len() as f64 * 100.0,
            precision: hits / self.found.len() as f64 * 100.0,
        };
        debug!(
            "[Detect] Score: accuracy={:.2}%, precision={:.2}%",
            score.accuracy, score.precision
        );
        Ok(score)
    }

    /// Sequence as it was left by the last pass
    pub fn cleaned(&self) -> Option<&[f64]> {
        self.cleaned.as_deref()
    }

    /// Indices flagged by the last pass
    pub fn anomaly_indices(&self) -> &[usize] {
        &self.found
    }
}

// ============================================================================
// SLIDING WINDOW
// ============================================================================

fn sliding_window(sequence: &mut [f64], window: usize, threshold: f64) -> Result<Vec<usize>> {
    if window > sequence.len() {
        return Err(Error::InvalidWindow {
            window,
            len: sequence.len(),
        });
    }

    // Window k covers [k, k + window) and is aligned with its last sample.
    let offset = window - 1;
    let window_stats: Vec<(f64, f64)> = sequence
        .windows(window)
        .map(|w| (stats::mean(w), stats::std_dev(w)))
        .collect();

    let found: Vec<usize> = window_stats
        .iter()
        .enumerate()
        .filter(|(k, (avg, std))| (sequence[k + offset] - avg).abs() > threshold * std)
        .map(|(k, _)| k + offset)
        .collect();

    for &idx in &found {
        let (avg, std) = window_stats[idx - offset];
        debug!(
            "[Detect] Sliding: idx={} value={:.3} -> {:.3} (std={:.3})",
            idx, sequence[idx], avg, std
        );
        sequence[idx] = avg;
    }

    Ok(found)
}

// ============================================================================
// PEAK CORRECTION
// ============================================================================

/// Indices strictly greater than both immediate neighbours.
fn find_peaks(sequence: &[f64]) -> Vec<usize> {
    if sequence.len() < 3 {
        return Vec::new();
    }
    (1..sequence.len() - 1)
        .filter(|&i| sequence[i] > sequence[i - 1] && sequence[i] > sequence[i + 1])
        .collect()
}

/// Visit peaks from the largest down (equal values from the last position
/// back) and blend each neighbourhood halfway toward its mean when that mean
/// lies inside the global confidence interval.
fn peak_correction(sequence: &mut [f64], half_width: usize, confidence: f64) -> Result<Vec<usize>> {
    let z = stats::two_sided_z(confidence)?;

    let mut peaks = find_peaks(sequence);
    peaks.sort_by(|&a, &b| sequence[b].total_cmp(&sequence[a]).then(b.cmp(&a)));

    // Interval is fixed from the uncorrected sequence.
    let center = stats::mean(sequence);
    let margin = z * stats::standard_error(sequence);
    let (lower, upper) = (center - margin, center + margin);
    debug!(
        "[Detect] Peak: {} peaks, interval=[{:.3}, {:.3}]",
        peaks.len(),
        lower,
        upper
    );

    let mut found = Vec::new();
    for peak in peaks {
        let start = peak.saturating_sub(half_width);
        let end = peak
            .saturating_add(half_width)
            .saturating_add(1)
            .min(sequence.len());

        let neighbours: Vec<f64> = sequence[start..peak]
            .iter()
            .chain(&sequence[peak + 1..end])
            .copied()
            .collect();
        if neighbours.is_empty() {
            continue;
        }
        let window_mean = stats::mean(&neighbours);

        if (lower..=upper).contains(&window_mean) {
            debug!(
                "[Detect] Peak: idx={} value={:.3} window_mean={:.3} -> corrected",
                peak, sequence[peak], window_mean
            );
            for value in &mut sequence[start..end] {
                *value = (*value + window_mean) / 2.0;
            }
            found.push(peak);
        }
    }

    Ok(found)
}

// ============================================================================
// TESTS
// ============================================================================
