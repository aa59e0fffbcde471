use serde::{Deserialize, Serialize};

use crate::detector::DetectionScore;
use crate::stats::SampleStats;

/// Outcome of one experiment run
///
/// Everything needed to compare the repaired and filtered sequences against
/// the uncorrupted ground truth:
/// - descriptive statistics at each stage
/// - injected vs. detected anomaly positions
/// - filter / least-squares quality figures
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ExperimentReport {
    // ========================================================================
    // Configuration echo
    // ========================================================================
    /// Descriptive label of the generated sample
    pub label: String,

    pub detection_method: String,

    pub filter_order: String,

    // ========================================================================
    // Stage statistics
    // ========================================================================
    /// Sample before anomaly injection (ground truth)
    pub truth_stats: SampleStats,

    pub corrupted_stats: SampleStats,

    pub cleaned_stats: SampleStats,

    // ========================================================================
    // Detection
    // ========================================================================
    /// Ground-truth anomaly positions
    pub injected: Vec<usize>,

    /// Positions flagged by the detector
    pub found: Vec<usize>,

    /// None when the score is degenerate (nothing injected or nothing found)
    pub score: Option<DetectionScore>,

    /// Mean absolute deviation from ground truth before / after cleaning
    pub corrupted_mae: f64,
    pub cleaned_mae: f64,

    // ========================================================================
    // Filtering
    // ========================================================================
    /// Recursive filter output over the cleaned sequence
    pub filtered: Vec<f64>,

    /// Mean squared error of the filter output against ground truth
    pub filter_mse: f64,

    /// Least-squares fit (plus extrapolation), when enabled
    pub lsm_fit: Option<Vec<f64>>,

    pub lsm_r2: Option<f64>,
}

impl ExperimentReport {
    /// Human-readable summary, one line per figure.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Sample: {} ({} points)", self.label, self.truth_stats.len),
            format!(
                "Truth: mean={:.4}, var={:.4}, std={:.4}",
                self.truth_stats.mean, self.truth_stats.variance, self.truth_stats.std_dev
            ),
            format!(
                "Corrupted: mean={:.4}, std={:.4}, MAE={:.4}",
                self.corrupted_stats.mean, self.corrupted_stats.std_dev, self.corrupted_mae
            ),
            format!(
                "Cleaned ({}): mean={:.4}, std={:.4}, MAE={:.4}",
                self.detection_method,
                self.cleaned_stats.mean,
                self.cleaned_stats.std_dev,
                self.cleaned_mae
            ),
            format!("Anomalies: injected={}, found={}", self.injected.len(), self.found.len()),
        ];

        match &self.score {
            Some(score) => lines.push(format!(
                "Detection: accuracy={:.2}%, precision={:.2}%",
                score.accuracy, score.precision
            )),
            None => lines.push("Detection: not scored".to_string()),
        }

        lines.push(format!("Filter ({}): MSE={:.4}", self.filter_order, self.filter_mse));
        if let Some(r2) = self.lsm_r2 {
            lines.push(format!("LSM: R2={:.4}", r2));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> ExperimentReport {
        let stats = SampleStats::of(&[1.0, 2.0, 3.0]);
        ExperimentReport {
            label: "linear + normal".to_string(),
            detection_method: "sliding_window".to_string(),
            filter_order: "alpha-beta".to_string(),
            truth_stats: stats,
            corrupted_stats: stats,
            cleaned_stats: stats,
            injected: vec![1],
            found: vec![1, 2],
            score: Some(DetectionScore {
                accuracy: 100.0,
                precision: 50.0,
            }),
            corrupted_mae: 0.5,
            cleaned_mae: 0.1,
            filtered: vec![2.0, 2.0, 3.0],
            filter_mse: 0.33,
            lsm_fit: None,
            lsm_r2: Some(0.98),
        }
    }

    #[test]
    fn test_summary_mentions_score() {
        let lines = sample_report().summary_lines();
        assert!(lines.iter().any(|l| l.contains("accuracy=100.00%")));
        assert!(lines.iter().any(|l| l.contains("R2=0.9800")));
    }

    #[test]
    fn test_summary_without_score() {
        let mut report = sample_report();
        report.score = None;
        report.lsm_r2 = None;
        let lines = report.summary_lines();
        assert!(lines.contains(&"Detection: not scored".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("LSM")));
    }

    #[test]
    fn test_report_serde_roundtrip() {
        let report = sample_report();

        let json = serde_json::to_string(&report).expect("serialize failed");
        let restored: ExperimentReport = serde_json::from_str(&json).expect("deserialize failed");

        assert_eq!(restored.found, vec![1, 2]);
        assert_eq!(restored.filter_order, "alpha-beta");
        assert_eq!(restored.score, report.score);
        assert!(restored.lsm_fit.is_none());
    }
}
