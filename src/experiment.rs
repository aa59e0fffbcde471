//! Experiment runner - one pass from generated sample to report
//!
//! Stages:
//! 1. **Generate**: pull a sample from the [`SampleSource`]; it is the ground truth
//! 2. **Corrupt**: the [`AnomalySource`] scales a copy and reports the positions
//! 3. **Clean**: the configured [`AnomalyDetector`] repairs the copy in place
//! 4. **Filter**: the [`RecurrentFilter`] runs over the cleaned sequence
//! 5. **Fit** (optional): least-squares polynomial over the cleaned sequence
//!
//! A degenerate detection score is logged and reported as missing; every
//! other failure aborts the run.

use anyhow::{Context, Result};
use log::{info, warn};

use crate::config::ExperimentConfig;
use crate::detector::AnomalyDetector;
use crate::lsm::LeastSquares;
use crate::recurrent::RecurrentFilter;
use crate::report::ExperimentReport;
use crate::stats::{self, SampleStats};
use crate::traits::{AnomalySource, SampleSource};

pub struct Experiment<S, A>
where
    S: SampleSource,
    A: AnomalySource,
{
    source: S,
    injector: A,
    config: ExperimentConfig,

    detector: AnomalyDetector,
    filter: RecurrentFilter,
}

impl<S, A> Experiment<S, A>
where
    S: SampleSource,
    A: AnomalySource,
{
    /// Resolve the detector and filter selectors. Unknown selectors fail here,
    /// before any sample is produced.
    pub fn new(source: S, injector: A, config: ExperimentConfig) -> Result<Self> {
        let detector = AnomalyDetector::from_selector(&config.detector.method)
            .context("Invalid detector configuration")?;
        let filter = RecurrentFilter::from_selector(&config.filter.order)
            .context("Invalid filter configuration")?;

        info!(
            "Experiment: detector={} (window={}, threshold={}), filter={}",
            detector.method(),
            config.detector.window_size,
            config.detector.threshold,
            filter.order()
        );

        Ok(Experiment {
            source,
            injector,
            config,
            detector,
            filter,
        })
    }

    pub fn detector(&self) -> &AnomalyDetector {
        &self.detector
    }

    pub fn filter(&self) -> &RecurrentFilter {
        &self.filter
    }

    pub fn run(&mut self) -> Result<ExperimentReport> {
        let sample = self.source.produce().context("Sample generation failed")?;
        let truth = sample.values;

        let mut corrupted = truth.clone();
        let injected = self
            .injector
            .corrupt(&mut corrupted)
            .context("Anomaly injection failed")?;

        let mut cleaned = corrupted.clone();
        let found = self
            .detector
            .detect_and_clean(
                &mut cleaned,
                self.config.detector.window_size,
                self.config.detector.threshold,
            )
            .context("Anomaly detection failed")?
            .to_vec();

        let score = match self.detector.detection_score(&injected) {
            Ok(score) => Some(score),
            Err(e) => {
                warn!("Detection not scored: {}", e);
                None
            }
        };

        let filtered = self
            .filter
            .process(&cleaned)
            .context("Recurrent filtering failed")?
            .to_vec();
        let filter_mse = stats::mse(&filtered, &truth);

        let (lsm_fit, lsm_r2) = if self.config.lsm.enabled {
            self.fit_baseline(&cleaned)?
        } else {
            (None, None)
        };

        let report = ExperimentReport {
            label: sample.label,
            detection_method: self.detector.method().to_string(),
            filter_order: self.filter.order().to_string(),
            truth_stats: SampleStats::of(&truth),
            corrupted_stats: SampleStats::of(&corrupted),
            cleaned_stats: SampleStats::of(&cleaned),
            corrupted_mae: stats::mae(&corrupted, &truth),
            cleaned_mae: stats::mae(&cleaned, &truth),
            injected,
            found,
            score,
            filtered,
            filter_mse,
            lsm_fit,
            lsm_r2,
        };

        info!(
            "Run complete: {} injected, {} found, filter MSE={:.4}",
            report.injected.len(),
            report.found.len(),
            report.filter_mse
        );
        Ok(report)
    }

    fn fit_baseline(&self, cleaned: &[f64]) -> Result<(Option<Vec<f64>>, Option<f64>)> {
        let model = LeastSquares::fit(cleaned, self.config.lsm.cubic)
            .context("Least-squares fit failed")?;
        let fitted = model.extrapolate(self.config.lsm.extrapolate);
        let r2 = match model.r2_score(&fitted) {
            Ok(r2) => Some(r2),
            Err(e) => {
                warn!("R2 not available: {}", e);
                None
            }
        };
        Ok((Some(fitted), r2))
    }
}
