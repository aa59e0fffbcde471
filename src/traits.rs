use anyhow::Result;

use crate::generator::Sample;

#[cfg_attr(test, mockall::automock)]
pub trait SampleSource {
    /// Produce the next finite sequence together with its display label.
    fn produce(&mut self) -> Result<Sample>;
}

#[cfg_attr(test, mockall::automock)]
pub trait AnomalySource {
    /// Corrupt `values` in place. Returns the corrupted indices (ground truth).
    fn corrupt(&mut self, values: &mut [f64]) -> Result<Vec<usize>>;
}
