//! Anomaly injection. Scales randomly chosen samples and reports which ones,
//! so the detector can be scored against the ground truth.

use log::debug;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use crate::config::AnomalyConfig;
use crate::error::{Error, Result};
use crate::traits::AnomalySource;

#[derive(Debug)]
pub struct AnomalyInjector {
    count: usize,
    scale: f64,
    rng: StdRng,
}

impl AnomalyInjector {
    pub fn new(count: usize, scale: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        AnomalyInjector { count, scale, rng }
    }

    pub fn from_config(config: &AnomalyConfig, seed: Option<u64>) -> Self {
        Self::new(config.count, config.scale, seed)
    }

    /// Multiply `count` distinct, uniformly chosen samples by `scale`.
    ///
    /// Returns the corrupted indices in ascending order.
    pub fn inject(&mut self, values: &mut [f64]) -> Result<Vec<usize>> {
        if self.count > values.len() {
            return Err(Error::InvalidParameter {
                name: "count",
                reason: format!(
                    "cannot corrupt {} samples of a {}-sample sequence",
                    self.count,
                    values.len()
                ),
            });
        }

        let mut indices = index::sample(&mut self.rng, values.len(), self.count).into_vec();
        indices.sort_unstable();
        for &i in &indices {
            values[i] *= self.scale;
        }

        debug!("Injected {} anomalies (x{}) at {:?}", indices.len(), self.scale, indices);
        Ok(indices)
    }
}

impl AnomalySource for AnomalyInjector {
    fn corrupt(&mut self, values: &mut [f64]) -> anyhow::Result<Vec<usize>> {
        Ok(self.inject(values)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_injects_distinct_indices() {
        let mut values = vec![2.0; 100];
        let mut injector = AnomalyInjector::new(10, 5.0, Some(3));

        let indices = injector.inject(&mut values).unwrap();

        assert_eq!(indices.len(), 10);
        assert!(indices.windows(2).all(|w| w[0] < w[1]));
        for (i, &v) in values.iter().enumerate() {
            let expected = if indices.contains(&i) { 10.0 } else { 2.0 };
            assert_eq!(v, expected, "index {}", i);
        }
    }

    #[test]
    fn test_seeded_injection_is_reproducible() {
        let mut a = vec![1.0; 50];
        let mut b = vec![1.0; 50];
        let first = AnomalyInjector::new(5, 3.0, Some(11)).inject(&mut a).unwrap();
        let second = AnomalyInjector::new(5, 3.0, Some(11)).inject(&mut b).unwrap();
        assert_eq!(first, second);
        assert_eq!(a, b);
    }

    #[test]
    fn test_count_larger_than_sequence() {
        let mut values = vec![1.0; 3];
        let mut injector = AnomalyInjector::new(4, 2.0, Some(0));
        assert!(matches!(
            injector.inject(&mut values),
            Err(Error::InvalidParameter { name: "count", .. })
        ));
        assert_eq!(values, vec![1.0; 3]);
    }

    #[test]
    fn test_zero_count_leaves_sequence() {
        let mut values = vec![1.0, 2.0];
        let indices = AnomalyInjector::new(0, 9.0, Some(0)).inject(&mut values).unwrap();
        assert!(indices.is_empty());
        assert_eq!(values, vec![1.0, 2.0]);
    }
}
