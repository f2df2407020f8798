//! Injectable randomness.
//!
//! The market and the agent never reach for a global RNG. Each owns a
//! [`RandomSource`], which is either a real generator (any `rand::RngCore`,
//! usually a seeded `ChaCha8Rng`) or a [`ScriptedSource`] replaying fixed
//! values in tests.

use crate::error::{PricingError, Result};
use rand::{Rng, RngCore};
use rand_distr::{Beta, Distribution};
use std::collections::VecDeque;

/// Source of the two draws the simulation needs.
pub trait RandomSource {
    /// Uniform draw in `[0, 1)`.
    fn next_unit(&mut self) -> Result<f64>;

    /// One draw from `Beta(alpha, beta)`.
    fn sample_beta(&mut self, alpha: f64, beta: f64) -> Result<f64>;
}

impl<R: RngCore> RandomSource for R {
    fn next_unit(&mut self) -> Result<f64> {
        Ok(self.gen::<f64>())
    }

    fn sample_beta(&mut self, alpha: f64, beta: f64) -> Result<f64> {
        let dist = Beta::new(alpha, beta).map_err(|e| {
            PricingError::Distribution(format!("Beta({alpha}, {beta}): {e}"))
        })?;
        Ok(dist.sample(self))
    }
}

/// Replays a fixed sequence of values.
///
/// Both draws pop from the same queue, so a test can script exactly which
/// posterior samples and purchase draws a run will see. Once the queue is
/// empty every draw fails with [`PricingError::RandomSourceExhausted`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    values: VecDeque<f64>,
}

impl ScriptedSource {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Values not yet consumed.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    fn pop(&mut self) -> Result<f64> {
        self.values
            .pop_front()
            .ok_or(PricingError::RandomSourceExhausted)
    }
}

impl RandomSource for ScriptedSource {
    fn next_unit(&mut self) -> Result<f64> {
        self.pop()
    }

    fn sample_beta(&mut self, _alpha: f64, _beta: f64) -> Result<f64> {
        self.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_unit_draws_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(12345);
        for _ in 0..1000 {
            let u = rng.next_unit().unwrap();
            assert!((0.0..1.0).contains(&u), "unit draw out of range: {}", u);
        }
    }

    #[test]
    fn test_beta_samples_track_mean() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let n = 2000;
        let mean: f64 = (0..n)
            .map(|_| rng.sample_beta(30.0, 10.0).unwrap())
            .sum::<f64>()
            / n as f64;
        assert!((mean - 0.75).abs() < 0.02, "mean of Beta(30,10) was {}", mean);
    }

    #[test]
    fn test_beta_rejects_invalid_parameters() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = rng.sample_beta(0.0, 1.0).unwrap_err();
        assert!(matches!(err, PricingError::Distribution(_)));
    }

    #[test]
    fn test_scripted_source_replays_then_exhausts() {
        let mut source = ScriptedSource::new([0.25, 0.75]);
        assert_eq!(source.sample_beta(1.0, 1.0).unwrap(), 0.25);
        assert_eq!(source.next_unit().unwrap(), 0.75);
        assert_eq!(source.remaining(), 0);
        assert!(matches!(
            source.next_unit(),
            Err(PricingError::RandomSourceExhausted)
        ));
    }
}
