//! Thompson Sampling over independent Beta-Bernoulli arms, optimizing profit.

use super::arm::{ArmSnapshot, BetaArm};
use crate::error::{PricingError, Result};
use crate::market::Outcome;
use crate::random::RandomSource;
use tracing::trace;

/// Chooses a price each round and learns from the customer's response.
///
/// Arms keep the order they were configured in. That order matters: on an
/// exact tie in sampled profit the earlier arm wins.
#[derive(Debug)]
pub struct BanditAgent<S> {
    arms: Vec<BetaArm>,
    cost: f64,
    source: S,
}

impl<S: RandomSource> BanditAgent<S> {
    pub fn new(prices: &[f64], cost: f64, source: S) -> Result<Self> {
        if prices.is_empty() {
            return Err(PricingError::config("price list is empty"));
        }
        if let Some(bad) = prices.iter().find(|p| !p.is_finite()) {
            return Err(PricingError::config(format!("price {bad} is not finite")));
        }
        if !cost.is_finite() {
            return Err(PricingError::config(format!("cost {cost} is not finite")));
        }
        Ok(Self {
            arms: prices.iter().map(|&p| BetaArm::new(p)).collect(),
            cost,
            source,
        })
    }

    /// Pick the arm with the highest sampled expected profit.
    ///
    /// Draws `s_i ~ Beta(alpha_i, beta_i)` for every arm in configured order
    /// and scores it as `s_i * (price_i - cost)`. A later arm only replaces the
    /// current leader when its score is strictly greater, so exact ties keep
    /// the lowest index. Prices at or below cost still get sampled; their
    /// margin just never lets them win against a positive one.
    pub fn select_price(&mut self) -> Result<usize> {
        if self.arms.is_empty() {
            return Err(PricingError::config("no arms to select from"));
        }

        let mut best: Option<usize> = None;
        let mut max_expected_profit = f64::NEG_INFINITY;

        for (i, arm) in self.arms.iter().enumerate() {
            let sampled = self.source.sample_beta(arm.alpha(), arm.beta())?;
            let expected_profit = sampled * arm.margin(self.cost);

            if expected_profit > max_expected_profit {
                max_expected_profit = expected_profit;
                best = Some(i);
            }
        }

        let index = best.ok_or_else(|| {
            PricingError::Distribution("no arm produced a comparable profit sample".to_string())
        })?;
        trace!(
            index,
            price = self.arms[index].price(),
            sampled_profit = max_expected_profit,
            "selected arm"
        );
        Ok(index)
    }

    /// Record the customer's response to the price at `index`.
    pub fn update(&mut self, index: usize, outcome: Outcome) -> Result<()> {
        let arms = self.arms.len();
        let arm = self
            .arms
            .get_mut(index)
            .ok_or(PricingError::ArmOutOfRange { index, arms })?;
        arm.record(outcome);
        Ok(())
    }

    pub fn price(&self, index: usize) -> Result<f64> {
        self.arms
            .get(index)
            .map(BetaArm::price)
            .ok_or(PricingError::ArmOutOfRange {
                index,
                arms: self.arms.len(),
            })
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn arms(&self) -> &[BetaArm] {
        &self.arms
    }

    pub fn snapshot(&self) -> Vec<ArmSnapshot> {
        self.arms.iter().map(BetaArm::snapshot).collect()
    }

    /// Arm with the highest posterior-mean profit among arms quoted more than
    /// `min_samples` times. Earlier arms win ties.
    pub fn best_estimated_arm(&self, min_samples: u64) -> Option<usize> {
        best_estimated(&self.snapshot(), self.cost, min_samples)
    }
}

/// Shared by the agent and reports built from snapshots.
pub(crate) fn best_estimated(arms: &[ArmSnapshot], cost: f64, min_samples: u64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, arm) in arms.iter().enumerate() {
        if arm.sample_count <= min_samples {
            continue;
        }
        let profit = arm.estimated_profit(cost);
        match best {
            Some((_, best_profit)) if profit <= best_profit => {}
            _ => best = Some((i, profit)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedSource;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_empty_price_list_is_rejected() {
        let result = BanditAgent::new(&[], 30.0, ScriptedSource::default());
        assert!(matches!(result, Err(PricingError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_non_finite_price_is_rejected() {
        let result = BanditAgent::new(&[30.0, f64::NAN], 30.0, ScriptedSource::default());
        assert!(matches!(result, Err(PricingError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_selects_highest_sampled_profit() {
        // margins 5, 10, 15 with samples 0.9, 0.8, 0.3 -> profits 4.5, 8.0, 4.5
        let source = ScriptedSource::new([0.9, 0.8, 0.3]);
        let mut agent = BanditAgent::new(&[35.0, 40.0, 45.0], 30.0, source).unwrap();
        assert_eq!(agent.select_price().unwrap(), 1);
    }

    #[test]
    fn test_prefers_margin_over_conversion() {
        // 40 converts more often but 50 earns more per sampled rate
        let source = ScriptedSource::new([0.6, 0.4]);
        let mut agent = BanditAgent::new(&[40.0, 50.0], 30.0, source).unwrap();
        assert_eq!(agent.select_price().unwrap(), 1);
    }

    #[test]
    fn test_exact_tie_keeps_first_arm() {
        // 0.5 * 10 == 0.25 * 20 == 5.0 exactly
        let source = ScriptedSource::new([0.5, 0.25]);
        let mut agent = BanditAgent::new(&[40.0, 50.0], 30.0, source).unwrap();
        assert_eq!(agent.select_price().unwrap(), 0);

        let source = ScriptedSource::new([0.25, 0.5]);
        let mut agent = BanditAgent::new(&[50.0, 40.0], 30.0, source).unwrap();
        assert_eq!(agent.select_price().unwrap(), 0);
    }

    #[test]
    fn test_below_cost_arm_still_selectable_alone() {
        let source = ScriptedSource::new([0.9]);
        let mut agent = BanditAgent::new(&[20.0], 30.0, source).unwrap();
        assert_eq!(agent.select_price().unwrap(), 0);
    }

    #[test]
    fn test_select_propagates_exhausted_source() {
        let source = ScriptedSource::new([0.5]);
        let mut agent = BanditAgent::new(&[40.0, 50.0], 30.0, source).unwrap();
        assert!(matches!(
            agent.select_price(),
            Err(PricingError::RandomSourceExhausted)
        ));
    }

    #[test]
    fn test_update_mutates_only_target_arm() {
        let mut agent =
            BanditAgent::new(&[40.0, 50.0], 30.0, ChaCha8Rng::seed_from_u64(7)).unwrap();
        agent.update(1, Outcome::Sale).unwrap();
        agent.update(1, Outcome::NoSale).unwrap();

        let snap = agent.snapshot();
        assert_eq!((snap[0].alpha, snap[0].beta), (1.0, 1.0));
        assert_eq!((snap[1].alpha, snap[1].beta), (2.0, 2.0));
        assert_eq!(snap[1].sample_count, 2);
    }

    #[test]
    fn test_update_out_of_range() {
        let mut agent =
            BanditAgent::new(&[40.0, 50.0], 30.0, ChaCha8Rng::seed_from_u64(7)).unwrap();
        let err = agent.update(2, Outcome::Sale).unwrap_err();
        assert!(matches!(err, PricingError::ArmOutOfRange { index: 2, arms: 2 }));
        assert!(agent.price(5).is_err());
    }

    #[test]
    fn test_best_estimated_arm_respects_min_samples() {
        let mut agent =
            BanditAgent::new(&[40.0, 50.0], 30.0, ChaCha8Rng::seed_from_u64(7)).unwrap();
        for _ in 0..5 {
            agent.update(0, Outcome::Sale).unwrap();
        }
        agent.update(1, Outcome::Sale).unwrap();

        // arm 1 looks better (2/3 * 20) but has too few samples
        assert_eq!(agent.best_estimated_arm(2), Some(0));
        assert_eq!(agent.best_estimated_arm(0), Some(1));
        assert_eq!(agent.best_estimated_arm(10), None);
    }
}
