//! Per-price belief state.

use crate::market::Outcome;
use serde::{Deserialize, Serialize};

/// One candidate price and its `Beta(alpha, beta)` posterior over conversion.
///
/// Starts at the uniform prior `(1, 1)`. Every recorded outcome adds exactly
/// one to either `alpha` or `beta`, so `alpha + beta - 2` is always the
/// number of times this price has been quoted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetaArm {
    price: f64,
    alpha: f64,
    beta: f64,
}

impl BetaArm {
    pub fn new(price: f64) -> Self {
        Self {
            price,
            alpha: 1.0,
            beta: 1.0,
        }
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Fold one observed outcome into the posterior.
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Sale => self.alpha += 1.0,
            Outcome::NoSale => self.beta += 1.0,
        }
    }

    /// Posterior mean conversion rate.
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    pub fn sample_count(&self) -> u64 {
        (self.alpha + self.beta - 2.0).round() as u64
    }

    pub fn margin(&self, cost: f64) -> f64 {
        self.price - cost
    }

    pub fn snapshot(&self) -> ArmSnapshot {
        ArmSnapshot {
            price: self.price,
            alpha: self.alpha,
            beta: self.beta,
            mean_conversion_estimate: self.mean(),
            sample_count: self.sample_count(),
        }
    }
}

/// Owned, read-only copy of an arm for reports and renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmSnapshot {
    pub price: f64,
    pub alpha: f64,
    pub beta: f64,
    pub mean_conversion_estimate: f64,
    pub sample_count: u64,
}

impl ArmSnapshot {
    /// Posterior-mean profit per quote.
    pub fn estimated_profit(&self, cost: f64) -> f64 {
        self.mean_conversion_estimate * (self.price - cost)
    }
}
