//! Simulation configuration.

use crate::error::{PricingError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    /// Price at which a customer buys half the time (hidden from the agent)
    pub true_value: f64,

    /// How fast demand drops once the price passes `true_value`
    pub sensitivity: f64,

    /// Cost of making one unit
    pub product_cost: f64,

    /// Number of rounds (one customer each)
    pub days: u32,

    /// Candidate prices, in the order ties are broken
    pub prices: Vec<f64>,

    /// Random seed for reproducibility (None = random)
    #[serde(default)]
    pub seed: Option<u64>,

    /// Log progress every N rounds (0 = never)
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u32,
}

fn default_progress_interval() -> u32 {
    500
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            true_value: 45.0,
            sensitivity: 0.5,
            product_cost: 30.0,
            days: 2000,
            prices: vec![30.0, 35.0, 40.0, 45.0, 50.0, 55.0, 60.0],
            seed: None,
            progress_interval: default_progress_interval(),
        }
    }
}

impl SimConfig {
    /// Default parameters with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }

    /// Load a JSON config.
    ///
    /// Market, cost, days and prices are required; only `seed` and
    /// `progress_interval` may be omitted. Unknown keys are rejected.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: SimConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject anything that would make a run meaningless before it starts.
    pub fn validate(&self) -> Result<()> {
        if !self.true_value.is_finite() {
            return Err(PricingError::config("true_value must be finite"));
        }
        if !self.sensitivity.is_finite() || self.sensitivity <= 0.0 {
            return Err(PricingError::config(format!(
                "sensitivity must be strictly positive, got {}",
                self.sensitivity
            )));
        }
        if !self.product_cost.is_finite() || self.product_cost < 0.0 {
            return Err(PricingError::config(format!(
                "product_cost must be finite and non-negative, got {}",
                self.product_cost
            )));
        }
        if self.days == 0 {
            return Err(PricingError::config("days must be greater than zero"));
        }
        if self.prices.is_empty() {
            return Err(PricingError::config("prices must not be empty"));
        }
        for (i, price) in self.prices.iter().enumerate() {
            if !price.is_finite() {
                return Err(PricingError::config(format!("price {price} is not finite")));
            }
            if self.prices[..i].contains(price) {
                return Err(PricingError::config(format!("price {price} is listed twice")));
            }
        }
        Ok(())
    }
}
