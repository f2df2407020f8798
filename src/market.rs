//! The hidden market: a single customer deciding whether to buy at a quoted price.

use crate::error::{PricingError, Result};
use crate::random::RandomSource;
use serde::{Deserialize, Serialize};

/// Purchase decision for one quoted price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Outcome {
    NoSale,
    Sale,
}

impl Outcome {
    pub fn is_sale(self) -> bool {
        self == Outcome::Sale
    }
}

impl From<Outcome> for u8 {
    fn from(outcome: Outcome) -> u8 {
        match outcome {
            Outcome::NoSale => 0,
            Outcome::Sale => 1,
        }
    }
}

impl TryFrom<u8> for Outcome {
    type Error = PricingError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Outcome::NoSale),
            1 => Ok(Outcome::Sale),
            other => Err(PricingError::InvalidOutcome(other)),
        }
    }
}

/// Logistic demand curve.
///
/// `p(price) = 1 / (1 + exp(sensitivity * (price - true_value)))`, so the
/// customer buys half the time at `true_value` and demand falls off faster
/// the larger `sensitivity` is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CurveParams")]
pub struct DemandCurve {
    true_value: f64,
    sensitivity: f64,
}

/// Unchecked wire form of [`DemandCurve`].
#[derive(Deserialize)]
struct CurveParams {
    true_value: f64,
    sensitivity: f64,
}

impl TryFrom<CurveParams> for DemandCurve {
    type Error = PricingError;

    fn try_from(params: CurveParams) -> Result<Self> {
        DemandCurve::new(params.true_value, params.sensitivity)
    }
}

impl DemandCurve {
    pub fn new(true_value: f64, sensitivity: f64) -> Result<Self> {
        if !true_value.is_finite() {
            return Err(PricingError::config(format!(
                "true_value must be finite, got {true_value}"
            )));
        }
        if !sensitivity.is_finite() || sensitivity <= 0.0 {
            return Err(PricingError::config(format!(
                "sensitivity must be strictly positive, got {sensitivity}"
            )));
        }
        Ok(Self {
            true_value,
            sensitivity,
        })
    }

    pub fn true_value(&self) -> f64 {
        self.true_value
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }

    pub fn acceptance_probability(&self, price: f64) -> f64 {
        1.0 / (1.0 + (self.sensitivity * (price - self.true_value)).exp())
    }

    /// Expected profit of quoting `price` once.
    pub fn expected_profit(&self, price: f64, cost: f64) -> f64 {
        self.acceptance_probability(price) * (price - cost)
    }

    /// Index of the price with the highest expected profit on the true curve.
    /// Ties go to the earlier price. `None` for an empty slice.
    pub fn optimal_price(&self, prices: &[f64], cost: f64) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &price) in prices.iter().enumerate() {
            let profit = self.expected_profit(price, cost);
            match best {
                Some((_, best_profit)) if profit <= best_profit => {}
                _ => best = Some((i, profit)),
            }
        }
        best.map(|(i, _)| i)
    }
}

/// A stochastic oracle mapping a quoted price to a purchase decision.
///
/// Holds nothing but its curve parameters and the randomness it draws from.
#[derive(Debug)]
pub struct Market<S> {
    curve: DemandCurve,
    source: S,
}

impl<S: RandomSource> Market<S> {
    /// Fails if `sensitivity <= 0` or either parameter is not finite.
    pub fn new(true_value: f64, sensitivity: f64, source: S) -> Result<Self> {
        Ok(Self {
            curve: DemandCurve::new(true_value, sensitivity)?,
            source,
        })
    }

    pub fn curve(&self) -> &DemandCurve {
        &self.curve
    }

    pub fn acceptance_probability(&self, price: f64) -> f64 {
        self.curve.acceptance_probability(price)
    }

    /// Draw one customer decision for `price`.
    pub fn decide(&mut self, price: f64) -> Result<Outcome> {
        let p = self.curve.acceptance_probability(price);
        let u = self.source.next_unit()?;
        Ok(if u < p { Outcome::Sale } else { Outcome::NoSale })
    }
}
