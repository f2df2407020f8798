//! Simulation report generation.

use super::config::SimConfig;
use super::runner::SimulationResult;
use crate::bandit::{best_estimated, ArmSnapshot};
use crate::error::Result;
use crate::market::DemandCurve;
use serde::Serialize;

/// Arms must be quoted more often than this to count as a confident estimate.
pub const MIN_CONFIDENT_SAMPLES: u64 = 50;

/// Per-price line of a report.
#[derive(Debug, Clone, Serialize)]
pub struct PriceSummary {
    pub price: f64,
    pub times_chosen: u64,
    pub selection_share: f64,
    pub mean_conversion_estimate: f64,
    pub true_conversion: f64,
    pub alpha: f64,
    pub beta: f64,
}

/// Results of one run, with the market's true curve for comparison.
#[derive(Debug, Clone, Serialize)]
pub struct SimReport {
    pub seed: Option<u64>,
    pub rounds: usize,
    pub cancelled: bool,
    pub product_cost: f64,

    pub total_profit: f64,
    pub total_sales: u64,
    pub conversion_rate: f64,

    /// Expected profit lost against always quoting the true optimum
    pub expected_regret: f64,

    /// Best price by posterior-mean profit among confidently sampled arms
    pub best_estimated_price: Option<f64>,
    /// Best price on the true demand curve
    pub optimal_price: Option<f64>,

    pub prices: Vec<PriceSummary>,
}

impl SimReport {
    pub fn from_result(config: &SimConfig, result: &SimulationResult) -> Result<Self> {
        let curve = DemandCurve::new(config.true_value, config.sensitivity)?;
        let cost = result.cost;
        let prices = result.prices();
        let history = &result.history;
        let rounds = history.len();

        let optimal_idx = curve.optimal_price(&prices, cost);
        let optimal_profit = optimal_idx
            .map(|i| curve.expected_profit(prices[i], cost))
            .unwrap_or(0.0);
        let expected_regret = history
            .records()
            .iter()
            .map(|r| optimal_profit - curve.expected_profit(r.price, cost))
            .sum::<f64>();

        let counts = history.selection_counts(&prices);
        let price_summaries = result
            .arms
            .iter()
            .zip(&counts)
            .map(|(arm, &times_chosen)| PriceSummary {
                price: arm.price,
                times_chosen,
                selection_share: times_chosen as f64 / rounds.max(1) as f64,
                mean_conversion_estimate: arm.mean_conversion_estimate,
                true_conversion: curve.acceptance_probability(arm.price),
                alpha: arm.alpha,
                beta: arm.beta,
            })
            .collect();

        let total_sales = history.sales();

        Ok(Self {
            seed: result.seed,
            rounds,
            cancelled: result.cancelled,
            product_cost: cost,
            total_profit: history.total_profit(),
            total_sales,
            conversion_rate: total_sales as f64 / rounds.max(1) as f64,
            expected_regret,
            best_estimated_price: best_estimated(&result.arms, cost, MIN_CONFIDENT_SAMPLES)
                .map(|i| prices[i]),
            optimal_price: optimal_idx.map(|i| prices[i]),
            prices: price_summaries,
        })
    }

    /// Generate a text report.
    pub fn to_text(&self) -> String {
        let mut report = String::new();

        report.push_str("═══════════════════════════════════════════════════════════════\n");
        report.push_str("                    PRICING SIMULATION REPORT\n");
        report.push_str("═══════════════════════════════════════════════════════════════\n\n");

        let seed = match self.seed {
            Some(seed) => seed.to_string(),
            None => "scripted".to_string(),
        };
        report.push_str(&format!(
            "Seed: {}  Rounds: {}{}\n",
            seed,
            self.rounds,
            if self.cancelled { " (cancelled)" } else { "" }
        ));
        report.push_str(&format!("Product Cost: ${:.2}\n\n", self.product_cost));

        report.push_str("── RESULTS ──────────────────────────────────────────────────────\n");
        report.push_str(&format!("  Total Profit:       ${:.2}\n", self.total_profit));
        report.push_str(&format!(
            "  Sales:              {} ({:.1}%)\n",
            self.total_sales,
            self.conversion_rate * 100.0
        ));
        report.push_str(&format!(
            "  Expected Regret:    ${:.2}\n\n",
            self.expected_regret
        ));

        report.push_str("── FINAL BELIEFS ────────────────────────────────────────────────\n");
        report.push_str("  Price     Est. Conv   True Conv   Samples   Share\n");
        report.push_str("  ─────     ─────────   ─────────   ───────   ─────\n");
        for p in &self.prices {
            let bar: String = "█".repeat((p.selection_share * 20.0) as usize);
            report.push_str(&format!(
                "  ${:<7.2}  {:>8.2}    {:>8.2}    {:>7}   {:>5.1}% {}\n",
                p.price,
                p.mean_conversion_estimate,
                p.true_conversion,
                p.times_chosen,
                p.selection_share * 100.0,
                bar
            ));
        }
        report.push('\n');

        report.push_str("── ASSESSMENT ───────────────────────────────────────────────────\n");
        match self.best_estimated_price {
            Some(price) => report.push_str(&format!("  Best Estimated Price: ${:.2}\n", price)),
            None => report.push_str(&format!(
                "  Best Estimated Price: none (no arm above {} samples)\n",
                MIN_CONFIDENT_SAMPLES
            )),
        }
        if let Some(price) = self.optimal_price {
            report.push_str(&format!("  True Optimal Price:   ${:.2}\n", price));
        }

        report.push_str("\n═══════════════════════════════════════════════════════════════\n");

        report
    }

    /// Generate a JSON report for further analysis.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Aggregate over independent replications of the same configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ReplicationSummary {
    pub runs: usize,
    pub avg_total_profit: f64,
    pub avg_expected_regret: f64,
    pub avg_conversion_rate: f64,
    /// Fraction of runs whose best estimate is within one price step of the optimum
    pub near_optimal_rate: f64,
    pub reports: Vec<SimReport>,
}

impl ReplicationSummary {
    pub fn from_results(config: &SimConfig, results: &[SimulationResult]) -> Result<Self> {
        let reports = results
            .iter()
            .map(|r| SimReport::from_result(config, r))
            .collect::<Result<Vec<_>>>()?;
        let runs = reports.len();
        let n = runs.max(1) as f64;

        let near_optimal = results
            .iter()
            .zip(&reports)
            .filter(|(result, report)| {
                within_one_step(&result.arms, report.best_estimated_price, report.optimal_price)
            })
            .count();

        Ok(Self {
            runs,
            avg_total_profit: reports.iter().map(|r| r.total_profit).sum::<f64>() / n,
            avg_expected_regret: reports.iter().map(|r| r.expected_regret).sum::<f64>() / n,
            avg_conversion_rate: reports.iter().map(|r| r.conversion_rate).sum::<f64>() / n,
            near_optimal_rate: near_optimal as f64 / n,
            reports,
        })
    }

    pub fn to_text(&self) -> String {
        let mut report = String::new();
        report.push_str("── REPLICATIONS ─────────────────────────────────────────────────\n");
        report.push_str(&format!("  Runs:                {}\n", self.runs));
        report.push_str(&format!("  Avg Total Profit:    ${:.2}\n", self.avg_total_profit));
        report.push_str(&format!(
            "  Avg Expected Regret: ${:.2}\n",
            self.avg_expected_regret
        ));
        report.push_str(&format!(
            "  Avg Conversion:      {:.1}%\n",
            self.avg_conversion_rate * 100.0
        ));
        report.push_str(&format!(
            "  Near Optimal:        {:.1}% of runs\n",
            self.near_optimal_rate * 100.0
        ));
        report
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Whether `estimate` sits at most one position away from `optimum` in arm order.
pub fn within_one_step(arms: &[ArmSnapshot], estimate: Option<f64>, optimum: Option<f64>) -> bool {
    let position = |price: f64| arms.iter().position(|a| a.price == price);
    match (estimate.and_then(position), optimum.and_then(position)) {
        (Some(a), Some(b)) => a.abs_diff(b) <= 1,
        _ => false,
    }
}
