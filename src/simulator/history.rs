//! Append-only record of every simulated round.

use crate::market::Outcome;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// What happened in one round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u32,
    pub price: f64,
    pub outcome: Outcome,
    /// `price - cost` on a sale, zero otherwise
    pub profit: f64,
}

impl RoundRecord {
    pub fn new(round: u32, price: f64, outcome: Outcome, cost: f64) -> Self {
        let profit = if outcome.is_sale() { price - cost } else { 0.0 };
        Self {
            round,
            price,
            outcome,
            profit,
        }
    }
}

/// Rounds in the order they were played.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    records: Vec<RoundRecord>,
}

impl History {
    pub fn with_capacity(rounds: usize) -> Self {
        Self {
            records: Vec::with_capacity(rounds),
        }
    }

    pub(crate) fn push(&mut self, record: RoundRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[RoundRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&RoundRecord> {
        self.records.last()
    }

    pub fn total_profit(&self) -> f64 {
        self.records.iter().map(|r| r.profit).sum()
    }

    pub fn sales(&self) -> u64 {
        self.records.iter().filter(|r| r.outcome.is_sale()).count() as u64
    }

    /// How often each of `prices` was quoted, in the same order.
    pub fn selection_counts(&self, prices: &[f64]) -> Vec<u64> {
        let mut counts = vec![0u64; prices.len()];
        for record in &self.records {
            if let Some(i) = prices.iter().position(|&p| p == record.price) {
                counts[i] += 1;
            }
        }
        counts
    }

    /// Write `round,price,outcome,profit` rows with a header.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writeln!(writer, "round,price,outcome,profit")?;
        for r in &self.records {
            writeln!(
                writer,
                "{},{},{},{}",
                r.round,
                r.price,
                u8::from(r.outcome),
                r.profit
            )?;
        }
        writer.flush()
    }
}
