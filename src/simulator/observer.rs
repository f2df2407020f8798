//! Read-only per-round hooks for hosts: progress output and cancellation.

use super::history::RoundRecord;
use crate::bandit::BetaArm;
use std::ops::ControlFlow;
use tracing::info;

/// Called after every completed round.
///
/// Observers see the round just played and the agent's arms by shared
/// reference only. Returning `ControlFlow::Break` stops the run before the
/// next round starts.
pub trait RoundObserver {
    fn on_round(&mut self, record: &RoundRecord, arms: &[BetaArm]) -> ControlFlow<()>;
}

/// Observer that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RoundObserver for NoopObserver {
    fn on_round(&mut self, _record: &RoundRecord, _arms: &[BetaArm]) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

/// Logs the latest quoted price and the most-sampled arm every `interval` rounds.
#[derive(Debug, Clone)]
pub struct ProgressLogger {
    interval: u32,
}

impl ProgressLogger {
    pub fn new(interval: u32) -> Self {
        Self { interval }
    }
}

impl RoundObserver for ProgressLogger {
    fn on_round(&mut self, record: &RoundRecord, arms: &[BetaArm]) -> ControlFlow<()> {
        if self.interval > 0 && (record.round + 1) % self.interval == 0 {
            let leader = arms.iter().max_by_key(|arm| arm.sample_count());
            info!(
                day = record.round + 1,
                price = record.price,
                most_sampled = ?leader.map(BetaArm::price),
                "progress"
            );
        }
        ControlFlow::Continue(())
    }
}

/// Stops a run after a fixed number of rounds.
#[derive(Debug, Clone)]
pub struct StopAfter {
    rounds: u32,
}

impl StopAfter {
    pub fn new(rounds: u32) -> Self {
        Self { rounds }
    }
}

impl RoundObserver for StopAfter {
    fn on_round(&mut self, record: &RoundRecord, _arms: &[BetaArm]) -> ControlFlow<()> {
        if record.round + 1 >= self.rounds {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

impl<F> RoundObserver for F
where
    F: FnMut(&RoundRecord, &[BetaArm]) -> ControlFlow<()>,
{
    fn on_round(&mut self, record: &RoundRecord, arms: &[BetaArm]) -> ControlFlow<()> {
        self(record, arms)
    }
}
