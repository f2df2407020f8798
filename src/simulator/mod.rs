//! Pricing simulator.
//!
//! Plays a [`Market`](crate::market::Market) against a
//! [`BanditAgent`](crate::bandit::BanditAgent) one customer per round and
//! keeps the full history for analysis:
//! - Which prices the agent converged on
//! - How much profit it left on the table (expected regret)
//! - How stable that is across seeds (replications)

mod config;
mod history;
mod observer;
mod report;
mod runner;

pub use config::SimConfig;
pub use history::{History, RoundRecord};
pub use observer::{NoopObserver, ProgressLogger, RoundObserver, StopAfter};
pub use report::{
    within_one_step, PriceSummary, ReplicationSummary, SimReport, MIN_CONFIDENT_SAMPLES,
};
pub use runner::{
    build_simulation, run_replications, run_simulation, run_simulation_with, Simulation,
    SimulationResult,
};
