//! Main simulation loop: select, decide, update, record.
//!
//! Each round reads the beliefs the previous round wrote, so rounds within a
//! run are strictly sequential. Independent runs share nothing and can go on
//! separate threads (see [`run_replications`]).

use super::config::SimConfig;
use super::history::{History, RoundRecord};
use super::observer::{NoopObserver, ProgressLogger, RoundObserver};
use crate::bandit::{ArmSnapshot, BanditAgent};
use crate::error::{PricingError, Result};
use crate::market::Market;
use crate::random::RandomSource;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;
use tracing::{debug, trace};

/// Everything a finished run leaves behind for reports and renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Seed the run was started from; `None` for hand-built simulations
    pub seed: Option<u64>,
    pub cost: f64,
    pub history: History,
    /// Final belief per arm, in configured price order
    pub arms: Vec<ArmSnapshot>,
    /// An observer stopped the run before `days` rounds
    pub cancelled: bool,
}

impl SimulationResult {
    pub fn prices(&self) -> Vec<f64> {
        self.arms.iter().map(|a| a.price).collect()
    }
}

/// One market and one agent played against each other for a fixed number of rounds.
pub struct Simulation<M, A> {
    market: Market<M>,
    agent: BanditAgent<A>,
    days: u32,
    seed: Option<u64>,
    history: History,
}

impl<M: RandomSource, A: RandomSource> Simulation<M, A> {
    pub fn new(market: Market<M>, agent: BanditAgent<A>, days: u32) -> Result<Self> {
        if days == 0 {
            return Err(PricingError::config("days must be greater than zero"));
        }
        Ok(Self {
            market,
            agent,
            days,
            seed: None,
            history: History::with_capacity(days as usize),
        })
    }

    /// Record the seed both random streams were derived from.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn agent(&self) -> &BanditAgent<A> {
        &self.agent
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Play one round and append it to the history.
    pub fn step(&mut self) -> Result<RoundRecord> {
        let round = self.history.len() as u32;
        let index = self.agent.select_price()?;
        let price = self.agent.price(index)?;
        let outcome = self.market.decide(price)?;
        self.agent.update(index, outcome)?;

        let record = RoundRecord::new(round, price, outcome, self.agent.cost());
        trace!(round, price, outcome = u8::from(outcome), "round played");
        self.history.push(record);
        Ok(record)
    }

    /// Play the remaining rounds. The first error aborts the run.
    pub fn run<O: RoundObserver>(mut self, observer: &mut O) -> Result<SimulationResult> {
        let mut cancelled = false;
        while (self.history.len() as u32) < self.days {
            let record = self.step()?;
            if let ControlFlow::Break(()) = observer.on_round(&record, self.agent.arms()) {
                cancelled = (self.history.len() as u32) < self.days;
                break;
            }
        }

        debug!(
            rounds = self.history.len(),
            total_profit = self.history.total_profit(),
            cancelled,
            "simulation finished"
        );

        Ok(SimulationResult {
            seed: self.seed,
            cost: self.agent.cost(),
            arms: self.agent.snapshot(),
            history: self.history,
            cancelled,
        })
    }
}

/// Build seeded market and agent streams for `config`.
///
/// Both are derived from one ChaCha8 stream so a single seed pins the run.
pub fn build_simulation(
    config: &SimConfig,
    seed: u64,
) -> Result<Simulation<ChaCha8Rng, ChaCha8Rng>> {
    config.validate()?;

    let mut master = ChaCha8Rng::seed_from_u64(seed);
    let market_rng = ChaCha8Rng::seed_from_u64(master.next_u64());
    let agent_rng = ChaCha8Rng::seed_from_u64(master.next_u64());

    let market = Market::new(config.true_value, config.sensitivity, market_rng)?;
    let agent = BanditAgent::new(&config.prices, config.product_cost, agent_rng)?;
    Ok(Simulation::new(market, agent, config.days)?.with_seed(seed))
}

fn resolve_seed(config: &SimConfig) -> u64 {
    config
        .seed
        .unwrap_or_else(|| ChaCha8Rng::from_entropy().next_u64())
}

/// Run one simulation, logging progress every `config.progress_interval` rounds.
pub fn run_simulation(config: &SimConfig) -> Result<SimulationResult> {
    let mut observer = ProgressLogger::new(config.progress_interval);
    run_simulation_with(config, &mut observer)
}

/// Run one simulation with a caller-supplied observer.
pub fn run_simulation_with<O: RoundObserver>(
    config: &SimConfig,
    observer: &mut O,
) -> Result<SimulationResult> {
    let seed = resolve_seed(config);
    debug!(
        seed,
        days = config.days,
        arms = config.prices.len(),
        "starting simulation"
    );
    build_simulation(config, seed)?.run(observer)
}

/// Run `runs` independent simulations in parallel, seeds `seed + run_index`.
///
/// Results come back in run order. Progress logging is off for replications.
pub fn run_replications(config: &SimConfig, runs: u32) -> Result<Vec<SimulationResult>> {
    config.validate()?;
    if runs == 0 {
        return Err(PricingError::config("runs must be greater than zero"));
    }
    let base_seed = resolve_seed(config);

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..runs)
            .map(|run_idx| {
                let seed = base_seed.wrapping_add(run_idx as u64);
                scope.spawn(move || -> Result<SimulationResult> {
                    build_simulation(config, seed)?.run(&mut NoopObserver)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bandit::BetaArm;
    use crate::random::ScriptedSource;
    use crate::simulator::StopAfter;

    fn small_config(seed: u64) -> SimConfig {
        SimConfig {
            days: 300,
            seed: Some(seed),
            progress_interval: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_single_run_length() {
        let result = run_simulation(&small_config(12345)).unwrap();
        assert_eq!(result.history.len(), 300);
        assert!(!result.cancelled);
        assert_eq!(result.seed, Some(12345));
        for (i, record) in result.history.records().iter().enumerate() {
            assert_eq!(record.round, i as u32);
        }
    }

    #[test]
    fn test_belief_counts_match_selections() {
        let config = small_config(42);
        let result = run_simulation(&config).unwrap();
        let counts = result.history.selection_counts(&config.prices);
        for (arm, count) in result.arms.iter().zip(counts) {
            assert_eq!(arm.sample_count, count, "arm at {} miscounted", arm.price);
            assert!(arm.alpha >= 1.0 && arm.beta >= 1.0);
        }
    }

    #[test]
    fn test_invalid_config_fails_before_running() {
        let config = SimConfig {
            prices: vec![],
            ..small_config(1)
        };
        let mut rounds = 0;
        let mut count = |_: &RoundRecord, _: &[BetaArm]| {
            rounds += 1;
            ControlFlow::Continue(())
        };
        assert!(run_simulation_with(&config, &mut count).is_err());
        assert_eq!(rounds, 0);
    }

    #[test]
    fn test_observer_can_cancel() {
        let mut stop = StopAfter::new(10);
        let result = run_simulation_with(&small_config(7), &mut stop).unwrap();
        assert_eq!(result.history.len(), 10);
        assert!(result.cancelled);
    }

    #[test]
    fn test_stop_on_last_round_is_not_a_cancellation() {
        let mut stop = StopAfter::new(300);
        let result = run_simulation_with(&small_config(7), &mut stop).unwrap();
        assert_eq!(result.history.len(), 300);
        assert!(!result.cancelled);
    }

    #[test]
    fn test_exhausted_source_aborts_run() {
        // two rounds of agent draws, but the market only has one value
        let market = Market::new(45.0, 0.5, ScriptedSource::new([0.1])).unwrap();
        let agent = BanditAgent::new(&[40.0], 30.0, ScriptedSource::new([0.5, 0.5])).unwrap();
        let mut sim = Simulation::new(market, agent, 5).unwrap();

        let first = sim.step().unwrap();
        assert_eq!(first.profit, 10.0);
        assert!(matches!(sim.step(), Err(PricingError::RandomSourceExhausted)));
        assert_eq!(sim.history().len(), 1);
    }

    #[test]
    fn test_scripted_run_has_no_seed() {
        let market = Market::new(45.0, 0.5, ScriptedSource::new([0.1, 0.95])).unwrap();
        let agent = BanditAgent::new(&[40.0], 30.0, ScriptedSource::new([0.5, 0.5])).unwrap();
        let sim = Simulation::new(market, agent, 2).unwrap();
        assert_eq!(sim.seed(), None);

        let result = sim.run(&mut NoopObserver).unwrap();
        assert_eq!(result.seed, None);
        assert_eq!(result.history.len(), 2);
        assert_eq!(result.history.sales(), 1);
    }

    #[test]
    fn test_built_simulation_carries_its_seed() {
        let sim = build_simulation(&small_config(5), 77).unwrap();
        assert_eq!(sim.seed(), Some(77));
        assert_eq!(sim.run(&mut StopAfter::new(3)).unwrap().seed, Some(77));
    }

    #[test]
    fn test_zero_days_rejected() {
        let market = Market::new(45.0, 0.5, ScriptedSource::default()).unwrap();
        let agent = BanditAgent::new(&[40.0], 30.0, ScriptedSource::default()).unwrap();
        assert!(Simulation::new(market, agent, 0).is_err());
    }

    #[test]
    fn test_replications_are_independent_and_ordered() {
        let config = small_config(100);
        let results = run_replications(&config, 4).unwrap();
        assert_eq!(results.len(), 4);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.seed, Some(100 + i as u64));
            let solo = run_simulation_with(
                &SimConfig {
                    seed: result.seed,
                    ..config.clone()
                },
                &mut NoopObserver,
            )
            .unwrap();
            assert_eq!(solo.history, result.history);
        }
    }
}
