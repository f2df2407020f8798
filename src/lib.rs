//! Pricebandit - Thompson Sampling price optimization against a simulated market.
//!
//! A [`Market`] answers each quoted price with a stochastic purchase decision.
//! A [`BanditAgent`] keeps a Beta posterior per candidate price and picks the
//! price whose sampled conversion rate times margin is highest. The
//! [`simulator`] plays them against each other and reports what was learned.

pub mod bandit;
pub mod build_info;
pub mod error;
pub mod market;
pub mod random;
pub mod simulator;

pub use bandit::{ArmSnapshot, BanditAgent, BetaArm};
pub use error::{PricingError, Result};
pub use market::{DemandCurve, Market, Outcome};
pub use random::{RandomSource, ScriptedSource};
pub use simulator::{run_simulation, SimConfig, SimReport, SimulationResult};
