//! Thompson Sampling price agent.
//!
//! One Beta-Bernoulli belief per candidate price. Each round the agent draws a
//! plausible conversion rate from every posterior, scales it by the price's
//! margin and quotes the price with the highest sampled profit.

mod agent;
mod arm;

pub(crate) use agent::best_estimated;
pub use agent::BanditAgent;
pub use arm::{ArmSnapshot, BetaArm};
