//! Error types shared by the market, the agent and the simulator.

use thiserror::Error;

/// Everything that can abort a pricing simulation.
#[derive(Error, Debug)]
pub enum PricingError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Arm index {index} out of range ({arms} arms configured)")]
    ArmOutOfRange { index: usize, arms: usize },

    #[error("Random source exhausted")]
    RandomSourceExhausted,

    #[error("Distribution error: {0}")]
    Distribution(String),

    #[error("Invalid outcome {0}, expected 0 or 1")]
    InvalidOutcome(u8),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PricingError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }
}

pub type Result<T> = std::result::Result<T, PricingError>;
