//! CHAOS: Fault injection for resilience drills
//!
//! Probabilistically fails or delays the wrapped operation, driven by
//! environment variables that are re-read on every call.

use thiserror::Error;

pub mod config;
pub mod inject;

pub use config::FaultConfig;
pub use inject::{
    decide, inject_chaos_if_enabled, ChaosDecision, ChaosInjector, Sleeper, TokioSleeper,
};

/// Message carried by every synthetic failure
pub const SIMULATED_FAILURE_MESSAGE: &str = "Chaos engineering: simulated service failure";

/// Chaos errors
#[derive(Error, Debug)]
pub enum ChaosError {
    /// Deliberately injected failure; callers are expected to observe it
    #[error("{0}")]
    SimulatedFailure(String),

    #[error("◆ INVALID CHAOS CONFIG: {name}={value:?} ({reason})")]
    InvalidConfig {
        name: &'static str,
        value: String,
        reason: String,
    },
}

impl ChaosError {
    pub fn simulated() -> Self {
        ChaosError::SimulatedFailure(SIMULATED_FAILURE_MESSAGE.to_string())
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, ChaosError::SimulatedFailure(_))
    }
}

pub type Result<T> = std::result::Result<T, ChaosError>;
