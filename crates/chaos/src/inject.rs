//! Fault decision and application

use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tracing::warn;

use crate::config::DELAY_MAX_VAR;
use crate::{ChaosError, FaultConfig, Result};

/// Outcome of one chaos roll
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChaosDecision {
    /// Let the operation through untouched
    Pass,
    /// Raise a synthetic failure
    Fail { probability: f64 },
    /// Hold the operation back before letting it through
    Delay {
        probability: f64,
        delay_seconds: f64,
    },
}

/// Roll the dice for a single invocation.
///
/// A disabled config returns `Pass` without touching `rng`. Failure and delay
/// never both apply: the delay is only sampled after the failure check misses.
pub fn decide<R: Rng>(config: &FaultConfig, rng: &mut R) -> ChaosDecision {
    if !config.enabled {
        return ChaosDecision::Pass;
    }

    let probability: f64 = rng.gen();
    if probability < config.error_rate {
        return ChaosDecision::Fail { probability };
    }

    if config.max_delay_seconds > 0 {
        let delay_seconds = rng.gen_range(0.0..=config.max_delay_seconds as f64);
        return ChaosDecision::Delay {
            probability,
            delay_seconds,
        };
    }

    ChaosDecision::Pass
}

/// Suspension primitive used for injected delays
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Cooperative tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Applies chaos decisions, logging each injected fault
#[derive(Debug, Clone, Default)]
pub struct ChaosInjector<S = TokioSleeper> {
    sleeper: S,
}

impl ChaosInjector<TokioSleeper> {
    pub fn new() -> Self {
        Self {
            sleeper: TokioSleeper,
        }
    }
}

impl<S: Sleeper> ChaosInjector<S> {
    pub fn with_sleeper(sleeper: S) -> Self {
        Self { sleeper }
    }

    /// Reload settings from the environment and roll once
    pub async fn inject(&self) -> Result<ChaosDecision> {
        let config = FaultConfig::from_env()?;
        // The thread-local rng must not live across the await below.
        let decision = decide(&config, &mut rand::thread_rng());
        self.apply(&config, decision).await
    }

    /// Roll once against an explicit config and random source
    pub async fn inject_with<R: Rng + Send>(
        &self,
        config: &FaultConfig,
        rng: &mut R,
    ) -> Result<ChaosDecision> {
        let decision = decide(config, rng);
        self.apply(config, decision).await
    }

    async fn apply(&self, config: &FaultConfig, decision: ChaosDecision) -> Result<ChaosDecision> {
        match decision {
            ChaosDecision::Pass => Ok(decision),
            ChaosDecision::Fail { probability } => {
                warn!(
                    event_type = "error",
                    probability,
                    error_rate = config.error_rate,
                    chaos_config = %config,
                    "◆ CHAOS[error]: injecting failure - probability={:.3} < error_rate={:.3}",
                    probability,
                    config.error_rate
                );
                Err(ChaosError::simulated())
            }
            ChaosDecision::Delay {
                probability,
                delay_seconds,
            } => {
                warn!(
                    event_type = "delay",
                    delay_seconds,
                    probability,
                    error_rate = config.error_rate,
                    chaos_config = %config,
                    "◆ CHAOS[delay]: injecting delay - delay_seconds={:.3}, probability={:.3} >= error_rate={:.3}",
                    delay_seconds,
                    probability,
                    config.error_rate
                );
                let duration = Duration::try_from_secs_f64(delay_seconds).map_err(|e| {
                    ChaosError::InvalidConfig {
                        name: DELAY_MAX_VAR,
                        value: config.max_delay_seconds.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                self.sleeper.sleep(duration).await;
                Ok(decision)
            }
        }
    }
}

/// Inject chaos into the calling operation if `CHAOS_ENABLED` says so.
///
/// Returns `ChaosError::SimulatedFailure` when the roll lands under the
/// configured error rate; that error is meant to reach the caller as-is.
pub async fn inject_chaos_if_enabled() -> Result<()> {
    ChaosInjector::new().inject().await.map(|_| ())
}
