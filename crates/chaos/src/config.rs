//! Chaos settings, loaded from the environment on every call

use serde::Serialize;
use std::fmt;

use crate::{ChaosError, Result};

pub const ENABLED_VAR: &str = "CHAOS_ENABLED";
pub const ERROR_RATE_VAR: &str = "CHAOS_INJECT_ERROR_RATE";
pub const DELAY_MAX_VAR: &str = "CHAOS_DELAY_SECONDS_MAX";

const DEFAULT_ENABLED: &str = "false";
const DEFAULT_ERROR_RATE: &str = "0.1";
const DEFAULT_DELAY_MAX: &str = "5";

/// Snapshot of the chaos settings for a single invocation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FaultConfig {
    pub enabled: bool,
    pub error_rate: f64,
    pub max_delay_seconds: u64,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            error_rate: 0.1,
            max_delay_seconds: 5,
        }
    }
}

impl FaultConfig {
    /// Read the current process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Unset variables fall back to defaults,
    /// malformed numbers are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let enabled = lookup(ENABLED_VAR).unwrap_or_else(|| DEFAULT_ENABLED.to_string());
        let error_rate = lookup(ERROR_RATE_VAR).unwrap_or_else(|| DEFAULT_ERROR_RATE.to_string());
        let max_delay = lookup(DELAY_MAX_VAR).unwrap_or_else(|| DEFAULT_DELAY_MAX.to_string());

        Ok(Self {
            enabled: parse_flag(&enabled),
            error_rate: parse_rate(&error_rate)?,
            max_delay_seconds: parse_delay(&max_delay)?,
        })
    }
}

/// Renders the same `KEY=value` view operators set in the environment
impl fmt::Display for FaultConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}={}, {}={:.3}, {}={}}}",
            ENABLED_VAR,
            self.enabled,
            ERROR_RATE_VAR,
            self.error_rate,
            DELAY_MAX_VAR,
            self.max_delay_seconds
        )
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn parse_rate(raw: &str) -> Result<f64> {
    let rate: f64 = raw.trim().parse().map_err(|e: std::num::ParseFloatError| {
        ChaosError::InvalidConfig {
            name: ERROR_RATE_VAR,
            value: raw.to_string(),
            reason: e.to_string(),
        }
    })?;

    if !rate.is_finite() {
        return Err(ChaosError::InvalidConfig {
            name: ERROR_RATE_VAR,
            value: raw.to_string(),
            reason: "rate must be a finite number".to_string(),
        });
    }

    Ok(rate)
}

fn parse_delay(raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ChaosError::InvalidConfig {
            name: DELAY_MAX_VAR,
            value: raw.to_string(),
            reason: e.to_string(),
        })
}
