//! Simulation configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a simulated network.
///
/// Can be deserialized from a config file or built programmatically (e.g. for
/// tests) via [`SimConfig::with_breaker`] / [`SimConfig::disabled`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimConfig {
    /// Metastability-breaking threshold. Zero disables the breaker, leaving
    /// the plain heaviest-branch rule.
    #[serde(default)]
    pub breaker_threshold: Duration,

    /// Pause between per-voter scheduler ticks.
    #[serde(default = "default_tick_interval")]
    pub tick_interval: Duration,

    /// How far ahead the simulating attacker evaluates the rule when probing
    /// whether its next vote would trip the breaker.
    #[serde(default = "default_attacker_lookahead")]
    pub attacker_lookahead: Duration,
}

fn default_tick_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_attacker_lookahead() -> Duration {
    Duration::from_millis(100)
}

impl SimConfig {
    /// Config with the breaker set to `threshold` and default timings.
    pub fn with_breaker(threshold: Duration) -> Self {
        Self {
            breaker_threshold: threshold,
            ..Self::default()
        }
    }

    /// Config with the breaker disabled.
    pub fn disabled() -> Self {
        Self::with_breaker(Duration::ZERO)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            breaker_threshold: Duration::ZERO,
            tick_interval: default_tick_interval(),
            attacker_lookahead: default_attacker_lookahead(),
        }
    }
}
