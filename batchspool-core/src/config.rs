//! Accumulation-cycle configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for one accumulation cycle.
///
/// The engine snapshots the current configuration at the start of every cycle;
/// reconfiguring mid-cycle only affects the next cycle (see
/// [`ConfigUpdate`]).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Silence gap after the most recent event before the cycle releases.
    /// Zero means "release as soon as the first event is observed".
    pub inactivity_delay: Duration,

    /// Pending-event count at which the cycle releases immediately.
    pub count_threshold: usize,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            inactivity_delay: Duration::from_secs(5),
            count_threshold: 100,
        }
    }
}

impl CycleConfig {
    /// Creates a validated configuration.
    pub fn new(inactivity_delay: Duration, count_threshold: usize) -> Result<Self, ConfigError> {
        if count_threshold == 0 {
            return Err(ConfigError::ZeroCountThreshold);
        }
        Ok(Self {
            inactivity_delay,
            count_threshold,
        })
    }

    /// Merges a partial update into a copy of this configuration.
    ///
    /// Returns an error (leaving `self` untouched) if the merged result would
    /// be invalid.
    pub fn merged(&self, update: &ConfigUpdate) -> Result<Self, ConfigError> {
        let merged = Self {
            inactivity_delay: update.inactivity_delay.unwrap_or(self.inactivity_delay),
            count_threshold: update.count_threshold.unwrap_or(self.count_threshold),
        };
        if merged.count_threshold == 0 {
            return Err(ConfigError::ZeroCountThreshold);
        }
        Ok(merged)
    }
}

/// Partial reconfiguration applied to the *next* accumulation cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    pub inactivity_delay: Option<Duration>,
    pub count_threshold: Option<usize>,
}

impl ConfigUpdate {
    /// Update that only changes the inactivity delay.
    pub fn delay(delay: Duration) -> Self {
        Self {
            inactivity_delay: Some(delay),
            ..Self::default()
        }
    }

    /// Update that only changes the count threshold.
    pub fn threshold(count_threshold: usize) -> Self {
        Self {
            count_threshold: Some(count_threshold),
            ..Self::default()
        }
    }
}
