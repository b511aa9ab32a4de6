//! World configuration.

use crate::{LogLevel, Result, SimError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Settings a world is created with.
///
/// | Field               | Default | Meaning                                  |
/// |---------------------|---------|------------------------------------------|
/// | `physics_timestep`  | 0.01 s  | Length of one `step_physics` increment   |
/// | `log_level`         | `Info`  | Initial threshold of the world's logger  |
/// | `max_saved_states`  | `None`  | Depth bound of the state stack           |
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WorldConfig {
    /// Seconds advanced per physics step.
    pub physics_timestep: f64,
    /// Initial logger threshold.
    pub log_level: LogLevel,
    /// Oldest snapshots are dropped beyond this depth; `None` keeps all.
    pub max_saved_states: Option<usize>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self::with_timestep(0.01)
    }
}

impl WorldConfig {
    /// Default settings with a different timestep.
    #[must_use]
    pub fn with_timestep(physics_timestep: f64) -> Self {
        Self {
            physics_timestep,
            log_level: LogLevel::Info,
            max_saved_states: None,
        }
    }

    /// 60 Hz stepping, for interactive use.
    #[must_use]
    pub fn realtime() -> Self {
        Self::with_timestep(1.0 / 60.0)
    }

    /// 1 kHz stepping.
    #[must_use]
    pub fn high_fidelity() -> Self {
        Self::with_timestep(1.0 / 1000.0)
    }

    /// Set the initial logger threshold.
    #[must_use]
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Bound the state stack to `depth` snapshots.
    #[must_use]
    pub fn max_saved_states(mut self, depth: usize) -> Self {
        self.max_saved_states = Some(depth);
        self
    }

    /// Check the settings before a world is built from them.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidTimestep`] for a non-positive or non-finite
    /// timestep, [`SimError::InvalidConfig`] for a timestep above one second
    /// or a zero stack bound.
    pub fn validate(&self) -> Result<()> {
        let dt = self.physics_timestep;
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SimError::InvalidTimestep(dt));
        }
        if dt > 1.0 {
            return Err(SimError::invalid_config(format!(
                "physics timestep of {dt} s exceeds one second"
            )));
        }
        if self.max_saved_states == Some(0) {
            return Err(SimError::invalid_config("max_saved_states must be at least 1"));
        }
        Ok(())
    }

    /// Steps per second.
    #[must_use]
    pub fn frequency(&self) -> f64 {
        self.physics_timestep.recip()
    }
}
