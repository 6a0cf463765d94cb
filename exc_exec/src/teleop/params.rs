//! # Teleop executive parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use std::time::Duration;

use super::TeleopError;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the teleop executive.
///
/// Loaded once at startup and read-only thereafter.
#[derive(Debug, Clone, Deserialize)]
pub struct TeleopParams {
    /// The maximum linear velocity in meters/second.
    #[serde(default = "default_max_linear_ms")]
    pub max_linear_ms: f64,

    /// The maximum angular velocity in radians/second.
    #[serde(default = "default_max_angular_rads")]
    pub max_angular_rads: f64,

    /// The rate in Hz at which long-running commands check for completion and
    /// preemption.
    #[serde(default = "default_poll_hz")]
    pub poll_hz: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TeleopParams {
    /// Check the parameters are usable.
    pub fn validate(&self) -> Result<(), TeleopError> {
        if self.poll_hz <= 0.0 || !self.poll_hz.is_finite() {
            return Err(TeleopError::InvalidPollRate(self.poll_hz));
        }
        Ok(())
    }

    /// The period between preemption checks.
    pub fn poll_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.poll_hz)
    }
}

impl Default for TeleopParams {
    fn default() -> Self {
        Self {
            max_linear_ms: default_max_linear_ms(),
            max_angular_rads: default_max_angular_rads(),
            poll_hz: default_poll_hz(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_max_linear_ms() -> f64 {
    0.25
}

fn default_max_angular_rads() -> f64 {
    0.1
}

fn default_poll_hz() -> f64 {
    10.0
}
