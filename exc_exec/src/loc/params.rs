//! # Localization coordinator parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;
use serde::Deserialize;

use super::LocError;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the localization coordinator.
///
/// Loaded once at startup and read-only thereafter.
#[derive(Debug, Clone, Deserialize)]
pub struct LocParams {
    /// The frame detected marker poses are transformed into before the
    /// correction is applied.
    #[serde(default = "default_base_frame")]
    pub base_frame: String,

    /// The frame the committed localized point is stamped with.
    #[serde(default = "default_dest_frame")]
    pub dest_frame: String,

    /// Componentwise sign correction applied to the transformed position to
    /// compensate for the detector's frame convention. Each entry must be
    /// +1.0 or -1.0.
    #[serde(default = "default_detector_correction")]
    pub detector_correction: [f64; 3],

    /// How fast to turn while searching for markers [rad/s].
    #[serde(default)]
    pub turn_speed_rads: f64,

    /// How long to turn for while searching for markers [s].
    #[serde(default)]
    pub turn_duration_s: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LocParams {
    /// Check the parameters are usable.
    ///
    /// The turn parameters defaulting to zero is legal but almost certainly a
    /// configuration oversight, so it is warned about rather than rejected.
    pub fn validate(&self) -> Result<(), LocError> {
        for c in self.detector_correction.iter() {
            if *c != 1.0 && *c != -1.0 {
                return Err(LocError::InvalidCorrection(self.detector_correction));
            }
        }

        if self.turn_speed_rads == 0.0 || self.turn_duration_s == 0.0 {
            warn!("Localization: uninitialized turn parameters");
        }

        Ok(())
    }
}

impl Default for LocParams {
    fn default() -> Self {
        Self {
            base_frame: default_base_frame(),
            dest_frame: default_dest_frame(),
            detector_correction: default_detector_correction(),
            turn_speed_rads: 0.0,
            turn_duration_s: 0.0,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_base_frame() -> String {
    "base_footprint".into()
}

fn default_dest_frame() -> String {
    "odom".into()
}

fn default_detector_correction() -> [f64; 3] {
    [1.0, -1.0, -1.0]
}
