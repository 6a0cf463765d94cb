//! # Geometric message types

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A position and attitude in some unnamed frame.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// The position in meters.
    pub position_m: Vector3<f64>,

    /// The attitude as a quaternion rotating the parent frame into the body
    /// frame.
    pub attitude_q: UnitQuaternion<f64>,
}

/// A [`Pose`] qualified with the frame it is expressed in and the time it was
/// produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseStamped {
    pub pose: Pose,

    /// Name of the frame the pose is expressed in.
    pub frame_id: String,

    /// The time at which the pose was produced.
    pub stamp: DateTime<Utc>,
}

/// A velocity demand for the drivebase.
///
/// Downstream consumers are stateless latest-value receivers, a new command
/// simply replaces the previous one.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriveCmd {
    /// Linear velocity along the rover's X+ (forwards) axis in meters/second.
    pub linear_ms: f64,

    /// Angular velocity about the rover's Z+ (upwards) axis in radians/second.
    pub angular_rads: f64,
}

/// A position demand for the bin joint controller.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinCmd {
    /// The demanded bin joint angle in radians.
    pub angle_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Pose {
    /// The identity pose: at the origin with no rotation.
    pub fn identity() -> Self {
        Self {
            position_m: Vector3::zeros(),
            attitude_q: UnitQuaternion::identity(),
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl DriveCmd {
    /// An all-zero command, bringing the drivebase to a stop.
    pub fn stop() -> Self {
        Self {
            linear_ms: 0.0,
            angular_rads: 0.0,
        }
    }
}
