//! # Navigation goal synthesis
//!
//! Converts a symbolic destination into a concrete goal pose using the
//! geometric constraints of the field. Pure and deterministic: the same
//! location code against the same constraints always yields the same goal.
//!
//! The field layout is one-dimensional along the reference frame's X+ axis,
//! with the collection bin at the origin, the finish line at the finish line
//! distance, and the mining area beyond the safe mining distance.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use msgs_if::{codes::LocationCode, geom::Pose};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Immutable geometric constraints for the goal selection algorithm.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct GeometryConstraints {
    /// The distance from the bin beyond which it is safe to mine, in meters.
    pub safe_mining_distance_m: f64,

    /// The distance from the bin to the finish line, in meters.
    pub finish_line_m: f64,
}

/// Synthesizes navigation goals for symbolic destinations.
pub struct NavGoalManager {
    /// The frame goals are expressed in.
    ref_frame: String,

    /// The constraints of the problem.
    constraints: GeometryConstraints,
}

/// A concrete navigation goal: a pose in a named reference frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavGoal {
    pub pose: Pose,
    pub frame_id: String,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum NavError {
    #[error("No goal can be synthesized for location {0:?}")]
    UnsupportedLocation(LocationCode),

    #[error("Geometry constraints must be positive distances, got {0:?}")]
    InvalidConstraints(GeometryConstraints),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl GeometryConstraints {
    /// Check the constraints describe a usable field.
    pub fn validate(&self) -> Result<(), NavError> {
        if self.safe_mining_distance_m <= 0.0 || self.finish_line_m <= 0.0 {
            return Err(NavError::InvalidConstraints(*self));
        }
        Ok(())
    }
}

impl NavGoalManager {
    /// Create a new goal manager for the given reference frame.
    pub fn new(ref_frame: &str, constraints: GeometryConstraints) -> Result<Self, NavError> {
        constraints.validate()?;
        Ok(Self {
            ref_frame: ref_frame.into(),
            constraints,
        })
    }

    /// Synthesize the goal pose for a symbolic destination.
    ///
    /// An unsupported location code is an explicit error, never a default
    /// pose.
    pub fn goal_for(&self, location: LocationCode) -> Result<NavGoal, NavError> {
        let (x_m, yaw_rad) = match location {
            LocationCode::Start => (0.0, 0.0),
            LocationCode::FinishLine => (self.constraints.finish_line_m, 0.0),
            LocationCode::MiningSite => (self.constraints.safe_mining_distance_m, 0.0),
            // Dumping approaches are made in reverse, facing away from the
            // bin, from just inside the finish line
            LocationCode::Bin => (self.constraints.finish_line_m, PI),
            LocationCode::Unset => return Err(NavError::UnsupportedLocation(location)),
        };

        Ok(NavGoal {
            pose: Pose {
                position_m: Vector3::new(x_m, 0.0, 0.0),
                attitude_q: UnitQuaternion::from_euler_angles(0.0, 0.0, yaw_rad),
            },
            frame_id: self.ref_frame.clone(),
        })
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_constraints() -> GeometryConstraints {
        GeometryConstraints {
            safe_mining_distance_m: 4.5,
            finish_line_m: 1.5,
        }
    }

    #[test]
    fn goal_synthesis_is_deterministic() {
        let mgr = NavGoalManager::new("odom", test_constraints()).unwrap();

        for &location in &[
            LocationCode::Start,
            LocationCode::FinishLine,
            LocationCode::MiningSite,
            LocationCode::Bin,
        ] {
            let first = mgr.goal_for(location).unwrap();
            let second = mgr.goal_for(location).unwrap();
            assert_eq!(first, second, "non-deterministic goal for {:?}", location);
        }
    }

    #[test]
    fn goals_respect_the_constraints() {
        let mgr = NavGoalManager::new("odom", test_constraints()).unwrap();

        let mining = mgr.goal_for(LocationCode::MiningSite).unwrap();
        assert_eq!(mining.pose.position_m.x, 4.5);
        assert_eq!(mining.frame_id, "odom");

        let finish = mgr.goal_for(LocationCode::FinishLine).unwrap();
        assert_eq!(finish.pose.position_m.x, 1.5);

        let start = mgr.goal_for(LocationCode::Start).unwrap();
        assert_eq!(start.pose.position_m.x, 0.0);

        // The bin approach faces back towards the start
        let bin = mgr.goal_for(LocationCode::Bin).unwrap();
        assert_eq!(bin.pose.position_m.x, 1.5);
        let yaw = bin.pose.attitude_q.euler_angles().2;
        assert!((yaw.abs() - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn unset_location_is_an_explicit_error() {
        let mgr = NavGoalManager::new("odom", test_constraints()).unwrap();
        assert!(matches!(
            mgr.goal_for(LocationCode::Unset),
            Err(NavError::UnsupportedLocation(LocationCode::Unset))
        ));
    }

    #[test]
    fn non_positive_constraints_are_rejected() {
        let constraints = GeometryConstraints {
            safe_mining_distance_m: -1.0,
            finish_line_m: 1.5,
        };
        assert!(matches!(
            NavGoalManager::new("odom", constraints),
            Err(NavError::InvalidConstraints(_))
        ));
    }
}
