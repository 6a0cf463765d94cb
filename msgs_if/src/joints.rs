//! # Joint angle constants
//!
//! These mirror the joint limits loaded by the control system at startup. Only
//! the bin joint is needed by the executives.

/// The bin joint angle when fully lowered, in radians.
pub const BIN_LOWERED_RAD: f64 = 0.0;

/// The bin joint angle when fully raised, in radians.
pub const BIN_RAISED_RAD: f64 = 0.785;
