//! # Messages interface crate.
//!
//! Provides the common message, service, and task definitions exchanged
//! between the executives and their subordinate services.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Teleoperation command codes and goals
pub mod teleop;

/// Shared symbolic codes (bin state, locations)
pub mod codes;

/// Joint angle constants shared with the control system
pub mod joints;

/// Geometric message types (poses, drive and bin commands)
pub mod geom;

/// Service and subordinate task wire definitions
pub mod svc;

/// Network module
pub mod net;
