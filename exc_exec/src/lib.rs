//! # Excavation executive library.
//!
//! This library hosts the task executive of the excavation rover: the teleop
//! command dispatcher, the localization coordinator, and the navigation goal
//! synthesizer, along with the capability ports they are wired through.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Capability ports - the injected interfaces to remote services, subordinate
/// tasks, and output channels, plus the preemption token
pub mod ports;

/// Teleop executive - dispatches discrete operator commands
pub mod teleop;

/// Localization coordinator - marker-based pose acquisition retry loop
pub mod loc;

/// Navigation goal synthesizer - symbolic destination to concrete goal pose
pub mod nav;

/// Production port implementations over the network
pub mod clients;

/// Goal serving loop shared by the executive binaries
pub mod serve;

/// Executive-level parameters
pub mod params;
