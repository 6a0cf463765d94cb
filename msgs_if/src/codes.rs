//! # Shared symbolic codes

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The state of the dumping bin as reported by the control system.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinCode {
    /// The bin is fully lowered.
    Lowered,

    /// The bin is fully raised.
    Raised,

    /// The bin is between the lowered and raised positions.
    Transit,
}

/// Symbolic destinations on the field, input to navigation goal synthesis.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationCode {
    /// No destination set. Not a valid goal synthesis target.
    Unset,

    /// The starting position of the rover.
    Start,

    /// The finish line between the obstacle field and the mining area.
    FinishLine,

    /// The mining area, beyond the safe mining distance.
    MiningSite,

    /// The collection bin, approached in reverse for dumping.
    Bin,
}
