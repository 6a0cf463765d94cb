//! # Teleoperation commands
//!
//! The discrete command codes accepted by the teleop executive. Each code maps
//! to one dispatch cycle which terminates in succeeded, preempted, or aborted.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use structopt::StructOpt;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command that can be issued to the teleop executive.
///
/// Sign conventions for the drive commands follow the right hand rule about
/// the rover's Z+ (upwards) axis: left turns are positive angular rates,
/// right turns negative.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, StructOpt)]
#[repr(u8)]
pub enum TeleopCode {
    /// Bring the drivebase to a full stop.
    #[structopt(name = "stop")]
    StopDrive,

    /// Stop the turntable. Placeholder until manual turntable control is
    /// integrated.
    #[structopt(name = "stop-turntable")]
    StopTurntable,

    /// Drive forwards at the configured maximum linear velocity.
    #[structopt(name = "forward")]
    Forward,

    /// Drive backwards at the configured maximum linear velocity.
    #[structopt(name = "backward")]
    Backward,

    /// Turn left at the configured maximum angular velocity.
    #[structopt(name = "left")]
    Left,

    /// Turn right at the configured maximum angular velocity.
    #[structopt(name = "right")]
    Right,

    /// Spin clockwise on the spot.
    #[structopt(name = "cw")]
    Clockwise,

    /// Spin counterclockwise on the spot.
    #[structopt(name = "ccw")]
    Counterclockwise,

    /// Excavate for a duration determined by the digging time service.
    #[structopt(name = "dig")]
    Dig,

    /// Raise the dumping bin until the control system confirms it is raised.
    #[structopt(name = "dump")]
    Dump,

    /// Lower the dumping bin until the control system confirms it is lowered.
    #[structopt(name = "reset-dumping")]
    ResetDumping,

    /// Return the mechanisms to their starting configuration. Placeholder,
    /// currently equivalent to a drivebase stop.
    #[structopt(name = "reset-starting")]
    ResetStarting,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A goal carrying a single teleop command code.
///
/// The code is carried as its raw wire value so that an out-of-range code
/// reaches the dispatcher, which aborts the cycle rather than failing to
/// parse the goal.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct TeleopGoal {
    pub code: u8,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TeleopCode {
    /// The raw wire value of this code.
    pub fn as_code(self) -> u8 {
        self as u8
    }

    /// Parse a raw wire value, `None` if the value is not a recognized
    /// command.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(TeleopCode::StopDrive),
            1 => Some(TeleopCode::StopTurntable),
            2 => Some(TeleopCode::Forward),
            3 => Some(TeleopCode::Backward),
            4 => Some(TeleopCode::Left),
            5 => Some(TeleopCode::Right),
            6 => Some(TeleopCode::Clockwise),
            7 => Some(TeleopCode::Counterclockwise),
            8 => Some(TeleopCode::Dig),
            9 => Some(TeleopCode::Dump),
            10 => Some(TeleopCode::ResetDumping),
            11 => Some(TeleopCode::ResetStarting),
            _ => None,
        }
    }
}

impl TeleopGoal {
    pub fn new(code: TeleopCode) -> Self {
        Self {
            code: code.as_code(),
        }
    }
}
