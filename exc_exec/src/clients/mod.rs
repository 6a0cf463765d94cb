//! # Production port implementations
//!
//! These wire the capability ports up to the real services over the network.
//! Remote calls go through JSON REQ/REP service clients, subordinate tasks
//! through the generic task protocol, and the output channels through PUB
//! publishers.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod loc_ports;
mod task;
mod teleop_ports;

pub use loc_ports::LocSvcPorts;
pub use task::{RemoteTaskHandle, TaskClient};
pub use teleop_ports::TeleopSvcPorts;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Period between status polls when blocking on a subordinate task.
pub(crate) const TASK_STATUS_POLL_PERIOD: std::time::Duration =
    std::time::Duration::from_millis(100);
