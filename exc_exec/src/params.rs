//! Executive-level parameters: the network endpoints of every service, task
//! server, and output channel the executives touch.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Endpoint map for the excavation executives.
#[derive(Debug, Clone, Deserialize)]
pub struct ExcExecParams {
    /// Endpoint the teleop goal server binds to.
    pub teleop_goal_endpoint: String,

    /// Endpoint the localization goal server binds to.
    pub loc_goal_endpoint: String,

    /// Digging time lookup service.
    pub digging_time_endpoint: String,

    /// Bin state query service.
    pub bin_state_endpoint: String,

    /// Image capture service.
    pub image_endpoint: String,

    /// Frame transform service.
    pub transform_endpoint: String,

    /// Localized point commit service.
    pub localize_point_endpoint: String,

    /// Digging subsystem task server.
    pub digging_task_endpoint: String,

    /// Marker detection task server.
    pub marker_task_endpoint: String,

    /// Drive command output channel.
    pub drive_pub_endpoint: String,

    /// Bin command output channel.
    pub bin_pub_endpoint: String,
}
