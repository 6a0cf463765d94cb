//! # Teleop port implementations

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;
use std::time::Duration;

use msgs_if::{
    codes::BinCode,
    geom::{BinCmd, DriveCmd},
    net::{zmq, NetError, Publisher, ServiceClient, SocketTimeouts},
    svc::{BinStateResponse, DiggingGoal, DurationResponse},
};

use crate::params::ExcExecParams;
use crate::ports::{PortError, TaskHandle, TeleopPorts};

use super::task::{RemoteTaskHandle, TaskClient};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Production implementation of the teleop ports over the network.
pub struct TeleopSvcPorts {
    /// Context kept so a fresh task client can be connected per dig.
    ctx: zmq::Context,

    digging_task_endpoint: String,

    duration_svc: ServiceClient,
    bin_state_svc: ServiceClient,

    drive_pub: Publisher,
    bin_pub: Publisher,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TeleopSvcPorts {
    /// Connect all teleop ports as configured in the exec parameters.
    pub fn new(ctx: &zmq::Context, params: &ExcExecParams) -> Result<Self, NetError> {
        Ok(Self {
            ctx: ctx.clone(),
            digging_task_endpoint: params.digging_task_endpoint.clone(),
            duration_svc: ServiceClient::connect(
                ctx,
                &params.digging_time_endpoint,
                SocketTimeouts::default(),
            )?,
            bin_state_svc: ServiceClient::connect(
                ctx,
                &params.bin_state_endpoint,
                SocketTimeouts::default(),
            )?,
            drive_pub: Publisher::bind(ctx, &params.drive_pub_endpoint)?,
            bin_pub: Publisher::bind(ctx, &params.bin_pub_endpoint)?,
        })
    }
}

impl TeleopPorts for TeleopSvcPorts {
    fn digging_duration(&mut self) -> Result<Duration, PortError> {
        let response: DurationResponse = self
            .duration_svc
            .call(&())
            .map_err(|e| PortError::ServiceUnreachable("digging time", e))?;

        duration_from_wire(response.duration_s)
    }

    fn bin_state(&mut self) -> Result<BinCode, PortError> {
        let response: BinStateResponse = self
            .bin_state_svc
            .call(&())
            .map_err(|e| PortError::ServiceUnreachable("bin state", e))?;

        Ok(response.code)
    }

    fn start_digging(&mut self, duration: Duration) -> Result<Box<dyn TaskHandle>, PortError> {
        // A fresh client per dig so the handle owns its own socket
        let client = TaskClient::connect(
            &self.ctx,
            &self.digging_task_endpoint,
            "digging",
            SocketTimeouts::default(),
        )
        .map_err(|e| PortError::ServiceUnreachable("digging", e))?;

        client.start(&DiggingGoal {
            duration_s: duration.as_secs_f64(),
        })?;

        Ok(Box::new(RemoteTaskHandle::new(client)))
    }

    fn publish_drive(&mut self, cmd: DriveCmd) {
        if let Err(e) = self.drive_pub.publish(&cmd) {
            warn!("Teleop: could not publish drive command: {}", e);
        }
    }

    fn publish_bin(&mut self, cmd: BinCmd) {
        if let Err(e) = self.bin_pub.publish(&cmd) {
            warn!("Teleop: could not publish bin command: {}", e);
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert a wire duration into a [`Duration`], failing as a value.
///
/// The wire value is untrusted: negative, non-finite, or out-of-range
/// seconds are a port error, never a panic.
fn duration_from_wire(duration_s: f64) -> Result<Duration, PortError> {
    Duration::try_from_secs_f64(duration_s).map_err(|_| PortError::InvalidDuration(duration_s))
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_wire_durations_convert() {
        assert_eq!(duration_from_wire(5.0).unwrap(), Duration::from_secs(5));
        assert_eq!(duration_from_wire(0.0).unwrap(), Duration::from_secs(0));
    }

    #[test]
    fn unusable_wire_durations_are_errors_not_panics() {
        for &bad in &[1e308, -1.0, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(duration_from_wire(bad), Err(PortError::InvalidDuration(_))),
                "expected an error for {}",
                bad
            );
        }
    }
}
