//! # Localization port implementations

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use msgs_if::{
    geom::PoseStamped,
    net::{zmq, NetError, ServiceClient, SocketTimeouts},
    svc::{
        CameraImage, LocalizePointRequest, LocalizePointResponse, MarkerDetection, MarkerGoal,
        TransformRequest, TransformResponse,
    },
};

use crate::params::ExcExecParams;
use crate::ports::{LocPorts, PortError};

use super::task::TaskClient;
use super::TASK_STATUS_POLL_PERIOD;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Receive timeout for the image capture service. Image payloads are large,
/// give them longer than the default.
const IMAGE_RECV_TIMEOUT_MS: i32 = 5000;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Production implementation of the localization ports over the network.
pub struct LocSvcPorts {
    image_svc: ServiceClient,
    transform_svc: ServiceClient,
    localize_svc: ServiceClient,
    marker_task: TaskClient,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LocSvcPorts {
    /// Connect all localization ports as configured in the exec parameters.
    pub fn new(ctx: &zmq::Context, params: &ExcExecParams) -> Result<Self, NetError> {
        Ok(Self {
            image_svc: ServiceClient::connect(
                ctx,
                &params.image_endpoint,
                SocketTimeouts {
                    recv_ms: IMAGE_RECV_TIMEOUT_MS,
                    ..SocketTimeouts::default()
                },
            )?,
            transform_svc: ServiceClient::connect(
                ctx,
                &params.transform_endpoint,
                SocketTimeouts::default(),
            )?,
            localize_svc: ServiceClient::connect(
                ctx,
                &params.localize_point_endpoint,
                SocketTimeouts::default(),
            )?,
            marker_task: TaskClient::connect(
                ctx,
                &params.marker_task_endpoint,
                "marker detection",
                SocketTimeouts::default(),
            )?,
        })
    }
}

impl LocPorts for LocSvcPorts {
    fn capture_image(&mut self) -> Result<CameraImage, PortError> {
        self.image_svc
            .call(&())
            .map_err(|e| PortError::ServiceUnreachable("image capture", e))
    }

    fn detect_markers(&mut self, image: CameraImage) -> Result<MarkerDetection, PortError> {
        self.marker_task
            .run_blocking(&MarkerGoal { image }, TASK_STATUS_POLL_PERIOD)
    }

    fn transform(&mut self, pose: &PoseStamped, to_frame: &str) -> Result<PoseStamped, PortError> {
        let response: TransformResponse = self
            .transform_svc
            .call(&TransformRequest {
                pose: pose.clone(),
                to_frame: to_frame.into(),
            })
            .map_err(|e| PortError::ServiceUnreachable("frame", e))?;

        match response {
            TransformResponse::Transformed(p) => Ok(p),
            TransformResponse::Failed(reason) => Err(PortError::TransformFailed(reason)),
        }
    }

    fn commit_point(&mut self, pose: &PoseStamped) -> Result<(), PortError> {
        let response: LocalizePointResponse = self
            .localize_svc
            .call(&LocalizePointRequest { pose: pose.clone() })
            .map_err(|e| PortError::ServiceUnreachable("localize point", e))?;

        match response {
            LocalizePointResponse::Accepted => Ok(()),
            LocalizePointResponse::Rejected => Err(PortError::CommitRejected),
        }
    }
}
