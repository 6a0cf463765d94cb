//! # Service and subordinate task wire definitions
//!
//! Remote calls are JSON request/response exchanges over REQ/REP sockets.
//! Subordinate tasks (digging, marker detection) are driven through the
//! generic [`TaskRequest`]/[`TaskResponse`] protocol: a `Start` carrying the
//! goal, then `Status` polls until the task reports done, with `Cancel`
//! available at any point.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::codes::BinCode;
use crate::geom::PoseStamped;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The terminal outcome of one goal cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalOutcome {
    /// The goal ran to completion.
    Succeeded,

    /// The goal was cancelled at a cooperative check point.
    Preempted,

    /// The goal could not be completed.
    Aborted,
}

/// Format of an image payload.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

/// Response from the frame service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TransformResponse {
    /// The pose expressed in the requested frame.
    Transformed(PoseStamped),

    /// The transform could not be computed.
    Failed(String),
}

/// Response from the localized point store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocalizePointResponse {
    /// The point was committed.
    Accepted,

    /// The store rejected the point.
    Rejected,
}

/// A request sent to a subordinate task server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TaskRequest<G> {
    /// Start the task with the given goal.
    Start(G),

    /// Query the state of the running task.
    Status,

    /// Cancel the running task.
    Cancel,
}

/// A response from a subordinate task server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TaskResponse<R> {
    /// The start or cancel request was accepted.
    Accepted,

    /// The request was rejected (e.g. a start while a task is active).
    Rejected,

    /// The task is still running.
    Running,

    /// The task finished with the given result.
    Done(R),

    /// The task was cancelled before completing.
    Cancelled,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Response from the digging time service.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct DurationResponse {
    /// The duration in seconds.
    pub duration_s: f64,
}

/// Response from the bin state service.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct BinStateResponse {
    pub code: BinCode,
}

/// Intrinsics and metadata for the camera an image was captured with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraInfo {
    pub width_px: u32,
    pub height_px: u32,

    /// The 3x3 intrinsic matrix in row-major order.
    pub intrinsics_k: [f64; 9],

    /// Distortion coefficients.
    pub distortion_d: Vec<f64>,

    /// The optical frame the camera reports poses in.
    pub frame_id: String,
}

/// An image with the metadata of the camera that captured it, as returned by
/// the image capture service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraImage {
    pub format: ImageFormat,

    /// The encoded image, base64 over the wire.
    pub data_b64: String,

    pub camera_info: CameraInfo,
}

/// Request to the frame service to re-express a pose in another frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformRequest {
    pub pose: PoseStamped,

    /// The frame to express the pose in.
    pub to_frame: String,
}

/// Request to commit a localized point to the external store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalizePointRequest {
    pub pose: PoseStamped,
}

/// Goal for the digging subordinate task.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct DiggingGoal {
    /// How long to excavate for, in seconds.
    pub duration_s: f64,
}

/// Goal for the marker detection subordinate task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerGoal {
    pub image: CameraImage,
}

/// Result of the marker detection subordinate task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerDetection {
    /// How many markers were found in the image.
    pub number_found: u32,

    /// The pose of the detected feature relative to the camera. Only
    /// meaningful when `number_found` is non-zero.
    pub relative_pose: PoseStamped,
}

/// The empty trigger goal for the localization executive.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct LocalizeGoal;

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CameraImage {
    /// Decode the base64 image payload into raw bytes.
    pub fn image_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::decode(&self.data_b64)
    }
}

impl<R> TaskResponse<R> {
    /// True if the response indicates the task has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskResponse::Done(_) | TaskResponse::Cancelled)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_image(data_b64: String) -> CameraImage {
        CameraImage {
            format: ImageFormat::Png,
            data_b64,
            camera_info: CameraInfo {
                width_px: 640,
                height_px: 480,
                intrinsics_k: [0.0; 9],
                distortion_d: vec![],
                frame_id: "rear_cam_optical".into(),
            },
        }
    }

    #[test]
    fn image_bytes_decodes_the_payload() {
        let raw = [0x89u8, 0x50, 0x4e, 0x47];
        let image = test_image(base64::encode(raw));

        assert_eq!(image.image_bytes().unwrap(), raw.to_vec());
    }

    #[test]
    fn image_bytes_rejects_a_corrupt_payload() {
        let image = test_image("not base64 at all!".into());

        assert!(image.image_bytes().is_err());
    }
}
