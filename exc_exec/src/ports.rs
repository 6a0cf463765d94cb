//! # Capability ports
//!
//! The executives never talk to the network directly. Every remote call,
//! subordinate task, and output channel they need is expressed as a port on
//! one of the traits in this module, so the dispatch and retry logic can be
//! exercised against fakes. The production implementations live in
//! [`crate::clients`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use msgs_if::{
    codes::BinCode,
    geom::{BinCmd, DriveCmd, PoseStamped},
    net::NetError,
    svc::{CameraImage, MarkerDetection},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A cooperative cancellation token.
///
/// Preemption is polled, not interrupted: a request to cancel is only honored
/// at an executive's designated check points. Clones share the same underlying
/// flag, so one copy can be handed to the goal reception thread and another
/// polled inside the dispatch loop.
#[derive(Debug, Clone, Default)]
pub struct Preempt(Arc<AtomicBool>);

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors surfaced by port implementations.
///
/// All port failures are values, never panics. Whether a failure is
/// transient-retryable or fatal to the current cycle is decided by the
/// executive, not by the port.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("The {0} service could not be reached: {1}")]
    ServiceUnreachable(&'static str, NetError),

    #[error("The {0} task rejected the start request")]
    TaskStartRejected(&'static str),

    #[error("The digging time service returned an unusable duration: {0} s")]
    InvalidDuration(f64),

    #[error("The {0} task was cancelled before completing")]
    TaskCancelled(&'static str),

    #[error("The frame service could not compute the transform: {0}")]
    TransformFailed(String),

    #[error("The localized point was rejected by the store")]
    CommitRejected,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A handle on a running subordinate task.
pub trait TaskHandle {
    /// True once the task has reached a terminal state.
    fn is_done(&mut self) -> bool;

    /// Actively cancel the task. The cancel is forwarded to the hosting
    /// component, not merely abandoned on our side.
    fn cancel(&mut self);
}

/// Ports required by the teleop executive.
pub trait TeleopPorts {
    /// Blocking lookup of the digging duration from the timing service.
    fn digging_duration(&mut self) -> Result<Duration, PortError>;

    /// Poll the current bin state from the control system.
    fn bin_state(&mut self) -> Result<BinCode, PortError>;

    /// Start the digging subordinate task, returning a handle to await or
    /// cancel it.
    fn start_digging(&mut self, duration: Duration) -> Result<Box<dyn TaskHandle>, PortError>;

    /// Publish a drivebase velocity demand. Fire-and-forget.
    fn publish_drive(&mut self, cmd: DriveCmd);

    /// Publish a bin position demand. Fire-and-forget.
    fn publish_bin(&mut self, cmd: BinCmd);
}

/// Ports required by the localization coordinator.
pub trait LocPorts {
    /// Blocking capture of an image with its camera metadata.
    fn capture_image(&mut self) -> Result<CameraImage, PortError>;

    /// Run the marker detection subordinate task on the image, blocking for
    /// its result.
    fn detect_markers(&mut self, image: CameraImage) -> Result<MarkerDetection, PortError>;

    /// Re-express a pose in the given frame via the frame service.
    fn transform(&mut self, pose: &PoseStamped, to_frame: &str) -> Result<PoseStamped, PortError>;

    /// Commit a localized point to the external store.
    fn commit_point(&mut self, pose: &PoseStamped) -> Result<(), PortError>;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Preempt {
    /// Create a new token with no preemption requested.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Request that the current goal be cancelled at its next check point.
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// True if preemption has been requested.
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Reset the token before accepting a new goal.
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
