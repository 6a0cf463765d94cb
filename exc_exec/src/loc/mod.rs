//! # Localization coordinator
//!
//! The coordinator repeatedly attempts to localize the collection bin from
//! camera images until a localized point is committed or preemption is
//! requested. Every failure inside an attempt is transient: the attempt is
//! discarded and a fresh one started, with no retry cap and no backoff. The
//! only way out of the loop is a confirmed commit or an external preemption.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
pub use params::LocParams;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::Utc;
use log::{info, warn};
use nalgebra::Vector3;

use msgs_if::geom::PoseStamped;

use crate::ports::{LocPorts, Preempt};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The localization coordinator.
pub struct Localizer<P: LocPorts> {
    /// Parameters of the coordinator, read-only after construction.
    pub params: LocParams,

    /// The capability ports the coordinator acts through.
    pub ports: P,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The terminal outcome of one localization goal.
///
/// There is no abort path: transient failures always retry.
#[derive(Debug, Clone, PartialEq)]
pub enum LocOutcome {
    /// A localized point was committed to the store.
    Succeeded(PoseStamped),

    /// The goal was cancelled at a check point before a commit.
    Preempted,
}

/// Errors that can occur constructing the localization coordinator.
#[derive(Debug, thiserror::Error)]
pub enum LocError {
    #[error("detector_correction entries must be +1.0 or -1.0, got {0:?}")]
    InvalidCorrection([f64; 3]),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<P: LocPorts> Localizer<P> {
    /// Create a new localization coordinator with the given parameters and
    /// ports.
    pub fn new(params: LocParams, ports: P) -> Result<Self, LocError> {
        params.validate()?;
        Ok(Self { params, ports })
    }

    /// Attempt to localize the target feature until success or preemption.
    pub fn localize(&mut self, preempt: &Preempt) -> LocOutcome {
        info!("Localization: starting");

        loop {
            // Preemption is only honored here, at the top of each attempt.
            // A remote call already in flight completes before this check is
            // reached again.
            if preempt.is_requested() {
                info!("Localization: preempt requested");
                return LocOutcome::Preempted;
            }

            // Grab an image
            let image = match self.ports.capture_image() {
                Ok(i) => i,
                Err(e) => {
                    warn!("Localization: could not capture an image: {}", e);
                    continue;
                }
            };

            // Run the detector on it, blocking for the result
            let detection = match self.ports.detect_markers(image) {
                Ok(d) => d,
                Err(e) => {
                    warn!("Localization: marker detection failed: {}", e);
                    continue;
                }
            };

            if detection.number_found == 0 {
                info!("Localization: no markers detected");
                continue;
            }

            // We found something, express it relative to the base
            let mut point = match self
                .ports
                .transform(&detection.relative_pose, &self.params.base_frame)
            {
                Ok(p) => p,
                Err(e) => {
                    warn!("Localization: transformation failed: {}", e);
                    continue;
                }
            };

            // Correct for the detector's frame convention, then stamp for the
            // destination frame
            point.pose.position_m = point
                .pose
                .position_m
                .component_mul(&Vector3::from(self.params.detector_correction));
            point.frame_id = self.params.dest_frame.clone();
            point.stamp = Utc::now();

            match self.ports.commit_point(&point) {
                Ok(()) => {
                    info!("Localization: success");
                    return LocOutcome::Succeeded(point);
                }
                // The computed point is discarded, the next attempt starts
                // from a fresh image
                Err(e) => warn!("Localization: could not commit the point, retrying: {}", e),
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::PortError;
    use msgs_if::{
        geom::Pose,
        net::NetError,
        svc::{CameraImage, CameraInfo, ImageFormat, MarkerDetection},
    };
    use std::collections::VecDeque;

    fn test_image() -> CameraImage {
        CameraImage {
            format: ImageFormat::Jpeg,
            data_b64: String::new(),
            camera_info: CameraInfo {
                width_px: 640,
                height_px: 480,
                intrinsics_k: [0.0; 9],
                distortion_d: vec![],
                frame_id: "rear_cam_optical".into(),
            },
        }
    }

    fn detection(number_found: u32, position: [f64; 3]) -> MarkerDetection {
        MarkerDetection {
            number_found,
            relative_pose: PoseStamped {
                pose: Pose {
                    position_m: Vector3::new(position[0], position[1], position[2]),
                    ..Pose::identity()
                },
                frame_id: "rear_cam_optical".into(),
                stamp: Utc::now(),
            },
        }
    }

    /// Fake port implementation with scripted responses.
    struct FakePorts {
        capture_failures: u32,
        detections: VecDeque<MarkerDetection>,
        transform_results: VecDeque<Result<(), PortError>>,
        commit_results: VecDeque<Result<(), PortError>>,
        capture_calls: u32,
        commit_calls: u32,
        committed: Vec<PoseStamped>,
    }

    impl FakePorts {
        fn new() -> Self {
            Self {
                capture_failures: 0,
                detections: VecDeque::new(),
                transform_results: VecDeque::new(),
                commit_results: VecDeque::new(),
                capture_calls: 0,
                commit_calls: 0,
                committed: Vec::new(),
            }
        }
    }

    impl LocPorts for FakePorts {
        fn capture_image(&mut self) -> Result<CameraImage, PortError> {
            self.capture_calls += 1;
            if self.capture_failures > 0 {
                self.capture_failures -= 1;
                return Err(PortError::ServiceUnreachable(
                    "image capture",
                    NetError::Timeout,
                ));
            }
            Ok(test_image())
        }

        fn detect_markers(&mut self, _image: CameraImage) -> Result<MarkerDetection, PortError> {
            self.detections
                .pop_front()
                .ok_or(PortError::ServiceUnreachable(
                    "marker detection",
                    NetError::Timeout,
                ))
        }

        fn transform(
            &mut self,
            pose: &PoseStamped,
            to_frame: &str,
        ) -> Result<PoseStamped, PortError> {
            match self.transform_results.pop_front().unwrap_or(Ok(())) {
                Ok(()) => Ok(PoseStamped {
                    pose: pose.pose,
                    frame_id: to_frame.into(),
                    stamp: pose.stamp,
                }),
                Err(e) => Err(e),
            }
        }

        fn commit_point(&mut self, pose: &PoseStamped) -> Result<(), PortError> {
            self.commit_calls += 1;
            match self.commit_results.pop_front().unwrap_or(Ok(())) {
                Ok(()) => {
                    self.committed.push(pose.clone());
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }
    }

    fn test_localizer(ports: FakePorts) -> Localizer<FakePorts> {
        Localizer::new(LocParams::default(), ports).unwrap()
    }

    #[test]
    fn retries_empty_detections_then_commits_once() {
        let mut ports = FakePorts::new();
        ports.detections = vec![
            detection(0, [0.0; 3]),
            detection(0, [0.0; 3]),
            detection(2, [1.0, 2.0, 3.0]),
        ]
        .into();
        let mut localizer = test_localizer(ports);

        let outcome = localizer.localize(&Preempt::new());

        assert!(matches!(outcome, LocOutcome::Succeeded(_)));
        assert_eq!(localizer.ports.capture_calls, 3);
        assert_eq!(localizer.ports.commit_calls, 1);
    }

    #[test]
    fn preemption_short_circuits_before_any_commit() {
        let mut ports = FakePorts::new();
        ports.detections = vec![detection(2, [1.0, 2.0, 3.0])].into();
        let mut localizer = test_localizer(ports);

        let preempt = Preempt::new();
        preempt.request();

        assert_eq!(localizer.localize(&preempt), LocOutcome::Preempted);
        assert_eq!(localizer.ports.capture_calls, 0);
        assert_eq!(localizer.ports.commit_calls, 0);
    }

    #[test]
    fn capture_failure_is_retried() {
        let mut ports = FakePorts::new();
        ports.capture_failures = 2;
        ports.detections = vec![detection(1, [1.0, 1.0, 1.0])].into();
        let mut localizer = test_localizer(ports);

        let outcome = localizer.localize(&Preempt::new());

        assert!(matches!(outcome, LocOutcome::Succeeded(_)));
        assert_eq!(localizer.ports.capture_calls, 3);
    }

    #[test]
    fn transform_failure_discards_the_attempt() {
        let mut ports = FakePorts::new();
        ports.detections = vec![
            detection(1, [1.0, 1.0, 1.0]),
            detection(1, [1.0, 1.0, 1.0]),
        ]
        .into();
        ports.transform_results = vec![
            Err(PortError::TransformFailed("no transform available".into())),
            Ok(()),
        ]
        .into();
        let mut localizer = test_localizer(ports);

        let outcome = localizer.localize(&Preempt::new());

        assert!(matches!(outcome, LocOutcome::Succeeded(_)));
        assert_eq!(localizer.ports.capture_calls, 2);
        assert_eq!(localizer.ports.commit_calls, 1);
    }

    #[test]
    fn commit_failure_retries_with_fresh_data() {
        let mut ports = FakePorts::new();
        ports.detections = vec![
            detection(1, [1.0, 1.0, 1.0]),
            detection(1, [2.0, 2.0, 2.0]),
        ]
        .into();
        ports.commit_results = vec![Err(PortError::CommitRejected), Ok(())].into();
        let mut localizer = test_localizer(ports);

        let outcome = localizer.localize(&Preempt::new());

        assert!(matches!(outcome, LocOutcome::Succeeded(_)));
        // Both attempts captured a fresh image and made their own commit call
        assert_eq!(localizer.ports.capture_calls, 2);
        assert_eq!(localizer.ports.commit_calls, 2);
        // The committed point comes from the second detection
        assert_eq!(
            localizer.ports.committed[0].pose.position_m,
            Vector3::new(2.0, -2.0, -2.0)
        );
    }

    #[test]
    fn correction_and_frame_are_applied_to_the_committed_point() {
        let mut ports = FakePorts::new();
        ports.detections = vec![detection(1, [1.0, 2.0, 3.0])].into();
        let mut localizer = test_localizer(ports);

        let outcome = localizer.localize(&Preempt::new());

        let point = match outcome {
            LocOutcome::Succeeded(p) => p,
            other => panic!("expected success, got {:?}", other),
        };

        // Default correction flips Y and Z
        assert_eq!(point.pose.position_m, Vector3::new(1.0, -2.0, -3.0));
        assert_eq!(point.frame_id, "odom");
    }

    #[test]
    fn bad_correction_is_rejected_at_construction() {
        let params = LocParams {
            detector_correction: [1.0, -1.0, 0.5],
            ..LocParams::default()
        };
        assert!(matches!(
            Localizer::new(params, FakePorts::new()),
            Err(LocError::InvalidCorrection(_))
        ));
    }
}
