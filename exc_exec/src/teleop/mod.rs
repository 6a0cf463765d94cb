//! # Teleop executive
//!
//! The teleop executive processes one operator command at a time and drives it
//! to a terminal outcome. Immediate drive commands publish a single velocity
//! demand and succeed. Digging delegates to the digging subordinate task and
//! blocks on its completion while sampling for preemption. Dumping and its
//! reset poll the bin state service until the bin confirms the target
//! position.
//!
//! Preemption is cooperative: it is honored at the top of each poll
//! iteration, never mid-call.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod params;
pub use params::TeleopParams;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{error, info, warn};

use msgs_if::{
    codes::BinCode,
    geom::{BinCmd, DriveCmd},
    joints,
    svc::GoalOutcome,
    teleop::{TeleopCode, TeleopGoal},
};

use crate::ports::{Preempt, TeleopPorts};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The teleop executive.
///
/// Owns a single active command at a time, enforced by `&mut self`: a new
/// command can only be processed once the previous cycle has reached a
/// terminal outcome.
pub struct TeleopExec<P: TeleopPorts> {
    /// Parameters of the executive, read-only after construction.
    pub params: TeleopParams,

    /// The capability ports the executive acts through.
    pub ports: P,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors that can occur constructing the teleop executive.
#[derive(Debug, thiserror::Error)]
pub enum TeleopError {
    #[error("The poll rate must be a positive number of Hz, got {0}")]
    InvalidPollRate(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<P: TeleopPorts> TeleopExec<P> {
    /// Create a new teleop executive with the given parameters and ports.
    pub fn new(params: TeleopParams, ports: P) -> Result<Self, TeleopError> {
        params.validate()?;
        Ok(Self { params, ports })
    }

    /// Process a single teleop goal to a terminal outcome.
    pub fn process(&mut self, goal: TeleopGoal, preempt: &Preempt) -> GoalOutcome {
        let code = match TeleopCode::from_code(goal.code) {
            Some(c) => c,
            None => {
                warn!("Teleop: unrecognized command code {}", goal.code);
                return GoalOutcome::Aborted;
            }
        };

        self.dispatch(code, preempt)
    }

    /// Dispatch a recognized command code.
    pub fn dispatch(&mut self, code: TeleopCode, preempt: &Preempt) -> GoalOutcome {
        info!("Teleop: command received, {:?}", code);

        match code {
            TeleopCode::StopDrive => self.drive(DriveCmd::stop()),
            TeleopCode::StopTurntable => {
                // TODO: integrate manual turntable control
                GoalOutcome::Succeeded
            }
            TeleopCode::Forward => self.drive(DriveCmd {
                linear_ms: self.params.max_linear_ms,
                angular_rads: 0.0,
            }),
            TeleopCode::Backward => self.drive(DriveCmd {
                linear_ms: -self.params.max_linear_ms,
                angular_rads: 0.0,
            }),
            TeleopCode::Left => self.drive(DriveCmd {
                linear_ms: 0.0,
                angular_rads: self.params.max_angular_rads,
            }),
            TeleopCode::Right => self.drive(DriveCmd {
                linear_ms: 0.0,
                angular_rads: -self.params.max_angular_rads,
            }),
            TeleopCode::Clockwise => self.drive(DriveCmd {
                linear_ms: 0.0,
                angular_rads: self.params.max_angular_rads,
            }),
            TeleopCode::Counterclockwise => self.drive(DriveCmd {
                linear_ms: 0.0,
                angular_rads: -self.params.max_angular_rads,
            }),
            TeleopCode::Dig => self.dig(preempt),
            TeleopCode::Dump => self.bin_cycle(
                BinCode::Raised,
                BinCmd {
                    angle_rad: joints::BIN_RAISED_RAD,
                },
                preempt,
            ),
            TeleopCode::ResetDumping => self.bin_cycle(
                BinCode::Lowered,
                BinCmd {
                    angle_rad: joints::BIN_LOWERED_RAD,
                },
                preempt,
            ),
            TeleopCode::ResetStarting => {
                // TODO: integrate mechanism reset once the arm controller
                // exposes it
                self.drive(DriveCmd::stop())
            }
        }
    }

    /// Publish a single velocity demand and succeed immediately.
    fn drive(&mut self, cmd: DriveCmd) -> GoalOutcome {
        self.ports.publish_drive(cmd);
        GoalOutcome::Succeeded
    }

    /// Run the digging command cycle.
    fn dig(&mut self, preempt: &Preempt) -> GoalOutcome {
        info!("Teleop: commencing digging");

        // Fetch the digging duration. A failure here aborts the cycle before
        // the digging task is ever started.
        let duration = match self.ports.digging_duration() {
            Ok(d) => d,
            Err(e) => {
                error!("Teleop: could not retrieve digging time: {}", e);
                return GoalOutcome::Aborted;
            }
        };
        info!(
            "Teleop: digging time retrieved, {:.2} s",
            duration.as_secs_f64()
        );

        let mut task = match self.ports.start_digging(duration) {
            Ok(t) => t,
            Err(e) => {
                error!("Teleop: could not start digging: {}", e);
                return GoalOutcome::Aborted;
            }
        };

        // Await completion, sampling for preemption at the poll rate. There
        // is no timeout on the wait, the digging task is trusted to
        // terminate.
        while !task.is_done() {
            if preempt.is_requested() {
                task.cancel();
                info!("Teleop: digging preempted");
                return GoalOutcome::Preempted;
            }
            std::thread::sleep(self.params.poll_period());
        }

        info!("Teleop: digging finished");
        GoalOutcome::Succeeded
    }

    /// Run a dump or reset-dumping cycle towards the given bin target.
    fn bin_cycle(&mut self, target: BinCode, cmd: BinCmd, preempt: &Preempt) -> GoalOutcome {
        // Hold the drivebase still while the bin moves
        self.ports.publish_drive(DriveCmd::stop());

        loop {
            if preempt.is_requested() {
                info!("Teleop: bin command preempted");
                return GoalOutcome::Preempted;
            }

            match self.ports.bin_state() {
                // Target reached, no further bin commands are issued
                Ok(code) if code == target => break,

                // Not there yet, demand the target position again
                Ok(_) => self.ports.publish_bin(cmd),

                // Transient failure, retry on the next poll
                Err(e) => warn!("Teleop: could not query bin state: {}", e),
            }

            std::thread::sleep(self.params.poll_period());
        }

        info!("Teleop: bin command finished, bin is {:?}", target);
        GoalOutcome::Succeeded
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{PortError, TaskHandle};
    use msgs_if::net::NetError;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// State of the fake digging task, shared with the handle given to the
    /// executive.
    #[derive(Default)]
    struct FakeDigState {
        /// Number of `is_done` polls before the task reports done. `None`
        /// means it never completes on its own.
        polls_until_done: Option<u32>,
        polls: u32,
        cancelled: bool,
    }

    struct FakeDigHandle(Arc<Mutex<FakeDigState>>);

    impl TaskHandle for FakeDigHandle {
        fn is_done(&mut self) -> bool {
            let mut state = self.0.lock().unwrap();
            match state.polls_until_done {
                Some(n) if state.polls >= n => true,
                _ => {
                    state.polls += 1;
                    false
                }
            }
        }

        fn cancel(&mut self) {
            self.0.lock().unwrap().cancelled = true;
        }
    }

    /// Fake port implementation with scripted service responses and recording
    /// output channels.
    struct FakePorts {
        duration: Option<Duration>,
        bin_states: VecDeque<Result<BinCode, PortError>>,
        dig: Arc<Mutex<FakeDigState>>,
        dig_started: bool,
        drive_log: Vec<DriveCmd>,
        bin_log: Vec<BinCmd>,
    }

    impl FakePorts {
        fn new() -> Self {
            Self {
                duration: Some(Duration::from_secs(5)),
                bin_states: VecDeque::new(),
                dig: Arc::new(Mutex::new(FakeDigState::default())),
                dig_started: false,
                drive_log: Vec::new(),
                bin_log: Vec::new(),
            }
        }
    }

    impl TeleopPorts for FakePorts {
        fn digging_duration(&mut self) -> Result<Duration, PortError> {
            self.duration
                .ok_or(PortError::ServiceUnreachable("digging time", NetError::Timeout))
        }

        fn bin_state(&mut self) -> Result<BinCode, PortError> {
            self.bin_states
                .pop_front()
                .unwrap_or(Err(PortError::ServiceUnreachable(
                    "bin state",
                    NetError::Timeout,
                )))
        }

        fn start_digging(
            &mut self,
            _duration: Duration,
        ) -> Result<Box<dyn TaskHandle>, PortError> {
            self.dig_started = true;
            Ok(Box::new(FakeDigHandle(self.dig.clone())))
        }

        fn publish_drive(&mut self, cmd: DriveCmd) {
            self.drive_log.push(cmd);
        }

        fn publish_bin(&mut self, cmd: BinCmd) {
            self.bin_log.push(cmd);
        }
    }

    fn test_exec() -> TeleopExec<FakePorts> {
        let params = TeleopParams {
            // High poll rate so tests don't spend time sleeping
            poll_hz: 10_000.0,
            ..TeleopParams::default()
        };
        TeleopExec::new(params, FakePorts::new()).unwrap()
    }

    #[test]
    fn immediate_drive_commands_match_profile() {
        let mut exec = test_exec();
        let preempt = Preempt::new();

        let cases = [
            (TeleopCode::Forward, 0.25, 0.0),
            (TeleopCode::Backward, -0.25, 0.0),
            (TeleopCode::Left, 0.0, 0.1),
            (TeleopCode::Right, 0.0, -0.1),
            (TeleopCode::Clockwise, 0.0, 0.1),
            (TeleopCode::Counterclockwise, 0.0, -0.1),
            (TeleopCode::StopDrive, 0.0, 0.0),
        ];

        for &(code, linear, angular) in cases.iter() {
            assert_eq!(exec.dispatch(code, &preempt), GoalOutcome::Succeeded);
            let published = exec.ports.drive_log.last().unwrap();
            assert_eq!(published.linear_ms, linear, "linear for {:?}", code);
            assert_eq!(published.angular_rads, angular, "angular for {:?}", code);
        }

        assert_eq!(exec.ports.drive_log.len(), cases.len());
    }

    #[test]
    fn immediate_commands_are_idempotent() {
        let mut exec = test_exec();
        let preempt = Preempt::new();

        assert_eq!(
            exec.dispatch(TeleopCode::Forward, &preempt),
            GoalOutcome::Succeeded
        );
        assert_eq!(
            exec.dispatch(TeleopCode::Forward, &preempt),
            GoalOutcome::Succeeded
        );

        assert_eq!(exec.ports.drive_log.len(), 2);
        assert_eq!(exec.ports.drive_log[0], exec.ports.drive_log[1]);
    }

    #[test]
    fn unrecognized_code_aborts_without_side_effects() {
        let mut exec = test_exec();
        let preempt = Preempt::new();

        let outcome = exec.process(TeleopGoal { code: 200 }, &preempt);

        assert_eq!(outcome, GoalOutcome::Aborted);
        assert!(exec.ports.drive_log.is_empty());
        assert!(exec.ports.bin_log.is_empty());
    }

    #[test]
    fn dig_runs_to_completion() {
        let mut exec = test_exec();
        exec.ports.dig.lock().unwrap().polls_until_done = Some(3);
        let preempt = Preempt::new();

        assert_eq!(
            exec.dispatch(TeleopCode::Dig, &preempt),
            GoalOutcome::Succeeded
        );
        assert!(exec.ports.dig_started);
        assert!(!exec.ports.dig.lock().unwrap().cancelled);
    }

    #[test]
    fn dig_preemption_cancels_the_task() {
        let mut exec = test_exec();
        // Task never completes on its own
        let preempt = Preempt::new();
        preempt.request();

        assert_eq!(
            exec.dispatch(TeleopCode::Dig, &preempt),
            GoalOutcome::Preempted
        );
        assert!(exec.ports.dig.lock().unwrap().cancelled);
    }

    #[test]
    fn dig_duration_failure_aborts_before_task_start() {
        let mut exec = test_exec();
        exec.ports.duration = None;
        let preempt = Preempt::new();

        assert_eq!(
            exec.dispatch(TeleopCode::Dig, &preempt),
            GoalOutcome::Aborted
        );
        assert!(!exec.ports.dig_started);
    }

    #[test]
    fn dump_terminates_when_bin_raised() {
        let mut exec = test_exec();
        exec.ports.bin_states = vec![
            Ok(BinCode::Transit),
            Ok(BinCode::Transit),
            Ok(BinCode::Raised),
        ]
        .into();
        let preempt = Preempt::new();

        assert_eq!(
            exec.dispatch(TeleopCode::Dump, &preempt),
            GoalOutcome::Succeeded
        );

        // A stop-drive is published before the bin loop starts
        assert_eq!(exec.ports.drive_log, vec![DriveCmd::stop()]);

        // One bin command per non-target poll, none after the target poll
        assert_eq!(exec.ports.bin_log.len(), 2);
        for cmd in &exec.ports.bin_log {
            assert_eq!(cmd.angle_rad, joints::BIN_RAISED_RAD);
        }
    }

    #[test]
    fn reset_dumping_targets_lowered() {
        let mut exec = test_exec();
        exec.ports.bin_states = vec![Ok(BinCode::Raised), Ok(BinCode::Lowered)].into();
        let preempt = Preempt::new();

        assert_eq!(
            exec.dispatch(TeleopCode::ResetDumping, &preempt),
            GoalOutcome::Succeeded
        );

        assert_eq!(exec.ports.bin_log.len(), 1);
        assert_eq!(exec.ports.bin_log[0].angle_rad, joints::BIN_LOWERED_RAD);
    }

    #[test]
    fn dump_preemption_issues_no_bin_commands() {
        let mut exec = test_exec();
        exec.ports.bin_states = vec![Ok(BinCode::Transit)].into();
        let preempt = Preempt::new();
        preempt.request();

        assert_eq!(
            exec.dispatch(TeleopCode::Dump, &preempt),
            GoalOutcome::Preempted
        );

        // The stop-drive publish precedes the preemption check, but no bin
        // command may be issued after preemption is requested
        assert_eq!(exec.ports.drive_log, vec![DriveCmd::stop()]);
        assert!(exec.ports.bin_log.is_empty());
    }

    #[test]
    fn bin_state_failure_is_retried_without_publishing() {
        let mut exec = test_exec();
        exec.ports.bin_states = vec![
            Err(PortError::ServiceUnreachable("bin state", NetError::Timeout)),
            Ok(BinCode::Raised),
        ]
        .into();
        let preempt = Preempt::new();

        assert_eq!(
            exec.dispatch(TeleopCode::Dump, &preempt),
            GoalOutcome::Succeeded
        );
        assert!(exec.ports.bin_log.is_empty());
    }
}
