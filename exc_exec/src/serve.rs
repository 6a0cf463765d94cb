//! # Goal serving loop
//!
//! Shared by the executive binaries: a REP socket speaking the generic task
//! protocol on the main thread, with the goal handler running on a worker
//! thread so `Status` and `Cancel` requests stay responsive while a goal is
//! in progress.
//!
//! At most one goal runs at a time. A `Start` while a goal is active requests
//! preemption of the active goal and holds the new one until the active goal
//! winds down at its next check point, at which point the new goal is
//! dispatched. A `Cancel` raises the preemption token and drops any held
//! goal.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{info, warn};
use serde::de::DeserializeOwned;
use std::sync::{mpsc, Arc, Mutex};

use msgs_if::{
    net::{NetError, RepServer},
    svc::{GoalOutcome, TaskRequest, TaskResponse},
};

use crate::ports::Preempt;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Shared view of the goal in progress, owned jointly by the serving loop and
/// the worker thread.
struct ServeState {
    /// Whether a goal is currently being processed.
    active: bool,

    /// The outcome of the most recently finished goal, if any.
    last_outcome: Option<GoalOutcome>,
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Serve goals forever on the given REP server.
///
/// Each accepted goal is handed to `handler` on the worker thread along with
/// the preemption token. The token is raised when a `Cancel` request arrives
/// for the goal, or when a new goal arrives while one is active; in the
/// latter case the new goal is dispatched once the active one reaches a
/// terminal outcome.
pub fn serve<G, F>(server: RepServer, mut handler: F) -> !
where
    G: DeserializeOwned + Send + 'static,
    F: FnMut(G, &Preempt) -> GoalOutcome + Send + 'static,
{
    let state = Arc::new(Mutex::new(ServeState {
        active: false,
        last_outcome: None,
    }));
    let preempt = Preempt::new();

    let (goal_tx, goal_rx) = mpsc::channel::<G>();

    // A goal held while the one it preempted winds down
    let mut pending: Option<G> = None;

    // Worker thread: runs one goal at a time to completion
    {
        let state = state.clone();
        let preempt = preempt.clone();
        std::thread::spawn(move || {
            while let Ok(goal) = goal_rx.recv() {
                let outcome = handler(goal, &preempt);
                info!("Goal finished: {:?}", outcome);

                let mut state = state.lock().expect("goal server state poisoned");
                state.active = false;
                state.last_outcome = Some(outcome);
            }
        });
    }

    loop {
        // Promote a held goal once the preempted one has wound down
        {
            let mut state = state.lock().expect("goal server state poisoned");
            if !state.active && pending.is_some() {
                if let Some(goal) = pending.take() {
                    preempt.clear();
                    state.active = true;
                    state.last_outcome = None;

                    if goal_tx.send(goal).is_err() {
                        state.active = false;
                        warn!("Dropping a held goal, the worker thread has exited");
                    } else {
                        info!("Held goal dispatched");
                    }
                }
            }
        }

        let request: TaskRequest<G> = match server.try_recv() {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(e @ NetError::DeserializeError(_)) | Err(e @ NetError::NonUtf8Message) => {
                // A REP socket owes a reply even for garbage requests
                warn!("Rejecting an unintelligible request: {}", e);
                respond(&server, &TaskResponse::<GoalOutcome>::Rejected);
                continue;
            }
            Err(e) => {
                warn!("Could not receive a request: {}", e);
                continue;
            }
        };

        let mut state = state.lock().expect("goal server state poisoned");

        let response = match request {
            TaskRequest::Start(goal) => {
                if state.active {
                    // Preempt the active goal and hold the new one until the
                    // active one winds down at its next check point. A later
                    // goal replaces an earlier held one.
                    info!("New goal received, preempting the active one");
                    preempt.request();
                    pending = Some(goal);
                    TaskResponse::Accepted
                } else {
                    preempt.clear();
                    state.active = true;
                    state.last_outcome = None;

                    match goal_tx.send(goal) {
                        Ok(()) => {
                            info!("Goal accepted");
                            TaskResponse::Accepted
                        }
                        Err(_) => {
                            // Worker thread is gone, nothing can run goals
                            state.active = false;
                            warn!("Rejecting a goal, the worker thread has exited");
                            TaskResponse::Rejected
                        }
                    }
                }
            }
            TaskRequest::Status => {
                if state.active || pending.is_some() {
                    TaskResponse::Running
                } else {
                    match state.last_outcome {
                        Some(outcome) => TaskResponse::Done(outcome),
                        None => TaskResponse::Rejected,
                    }
                }
            }
            TaskRequest::Cancel => {
                if state.active || pending.is_some() {
                    info!("Cancel received, raising the preemption request");
                    preempt.request();
                    pending = None;
                    TaskResponse::Accepted
                } else {
                    TaskResponse::Rejected
                }
            }
        };

        respond(&server, &response);
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn respond(server: &RepServer, response: &TaskResponse<GoalOutcome>) {
    if let Err(e) = server.respond(response) {
        warn!("Could not send the response: {}", e);
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use msgs_if::net::{zmq, ServiceClient, SocketTimeouts};
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    fn call(client: &ServiceClient, request: &TaskRequest<u8>) -> TaskResponse<GoalOutcome> {
        client.call(request).unwrap()
    }

    /// Poll status until the serving loop reports a terminal outcome.
    fn await_outcome(client: &ServiceClient) -> GoalOutcome {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match call(client, &TaskRequest::Status) {
                TaskResponse::Done(outcome) => return outcome,
                other => {
                    if Instant::now() > deadline {
                        panic!("goal did not finish, last response {:?}", other);
                    }
                    std::thread::sleep(Duration::from_millis(5));
                }
            }
        }
    }

    #[test]
    fn new_goal_preempts_the_active_one() {
        let ctx = zmq::Context::new();
        let endpoint = "inproc://serve_new_goal_preempts";

        let server = RepServer::bind(
            &ctx,
            endpoint,
            SocketTimeouts {
                recv_ms: 10,
                send_ms: 10,
            },
        )
        .unwrap();

        // The handler reports each goal it ran and whether preemption was
        // requested while it held the goal
        let (run_tx, run_rx) = mpsc::channel::<(u8, bool)>();

        std::thread::spawn(move || {
            serve(server, move |goal: u8, preempt: &Preempt| {
                if goal == 1 {
                    // Hold until preemption arrives, as a long command would
                    let deadline = Instant::now() + Duration::from_secs(5);
                    while !preempt.is_requested() && Instant::now() < deadline {
                        std::thread::sleep(Duration::from_millis(1));
                    }
                    let _ = run_tx.send((goal, preempt.is_requested()));
                    GoalOutcome::Preempted
                } else {
                    let _ = run_tx.send((goal, preempt.is_requested()));
                    GoalOutcome::Succeeded
                }
            })
        });

        let client = ServiceClient::connect(&ctx, endpoint, SocketTimeouts::default()).unwrap();

        assert!(matches!(
            call(&client, &TaskRequest::Start(1)),
            TaskResponse::Accepted
        ));
        assert!(matches!(
            call(&client, &TaskRequest::Status),
            TaskResponse::Running
        ));

        // A second goal while the first is active is accepted, not rejected
        assert!(matches!(
            call(&client, &TaskRequest::Start(2)),
            TaskResponse::Accepted
        ));

        // The first goal sees the preemption request and winds down
        let (first, first_preempted) = run_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first, 1);
        assert!(first_preempted);

        // The held goal is then dispatched with a cleared token
        let (second, second_preempted) = run_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(second, 2);
        assert!(!second_preempted);

        // The serving loop settles on the second goal's outcome
        assert_eq!(await_outcome(&client), GoalOutcome::Succeeded);
    }

    #[test]
    fn cancel_drops_a_held_goal() {
        let ctx = zmq::Context::new();
        let endpoint = "inproc://serve_cancel_drops_held";

        let server = RepServer::bind(
            &ctx,
            endpoint,
            SocketTimeouts {
                recv_ms: 10,
                send_ms: 10,
            },
        )
        .unwrap();

        let (run_tx, run_rx) = mpsc::channel::<u8>();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        std::thread::spawn(move || {
            serve(server, move |goal: u8, _preempt: &Preempt| {
                let _ = run_tx.send(goal);
                if goal == 1 {
                    // Held open until the test releases it, so the cancel is
                    // guaranteed to land while this goal is still active
                    let _ = release_rx.recv_timeout(Duration::from_secs(5));
                    GoalOutcome::Preempted
                } else {
                    GoalOutcome::Succeeded
                }
            })
        });

        let client = ServiceClient::connect(&ctx, endpoint, SocketTimeouts::default()).unwrap();

        assert!(matches!(
            call(&client, &TaskRequest::Start(1)),
            TaskResponse::Accepted
        ));
        // Wait for the first goal to actually be running
        assert_eq!(run_rx.recv_timeout(Duration::from_secs(5)).unwrap(), 1);

        // Hold a second goal behind the first, then cancel everything
        assert!(matches!(
            call(&client, &TaskRequest::Start(2)),
            TaskResponse::Accepted
        ));
        assert!(matches!(
            call(&client, &TaskRequest::Cancel),
            TaskResponse::Accepted
        ));
        release_tx.send(()).unwrap();

        // The active goal winds down preempted and the held goal never runs
        assert_eq!(await_outcome(&client), GoalOutcome::Preempted);
        assert!(run_rx
            .recv_timeout(Duration::from_millis(200))
            .is_err());
    }
}
