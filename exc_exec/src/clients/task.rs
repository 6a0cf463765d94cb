//! # Subordinate task client
//!
//! Drives a remote task server through the [`TaskRequest`]/[`TaskResponse`]
//! protocol: start it with a goal, poll its status, cancel it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

use msgs_if::{
    net::{zmq, NetError, ServiceClient, SocketTimeouts},
    svc::{TaskRequest, TaskResponse},
};

use crate::ports::{PortError, TaskHandle};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A client for one subordinate task server.
pub struct TaskClient {
    name: &'static str,
    client: ServiceClient,
}

/// A [`TaskHandle`] over a started remote task.
pub struct RemoteTaskHandle {
    client: TaskClient,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TaskClient {
    /// Connect a new task client to the given endpoint.
    pub fn connect(
        ctx: &zmq::Context,
        endpoint: &str,
        name: &'static str,
        timeouts: SocketTimeouts,
    ) -> Result<Self, NetError> {
        let client = ServiceClient::connect(ctx, endpoint, timeouts)?;
        Ok(Self { name, client })
    }

    /// The name of the task this client drives, used in logs and errors.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Start the task with the given goal.
    pub fn start<G: Serialize>(&self, goal: &G) -> Result<(), PortError> {
        let response: TaskResponse<serde_json::Value> = self
            .client
            .call(&TaskRequest::Start(goal))
            .map_err(|e| PortError::ServiceUnreachable(self.name, e))?;

        match response {
            TaskResponse::Accepted => Ok(()),
            _ => Err(PortError::TaskStartRejected(self.name)),
        }
    }

    /// Poll the state of the running task.
    pub fn status<R: DeserializeOwned>(&self) -> Result<TaskResponse<R>, NetError> {
        self.client.call(&TaskRequest::<()>::Status)
    }

    /// Ask the server to cancel the running task.
    pub fn cancel(&self) -> Result<(), NetError> {
        let _: TaskResponse<serde_json::Value> = self.client.call(&TaskRequest::<()>::Cancel)?;
        Ok(())
    }

    /// Run the task to completion, blocking until it reports done.
    ///
    /// Blocks indefinitely while the task runs, but returns an error as soon
    /// as the server stops responding to status polls.
    pub fn run_blocking<G, R>(&self, goal: &G, poll_period: Duration) -> Result<R, PortError>
    where
        G: Serialize,
        R: DeserializeOwned,
    {
        self.start(goal)?;

        loop {
            match self.status::<R>() {
                Ok(TaskResponse::Done(result)) => return Ok(result),
                Ok(TaskResponse::Cancelled) => return Err(PortError::TaskCancelled(self.name)),
                Ok(_) => (),
                Err(e) => return Err(PortError::ServiceUnreachable(self.name, e)),
            }
            std::thread::sleep(poll_period);
        }
    }
}

impl RemoteTaskHandle {
    pub fn new(client: TaskClient) -> Self {
        Self { client }
    }
}

impl TaskHandle for RemoteTaskHandle {
    fn is_done(&mut self) -> bool {
        match self.client.status::<serde_json::Value>() {
            Ok(response) => response.is_terminal(),
            Err(e) => {
                warn!(
                    "{} task: could not poll status, treating as still running: {}",
                    self.client.name, e
                );
                false
            }
        }
    }

    fn cancel(&mut self) {
        if let Err(e) = self.client.cancel() {
            warn!("{} task: could not forward the cancel: {}", self.client.name, e);
        }
    }
}
