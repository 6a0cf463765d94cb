//! # Network Module
//!
//! This module provides thin JSON-over-ZMQ abstractions used by the
//! executives: a REQ client for remote calls, a REP server for goal and task
//! endpoints, and a PUB publisher for the fire-and-forget output channels.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{de::DeserializeOwned, Serialize};

// Export zmq
pub use zmq;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Timeouts applied to a socket's send and receive operations.
#[derive(Debug, Copy, Clone)]
pub struct SocketTimeouts {
    /// Maximum time a receive will block before returning, in milliseconds.
    pub recv_ms: i32,

    /// Maximum time a send will block before returning, in milliseconds.
    pub send_ms: i32,
}

/// A REQ socket making JSON request/response calls to a remote service.
pub struct ServiceClient {
    socket: zmq::Socket,
}

/// A REP socket serving JSON requests, polled with a receive timeout.
pub struct RepServer {
    socket: zmq::Socket,
}

/// A PUB socket broadcasting the latest value of an output channel.
pub struct Publisher {
    socket: zmq::Socket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("Error creating the socket: {0}")]
    CreateSocketError(zmq::Error),

    #[error("Could not set the {0} socket option: {1}")]
    SocketOptionError(&'static str, zmq::Error),

    #[error("Could not connect the socket to {0}: {1}")]
    ConnectError(String, zmq::Error),

    #[error("Could not bind the socket to {0}: {1}")]
    BindError(String, zmq::Error),

    #[error("Could not send the message: {0}")]
    SendError(zmq::Error),

    #[error("Could not receive a message: {0}")]
    RecvError(zmq::Error),

    #[error("The remote did not respond within the socket timeout")]
    Timeout,

    #[error("Could not serialize the data: {0}")]
    SerializeError(serde_json::Error),

    #[error("Could not deserialize the received message: {0}")]
    DeserializeError(serde_json::Error),

    #[error("The remote sent a message which was not valid UTF-8")]
    NonUtf8Message,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SocketTimeouts {
    fn default() -> Self {
        Self {
            recv_ms: 1000,
            send_ms: 1000,
        }
    }
}

impl ServiceClient {
    /// Connect a new service client to the given endpoint.
    ///
    /// This does not block until the server is up, connection is established
    /// lazily by zmq.
    pub fn connect(
        ctx: &zmq::Context,
        endpoint: &str,
        timeouts: SocketTimeouts,
    ) -> Result<Self, NetError> {
        let socket = ctx.socket(zmq::REQ).map_err(NetError::CreateSocketError)?;

        socket
            .set_rcvtimeo(timeouts.recv_ms)
            .map_err(|e| NetError::SocketOptionError("set_rcvtimeo", e))?;
        socket
            .set_sndtimeo(timeouts.send_ms)
            .map_err(|e| NetError::SocketOptionError("set_sndtimeo", e))?;
        socket
            .set_linger(1)
            .map_err(|e| NetError::SocketOptionError("set_linger", e))?;
        // Correlate and relax so a timed-out request doesn't wedge the socket
        socket
            .set_req_correlate(true)
            .map_err(|e| NetError::SocketOptionError("set_req_correlate", e))?;
        socket
            .set_req_relaxed(true)
            .map_err(|e| NetError::SocketOptionError("set_req_relaxed", e))?;

        socket
            .connect(endpoint)
            .map_err(|e| NetError::ConnectError(endpoint.into(), e))?;

        Ok(Self { socket })
    }

    /// Make a blocking call to the service, returning its response.
    ///
    /// Blocks for at most the socket's receive timeout.
    pub fn call<Q, R>(&self, request: &Q) -> Result<R, NetError>
    where
        Q: Serialize,
        R: DeserializeOwned,
    {
        let request_str = serde_json::to_string(request).map_err(NetError::SerializeError)?;

        match self.socket.send(request_str.as_str(), 0) {
            Ok(_) => (),
            Err(zmq::Error::EAGAIN) => return Err(NetError::Timeout),
            Err(e) => return Err(NetError::SendError(e)),
        }

        let response_str = match self.socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => return Err(NetError::NonUtf8Message),
            Err(zmq::Error::EAGAIN) => return Err(NetError::Timeout),
            Err(e) => return Err(NetError::RecvError(e)),
        };

        serde_json::from_str(&response_str).map_err(NetError::DeserializeError)
    }
}

impl RepServer {
    /// Bind a new REP server to the given endpoint.
    pub fn bind(
        ctx: &zmq::Context,
        endpoint: &str,
        timeouts: SocketTimeouts,
    ) -> Result<Self, NetError> {
        let socket = ctx.socket(zmq::REP).map_err(NetError::CreateSocketError)?;

        socket
            .set_rcvtimeo(timeouts.recv_ms)
            .map_err(|e| NetError::SocketOptionError("set_rcvtimeo", e))?;
        socket
            .set_sndtimeo(timeouts.send_ms)
            .map_err(|e| NetError::SocketOptionError("set_sndtimeo", e))?;
        socket
            .set_linger(1)
            .map_err(|e| NetError::SocketOptionError("set_linger", e))?;

        socket
            .bind(endpoint)
            .map_err(|e| NetError::BindError(endpoint.into(), e))?;

        Ok(Self { socket })
    }

    /// Attempt to receive a request, returning `None` if nothing arrived
    /// within the receive timeout.
    ///
    /// After a request is received a response must be sent with
    /// [`RepServer::respond`] before the next receive.
    pub fn try_recv<T: DeserializeOwned>(&self) -> Result<Option<T>, NetError> {
        let request_str = match self.socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => return Err(NetError::NonUtf8Message),
            Err(zmq::Error::EAGAIN) => return Ok(None),
            Err(e) => return Err(NetError::RecvError(e)),
        };

        serde_json::from_str(&request_str)
            .map(Some)
            .map_err(NetError::DeserializeError)
    }

    /// Send the response to the last received request.
    pub fn respond<T: Serialize>(&self, response: &T) -> Result<(), NetError> {
        let response_str = serde_json::to_string(response).map_err(NetError::SerializeError)?;

        self.socket
            .send(response_str.as_str(), 0)
            .map_err(NetError::SendError)
    }
}

impl Publisher {
    /// Bind a new publisher to the given endpoint.
    pub fn bind(ctx: &zmq::Context, endpoint: &str) -> Result<Self, NetError> {
        let socket = ctx.socket(zmq::PUB).map_err(NetError::CreateSocketError)?;

        socket
            .set_linger(1)
            .map_err(|e| NetError::SocketOptionError("set_linger", e))?;

        socket
            .bind(endpoint)
            .map_err(|e| NetError::BindError(endpoint.into(), e))?;

        Ok(Self { socket })
    }

    /// Publish a message on the channel.
    ///
    /// Fire-and-forget: there is no acknowledgement from subscribers.
    pub fn publish<T: Serialize>(&self, message: &T) -> Result<(), NetError> {
        let message_str = serde_json::to_string(message).map_err(NetError::SerializeError)?;

        self.socket
            .send(message_str.as_str(), 0)
            .map_err(NetError::SendError)
    }
}
