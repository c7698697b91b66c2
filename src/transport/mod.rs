//! Non-blocking remote calls.
//!
//! The control loop never waits on the network. A [`Transport`] hands back a
//! receiver immediately and does the work elsewhere; [`RemoteCall`] wraps that
//! receiver in an `Idle → InFlight → Succeeded | Failed` state machine that the
//! owner polls once per tick. The per-request timeout is enforced twice: by the
//! transport itself and by a deadline on monotonic uptime here, so a wedged
//! worker cannot keep a call in flight forever.

pub mod http;

use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

use crate::error::TransportError;

pub use http::HttpTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub bearer: Option<String>,
    /// JSON body, sent with `Content-Type: application/json`.
    pub body: Option<String>,
    pub timeout: Duration,
}

impl Request {
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            bearer: None,
            body: None,
            timeout,
        }
    }

    pub fn post_json(url: impl Into<String>, body: String, timeout: Duration) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            bearer: None,
            body: Some(body),
            timeout,
        }
    }

    pub fn with_bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

pub type CallResult = Result<Response, TransportError>;

/// Starts remote calls without blocking the caller.
///
/// The returned receiver yields exactly one result. Non-2xx responses are
/// reported as [`TransportError::Status`].
pub trait Transport {
    fn begin(&mut self, request: Request) -> Receiver<CallResult>;
}

#[derive(Debug)]
pub enum CallState {
    Idle,
    InFlight,
    Succeeded(Response),
    Failed(TransportError),
}

#[derive(Debug)]
pub struct RemoteCall {
    state: CallState,
    receiver: Option<Receiver<CallResult>>,
    deadline: Duration,
}

impl Default for RemoteCall {
    fn default() -> Self {
        Self::idle()
    }
}

impl RemoteCall {
    pub fn idle() -> Self {
        Self {
            state: CallState::Idle,
            receiver: None,
            deadline: Duration::ZERO,
        }
    }

    /// Start a call. `uptime` is the current monotonic time, used for the
    /// deadline.
    pub fn start(transport: &mut dyn Transport, request: Request, uptime: Duration) -> Self {
        let deadline = uptime + request.timeout;
        let receiver = transport.begin(request);
        Self {
            state: CallState::InFlight,
            receiver: Some(receiver),
            deadline,
        }
    }

    /// Advance an in-flight call without blocking.
    pub fn poll(&mut self, uptime: Duration) -> &CallState {
        if let CallState::InFlight = self.state
            && let Some(receiver) = &self.receiver
        {
            let next = match receiver.try_recv() {
                Ok(Ok(response)) => Some(CallState::Succeeded(response)),
                Ok(Err(error)) => Some(CallState::Failed(error)),
                Err(TryRecvError::Empty) if uptime >= self.deadline => {
                    Some(CallState::Failed(TransportError::Timeout))
                }
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => Some(CallState::Failed(TransportError::Http(
                    "transport dropped the request".to_string(),
                ))),
            };

            if let Some(next) = next {
                self.state = next;
                self.receiver = None;
            }
        }

        &self.state
    }

    /// Take a finished result, returning the call to `Idle`.
    pub fn take_result(&mut self) -> Option<CallResult> {
        match std::mem::replace(&mut self.state, CallState::Idle) {
            CallState::Succeeded(response) => Some(Ok(response)),
            CallState::Failed(error) => Some(Err(error)),
            other => {
                self.state = other;
                None
            }
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.state, CallState::InFlight)
    }
}
