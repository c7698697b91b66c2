//! Scripted collaborators for driving the controller deterministically.
//!
//! Each fake is a cheap cloneable handle over shared state, so a test can move
//! one copy into the controller and keep another to steer or inspect it.
//! Only compiled for tests and with the `testing-support` feature.

use anyhow::Result;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::error::TransportError;
use crate::light::{LightOutput, Rgb};
use crate::motion::MotionInput;
use crate::network::NetworkStatus;
use crate::telemetry::{LinkState, StatusLink};
use crate::transport::{CallResult, Request, Response, Transport};

pub use crate::time_source::ManualTimeSource;

enum Reply {
    Ready(CallResult),
    Pending,
}

#[derive(Default)]
struct TransportScript {
    replies: VecDeque<Reply>,
    requests: Vec<Request>,
    pending: VecDeque<Sender<CallResult>>,
}

/// Transport that answers from a script, in request order.
///
/// Requests without a scripted reply fail with an HTTP error.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Rc<RefCell<TransportScript>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_ok(&self, status: u16, body: &str) {
        self.script
            .borrow_mut()
            .replies
            .push_back(Reply::Ready(Ok(Response {
                status,
                body: body.to_string(),
            })));
    }

    pub fn respond_err(&self, error: TransportError) {
        self.script
            .borrow_mut()
            .replies
            .push_back(Reply::Ready(Err(error)));
    }

    /// The next request stays in flight until [`Self::complete_pending`].
    pub fn respond_pending(&self) {
        self.script.borrow_mut().replies.push_back(Reply::Pending);
    }

    /// Resolve the oldest pending request.
    pub fn complete_pending(&self, result: CallResult) {
        if let Some(sender) = self.script.borrow_mut().pending.pop_front() {
            let _ = sender.send(result);
        }
    }

    pub fn requests(&self) -> Vec<Request> {
        self.script.borrow().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.script.borrow().requests.len()
    }
}

impl Transport for ScriptedTransport {
    fn begin(&mut self, request: Request) -> Receiver<CallResult> {
        let (sender, receiver) = mpsc::channel();
        let mut script = self.script.borrow_mut();
        script.requests.push(request);

        match script.replies.pop_front() {
            Some(Reply::Ready(result)) => {
                let _ = sender.send(result);
            }
            Some(Reply::Pending) => script.pending.push_back(sender),
            None => {
                let _ = sender.send(Err(TransportError::Http("no scripted reply".to_string())));
            }
        }

        receiver
    }
}

/// Motion input controlled by the test.
pub struct ScriptedMotion {
    high: Rc<Cell<bool>>,
    failing: Rc<Cell<bool>>,
}

/// Steering handle for a [`ScriptedMotion`].
#[derive(Clone)]
pub struct MotionHandle {
    high: Rc<Cell<bool>>,
    failing: Rc<Cell<bool>>,
}

impl ScriptedMotion {
    pub fn new() -> (Self, MotionHandle) {
        let high = Rc::new(Cell::new(false));
        let failing = Rc::new(Cell::new(false));
        (
            Self {
                high: high.clone(),
                failing: failing.clone(),
            },
            MotionHandle { high, failing },
        )
    }
}

impl MotionHandle {
    pub fn set_high(&self, high: bool) {
        self.high.set(high);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }
}

impl MotionInput for ScriptedMotion {
    fn is_high(&mut self) -> Result<bool> {
        if self.failing.get() {
            anyhow::bail!("sensor unplugged");
        }
        Ok(self.high.get())
    }

    fn label(&self) -> String {
        "scripted".to_string()
    }
}

/// Light output that records every frame.
#[derive(Clone, Default)]
pub struct RecordingLight {
    frames: Rc<RefCell<Vec<(u8, Rgb)>>>,
}

impl RecordingLight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<(u8, Rgb)> {
        self.frames.borrow().clone()
    }

    pub fn last_frame(&self) -> Option<(u8, Rgb)> {
        self.frames.borrow().last().copied()
    }
}

impl LightOutput for RecordingLight {
    fn show(&mut self, brightness: u8, color: Rgb) -> Result<()> {
        self.frames.borrow_mut().push((brightness, color));
        Ok(())
    }
}

/// Network whose state is set by the test. Starts up.
#[derive(Clone)]
pub struct ToggleNetwork {
    up: Rc<Cell<bool>>,
}

impl ToggleNetwork {
    pub fn new() -> Self {
        Self {
            up: Rc::new(Cell::new(true)),
        }
    }

    pub fn set_up(&self, up: bool) {
        self.up.set(up);
    }
}

impl Default for ToggleNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkStatus for ToggleNetwork {
    fn is_up(&self) -> bool {
        self.up.get()
    }
}

#[derive(Default)]
struct LinkScript {
    connected: bool,
    reconnected: bool,
    failing: bool,
    messages: Vec<String>,
}

/// Status link that records published messages. Starts disconnected.
#[derive(Clone, Default)]
pub struct RecordingStatusLink {
    script: Rc<RefCell<LinkScript>>,
}

impl RecordingStatusLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect; the next poll reports a reconnect.
    pub fn connect(&self) {
        let mut script = self.script.borrow_mut();
        script.connected = true;
        script.reconnected = true;
    }

    pub fn disconnect(&self) {
        let mut script = self.script.borrow_mut();
        script.connected = false;
        script.reconnected = false;
    }

    pub fn set_failing(&self, failing: bool) {
        self.script.borrow_mut().failing = failing;
    }

    pub fn messages(&self) -> Vec<String> {
        self.script.borrow().messages.clone()
    }
}

impl StatusLink for RecordingStatusLink {
    fn poll(&mut self) -> LinkState {
        let mut script = self.script.borrow_mut();
        if !script.connected {
            LinkState::Down
        } else if std::mem::take(&mut script.reconnected) {
            LinkState::Reconnected
        } else {
            LinkState::Up
        }
    }

    fn publish(&mut self, payload: &str) -> Result<()> {
        let mut script = self.script.borrow_mut();
        if script.failing {
            anyhow::bail!("broker rejected the message");
        }
        script.messages.push(payload.to_string());
        Ok(())
    }
}
