//! Events delivered to the controller's thread
//!
//! Tick sources, capture completions and host environment notifications all funnel
//! through one unbounded channel so the state machine only ever runs on the thread
//! that drains it.

use tokio::sync::mpsc;

use crate::capture::CaptureFrame;
use crate::environment::EnvironmentEvent;
use crate::error::CaptureError;

/// Identifies one capture session; never reused within a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

/// Identifies one scheduled tick source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TickHandle(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

impl std::fmt::Display for TickHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ticks-{}", self.0)
    }
}

#[derive(Debug)]
pub enum ControllerEvent {
    /// A periodic tick fired
    Tick {
        session: SessionId,
        ticks: TickHandle,
    },
    /// A capture request finished, successfully or not
    CaptureCompleted {
        session: SessionId,
        result: Result<CaptureFrame, CaptureError>,
    },
    /// The host reported an environment change
    Environment(EnvironmentEvent),
}

pub type EventSender = mpsc::UnboundedSender<ControllerEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<ControllerEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
