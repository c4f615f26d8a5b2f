//! Capture runtime
//!
//! Runs the controller on a single task that drains both host commands and
//! controller events, so every state transition and every subscriber callback
//! happens on that one task. `CaptureHandle` is the cloneable command surface a host
//! (GUI, CLI) uses to drive it.

use std::sync::{Arc, Weak};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::capture::{SourceWindow, WindowCapturer};
use crate::controller::{CaptureSessionController, CaptureSubscriber, ControllerOptions};
use crate::environment::{EnvironmentSender, EnvironmentSource};
use crate::error::CaptureError;
use crate::events::{event_channel, EventReceiver, EventSender, SessionId};
use crate::scheduler::TokioScheduler;
use crate::visibility::{TargetWindow, Visibility};

/// Snapshot of the controller for hosts that display status
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureStatus {
    pub session_id: Option<SessionId>,
    pub window_id: Option<u32>,
    pub is_capturing: bool,
    pub is_paused: bool,
    pub requested_frame_rate: Option<f64>,
    pub effective_frame_rate: Option<f64>,
    pub visibility: Option<Visibility>,
}

enum CaptureCommand {
    Start {
        window: SourceWindow,
        frame_rate: f64,
        reply: oneshot::Sender<Result<SessionId, CaptureError>>,
    },
    Stop,
    UpdateFrameRate {
        frame_rate: f64,
        reply: oneshot::Sender<Result<(), CaptureError>>,
    },
    SetTarget(Weak<dyn TargetWindow>),
    Status(oneshot::Sender<CaptureStatus>),
    Shutdown,
}

pub struct CaptureRuntime {
    controller: CaptureSessionController<TokioScheduler>,
    events: EventReceiver,
    event_tx: EventSender,
    commands: mpsc::UnboundedReceiver<CaptureCommand>,
}

impl CaptureRuntime {
    pub fn new(
        capturer: Arc<dyn WindowCapturer>,
        subscriber: Box<dyn CaptureSubscriber>,
    ) -> (Self, CaptureHandle) {
        Self::with_options(capturer, subscriber, ControllerOptions::default())
    }

    pub fn with_options(
        capturer: Arc<dyn WindowCapturer>,
        subscriber: Box<dyn CaptureSubscriber>,
        options: ControllerOptions,
    ) -> (Self, CaptureHandle) {
        let (event_tx, events) = event_channel();
        let (command_tx, commands) = mpsc::unbounded_channel();

        tracing::debug!(backend = capturer.name(), "Creating capture runtime");
        let scheduler = TokioScheduler::new(event_tx.clone(), capturer);
        let mut controller = CaptureSessionController::with_options(scheduler, options);
        controller.set_subscriber(subscriber);

        let runtime = Self {
            controller,
            events,
            event_tx,
            commands,
        };
        (runtime, CaptureHandle { tx: command_tx })
    }

    /// Sender for host environment notifications
    pub fn environment(&self) -> EnvironmentSender {
        EnvironmentSender::new(self.event_tx.clone())
    }

    /// Spawn an environment source feeding this runtime
    ///
    /// Must be called from within a tokio runtime.
    pub fn attach(&self, source: Box<dyn EnvironmentSource>) -> JoinHandle<()> {
        source.spawn(self.environment())
    }

    /// Drive the controller until `shutdown` or every handle is dropped
    ///
    /// Any active session is stopped on exit.
    pub async fn run(mut self) {
        tracing::debug!("Capture runtime started");
        loop {
            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(CaptureCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(event) = self.events.recv() => self.controller.handle_event(event),
            }
        }
        self.controller.stop_capture();
        tracing::debug!("Capture runtime stopped");
    }

    fn handle_command(&mut self, command: CaptureCommand) {
        match command {
            CaptureCommand::Start {
                window,
                frame_rate,
                reply,
            } => {
                let result = self.controller.start_capture(window, frame_rate);
                if let Err(ref e) = result {
                    tracing::warn!(error = %e, "Capture start rejected");
                }
                let _ = reply.send(result);
            }
            CaptureCommand::Stop => self.controller.stop_capture(),
            CaptureCommand::UpdateFrameRate { frame_rate, reply } => {
                let _ = reply.send(self.controller.update_frame_rate(frame_rate));
            }
            CaptureCommand::SetTarget(target) => self.controller.set_target_window(target),
            CaptureCommand::Status(reply) => {
                let _ = reply.send(self.status());
            }
            CaptureCommand::Shutdown => {}
        }
    }

    fn status(&self) -> CaptureStatus {
        let controller = &self.controller;
        CaptureStatus {
            session_id: controller.session_id(),
            window_id: controller.source_window().map(|w| w.id),
            is_capturing: controller.is_capturing(),
            is_paused: controller.is_paused(),
            requested_frame_rate: controller.requested_frame_rate(),
            effective_frame_rate: controller.effective_frame_rate(),
            visibility: controller.visibility(),
        }
    }
}

/// Cloneable command surface of a running `CaptureRuntime`
#[derive(Clone)]
pub struct CaptureHandle {
    tx: mpsc::UnboundedSender<CaptureCommand>,
}

impl CaptureHandle {
    pub async fn start_capture(
        &self,
        window: SourceWindow,
        frame_rate: f64,
    ) -> Result<SessionId, CaptureError> {
        let (reply, response) = oneshot::channel();
        self.send(CaptureCommand::Start {
            window,
            frame_rate,
            reply,
        })?;
        response.await.map_err(|_| runtime_gone())?
    }

    pub fn stop_capture(&self) {
        let _ = self.send(CaptureCommand::Stop);
    }

    pub async fn update_frame_rate(&self, frame_rate: f64) -> Result<(), CaptureError> {
        let (reply, response) = oneshot::channel();
        self.send(CaptureCommand::UpdateFrameRate { frame_rate, reply })?;
        response.await.map_err(|_| runtime_gone())?
    }

    pub fn set_target_window(&self, target: Weak<dyn TargetWindow>) {
        let _ = self.send(CaptureCommand::SetTarget(target));
    }

    pub fn set_target(&self, target: &Arc<dyn TargetWindow>) {
        self.set_target_window(Arc::downgrade(target));
    }

    /// `None` once the runtime has stopped
    pub async fn status(&self) -> Option<CaptureStatus> {
        let (reply, response) = oneshot::channel();
        self.send(CaptureCommand::Status(reply)).ok()?;
        response.await.ok()
    }

    pub fn shutdown(&self) {
        let _ = self.send(CaptureCommand::Shutdown);
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, command: CaptureCommand) -> Result<(), CaptureError> {
        self.tx.send(command).map_err(|_| runtime_gone())
    }
}

fn runtime_gone() -> CaptureError {
    CaptureError::unavailable("capture runtime has shut down")
}
