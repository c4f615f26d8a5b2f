//! Tick scheduling and capture dispatch
//!
//! The controller decides *when* ticks should run and *whether* a capture should be
//! issued; a `TickScheduler` carries that out. The real implementation drives tokio
//! timers and blocking workers and reports back through the controller's event
//! channel. Tests substitute a recording scheduler.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::capture::{SourceWindow, WindowCapturer};
use crate::error::CaptureError;
use crate::events::{ControllerEvent, EventSender, SessionId, TickHandle};

pub trait TickScheduler {
    /// Start a periodic tick source for `session`; the first tick fires immediately
    fn schedule_ticks(&mut self, session: SessionId, interval: Duration) -> TickHandle;

    /// Stop a tick source. Ticks it already queued may still arrive and are ignored
    /// by the controller.
    fn cancel_ticks(&mut self, ticks: TickHandle);

    /// Issue one asynchronous capture; the result comes back as `CaptureCompleted`
    fn request_capture(&mut self, session: SessionId, window: SourceWindow);
}

/// Scheduler backed by the tokio runtime the controller runs on
pub struct TokioScheduler {
    events: EventSender,
    capturer: Arc<dyn WindowCapturer>,
    tickers: HashMap<TickHandle, JoinHandle<()>>,
    next_handle: u64,
}

impl TokioScheduler {
    pub fn new(events: EventSender, capturer: Arc<dyn WindowCapturer>) -> Self {
        Self {
            events,
            capturer,
            tickers: HashMap::new(),
            next_handle: 1,
        }
    }

    /// Number of live tick sources (at most one while the controller is consistent)
    pub fn active_tick_sources(&self) -> usize {
        self.tickers.values().filter(|h| !h.is_finished()).count()
    }
}

impl TickScheduler for TokioScheduler {
    fn schedule_ticks(&mut self, session: SessionId, interval: Duration) -> TickHandle {
        let ticks = TickHandle(self.next_handle);
        self.next_handle += 1;

        let events = self.events.clone();
        let task = tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                timer.tick().await;
                if events
                    .send(ControllerEvent::Tick { session, ticks })
                    .is_err()
                {
                    break;
                }
            }
        });

        tracing::debug!(%session, %ticks, interval_ms = interval.as_millis() as u64, "Tick source scheduled");
        self.tickers.insert(ticks, task);
        ticks
    }

    fn cancel_ticks(&mut self, ticks: TickHandle) {
        if let Some(task) = self.tickers.remove(&ticks) {
            task.abort();
            tracing::debug!(%ticks, "Tick source cancelled");
        }
    }

    fn request_capture(&mut self, session: SessionId, window: SourceWindow) {
        let events = self.events.clone();
        let capturer = Arc::clone(&self.capturer);
        tokio::spawn(async move {
            let window_id = window.id;
            let result = tokio::task::spawn_blocking(move || capturer.capture(&window))
                .await
                .unwrap_or_else(|e| {
                    Err(CaptureError::unavailable(format!(
                        "capture worker for window {} failed: {}",
                        window_id, e
                    )))
                });
            // The controller may already be gone; nothing to deliver to then.
            let _ = events.send(ControllerEvent::CaptureCompleted { session, result });
        });
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, task) in self.tickers.drain() {
            task.abort();
        }
    }
}
