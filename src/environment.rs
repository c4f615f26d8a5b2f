//! Host environment notifications
//!
//! The controller never reads global window-server state on its own. Whatever hosts
//! it (a GUI shell, the CLI, a test) injects changes through an `EnvironmentSender`,
//! either directly or by spawning an `EnvironmentSource`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::events::{ControllerEvent, EventSender};

/// Changes that can alter the display window's visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnvironmentEvent {
    AppActivated,
    AppDeactivated,
    ScreensaverStarted,
    ScreensaverStopped,
    ActiveSpaceChanged,
    OcclusionChanged,
}

/// Injection point for environment changes
#[derive(Debug, Clone)]
pub struct EnvironmentSender {
    tx: EventSender,
}

impl EnvironmentSender {
    pub fn new(tx: EventSender) -> Self {
        Self { tx }
    }

    /// Forward one change to the controller
    ///
    /// Returns false once the controller has shut down.
    pub fn notify(&self, event: EnvironmentEvent) -> bool {
        self.tx.send(ControllerEvent::Environment(event)).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// A producer of environment changes that runs on its own task
pub trait EnvironmentSource: Send + 'static {
    /// Start producing events into `sink`
    ///
    /// The task should end on its own once `sink` reports the controller is gone.
    fn spawn(self: Box<Self>, sink: EnvironmentSender) -> JoinHandle<()>;
}

/// Re-checks the display window on a fixed interval
///
/// For hosts that cannot subscribe to occlusion or space-change notifications. Each
/// poll is reported as `OcclusionChanged`; the controller's re-evaluation is a no-op
/// when nothing actually changed.
#[derive(Debug, Clone)]
pub struct PollingEnvironment {
    interval: Duration,
}

impl PollingEnvironment {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms.max(1)))
    }
}

impl Default for PollingEnvironment {
    fn default() -> Self {
        Self::from_millis(crate::config::visibility::DEFAULT_POLL_INTERVAL_MS)
    }
}

impl EnvironmentSource for PollingEnvironment {
    fn spawn(self: Box<Self>, sink: EnvironmentSender) -> JoinHandle<()> {
        let period = self.interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately; the controller already evaluated
            // visibility when the session started.
            interval.tick().await;

            loop {
                interval.tick().await;
                if !sink.notify(EnvironmentEvent::OcclusionChanged) {
                    tracing::debug!("Visibility poller stopping, controller is gone");
                    break;
                }
            }
        })
    }
}
