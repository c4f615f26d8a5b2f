//! Capture session controller
//!
//! Owns at most one capture session and decides, from the display window's
//! visibility, whether that session ticks at the requested rate, ticks at the reduced
//! rate, or is paused. All methods run on the thread that drains the controller's
//! event channel; timers and capture calls are delegated to a `TickScheduler`.

use std::sync::{Arc, Weak};

use crate::capture::{CaptureFrame, SourceWindow};
use crate::config::capture::REDUCED_FRAME_RATE;
use crate::environment::EnvironmentEvent;
use crate::error::CaptureError;
use crate::events::{ControllerEvent, SessionId, TickHandle};
use crate::platform_utils::{frame_interval, same_rate, validate_frame_rate};
use crate::scheduler::TickScheduler;
use crate::visibility::{classify, TargetWindow, Visibility};

/// Receives the output of the active session
pub trait CaptureSubscriber: Send {
    fn on_frame(&mut self, frame: CaptureFrame);

    fn on_error(&mut self, error: &CaptureError);

    /// Session became active (ticking) or inactive (paused or stopped)
    fn on_active_state_changed(&mut self, _is_active: bool) {}
}

/// Controller construction options
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Process id of the host; its own windows are rejected as sources
    pub host_pid: u32,
    /// Rate used while the display window is only partially visible
    pub reduced_frame_rate: f64,
    /// Developer mode: accept the host's own windows as sources
    pub allow_host_windows: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            host_pid: std::process::id(),
            reduced_frame_rate: REDUCED_FRAME_RATE,
            allow_host_windows: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveTicks {
    handle: TickHandle,
    frame_rate: f64,
}

#[derive(Debug)]
struct CaptureSession {
    id: SessionId,
    source: SourceWindow,
    requested_frame_rate: f64,
    visibility: Visibility,
    /// `None` while paused
    ticks: Option<ActiveTicks>,
    capture_in_flight: bool,
}

impl CaptureSession {
    fn is_paused(&self) -> bool {
        self.ticks.is_none()
    }
}

pub struct CaptureSessionController<S: TickScheduler> {
    scheduler: S,
    options: ControllerOptions,
    subscriber: Option<Box<dyn CaptureSubscriber>>,
    target: Option<Weak<dyn TargetWindow>>,
    session: Option<CaptureSession>,
    screensaver_active: bool,
    next_session: u64,
}

impl<S: TickScheduler> CaptureSessionController<S> {
    pub fn new(scheduler: S) -> Self {
        Self::with_options(scheduler, ControllerOptions::default())
    }

    pub fn with_options(scheduler: S, options: ControllerOptions) -> Self {
        Self {
            scheduler,
            options,
            subscriber: None,
            target: None,
            session: None,
            screensaver_active: false,
            next_session: 1,
        }
    }

    /// Register the single subscriber, replacing any previous one
    pub fn set_subscriber(&mut self, subscriber: Box<dyn CaptureSubscriber>) {
        self.subscriber = Some(subscriber);
    }

    /// Register the display window whose visibility gates capture
    ///
    /// Held weakly. A change while a session is active applies at the next
    /// visibility check.
    pub fn set_target_window(&mut self, target: Weak<dyn TargetWindow>) {
        self.target = Some(target);
    }

    /// Convenience for callers holding a strong reference
    pub fn set_target(&mut self, target: &Arc<dyn TargetWindow>) {
        self.set_target_window(Arc::downgrade(target));
    }

    /// Begin mirroring `source`, replacing any existing session
    ///
    /// Rejected synchronously (no session change) when the frame rate is outside
    /// [1, 60], the window cannot be captured, or no display window is registered.
    pub fn start_capture(
        &mut self,
        source: SourceWindow,
        frame_rate: f64,
    ) -> Result<SessionId, CaptureError> {
        let frame_rate = validate_frame_rate(frame_rate)?;
        self.validate_source(&source)?;
        if self.target.is_none() {
            return Err(CaptureError::invalid(
                "no display window registered before starting capture",
            ));
        }

        self.stop_capture();

        let id = SessionId(self.next_session);
        self.next_session += 1;

        let visibility = self.current_visibility();
        tracing::info!(
            %id,
            window_id = source.id,
            window = %source.display_title(),
            frame_rate,
            %visibility,
            "Starting capture"
        );

        self.session = Some(CaptureSession {
            id,
            source,
            requested_frame_rate: frame_rate,
            visibility,
            ticks: None,
            capture_in_flight: false,
        });

        let active = match self.desired_rate(visibility, frame_rate) {
            Some(rate) => {
                self.start_ticks(rate);
                true
            }
            None => {
                tracing::info!(%id, "Display window not visible, session starts paused");
                false
            }
        };
        self.notify_active(active);

        Ok(id)
    }

    /// End the current session; a no-op when none exists
    pub fn stop_capture(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        let was_active = session.ticks.is_some();
        if let Some(ticks) = session.ticks {
            self.scheduler.cancel_ticks(ticks.handle);
        }

        tracing::info!(id = %session.id, window_id = session.source.id, "Capture stopped");
        if was_active {
            self.notify_active(false);
        }
    }

    /// Change the requested rate of the current session
    ///
    /// No-op without a session. While paused, or while the reduced rate applies,
    /// only the stored rate changes.
    pub fn update_frame_rate(&mut self, frame_rate: f64) -> Result<(), CaptureError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        let frame_rate = validate_frame_rate(frame_rate)?;
        session.requested_frame_rate = frame_rate;
        let visibility = session.visibility;

        tracing::debug!(id = %session.id, frame_rate, %visibility, "Requested frame rate updated");
        self.apply_rate(self.desired_rate(visibility, frame_rate));
        Ok(())
    }

    /// Handle a host notification; re-evaluates visibility
    pub fn handle_environment(&mut self, event: EnvironmentEvent) {
        match event {
            EnvironmentEvent::ScreensaverStarted => self.screensaver_active = true,
            EnvironmentEvent::ScreensaverStopped => self.screensaver_active = false,
            // Host activation never gates capture
            EnvironmentEvent::AppActivated
            | EnvironmentEvent::AppDeactivated
            | EnvironmentEvent::ActiveSpaceChanged
            | EnvironmentEvent::OcclusionChanged => {}
        }
        tracing::trace!(?event, "Environment changed");
        self.reevaluate_visibility();
    }

    /// Classify the display window again and pause, resume or retime the session
    pub fn reevaluate_visibility(&mut self) {
        if self.session.is_none() {
            return;
        }
        let visibility = self.current_visibility();

        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.visibility != visibility {
            tracing::info!(
                id = %session.id,
                from = %session.visibility,
                to = %visibility,
                "Display window visibility changed"
            );
            session.visibility = visibility;
        }
        let requested = session.requested_frame_rate;

        self.apply_rate(self.desired_rate(visibility, requested));
    }

    /// A tick fired; issue a capture unless one is still in flight
    pub fn on_tick(&mut self, session_id: SessionId, ticks: TickHandle) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.id != session_id {
            return;
        }
        match session.ticks {
            Some(active) if active.handle == ticks => {}
            _ => {
                tracing::trace!(%session_id, %ticks, "Ignoring tick from a cancelled source");
                return;
            }
        }
        if session.capture_in_flight {
            tracing::trace!(%session_id, "Previous capture still in flight, skipping tick");
            return;
        }

        session.capture_in_flight = true;
        let source = session.source.clone();
        self.scheduler.request_capture(session_id, source);
    }

    /// A capture finished; deliver it unless the session ended or is paused
    pub fn on_capture_completed(
        &mut self,
        session_id: SessionId,
        result: Result<CaptureFrame, CaptureError>,
    ) {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!(%session_id, "Discarding capture result, no active session");
            return;
        };
        if session.id != session_id {
            tracing::debug!(%session_id, current = %session.id, "Discarding capture result from a replaced session");
            return;
        }
        session.capture_in_flight = false;
        if session.is_paused() {
            tracing::trace!(%session_id, "Discarding capture result while paused");
            return;
        }

        match result {
            Ok(frame) => {
                tracing::trace!(%session_id, width = frame.width, height = frame.height, "Frame ready");
                if let Some(subscriber) = self.subscriber.as_mut() {
                    subscriber.on_frame(frame);
                }
            }
            Err(error) => {
                tracing::warn!(%session_id, error = %error, "Capture failed, retrying on next tick");
                if let Some(subscriber) = self.subscriber.as_mut() {
                    subscriber.on_error(&error);
                }
            }
        }
    }

    /// Dispatch one event from the controller's channel
    pub fn handle_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::Tick { session, ticks } => self.on_tick(session, ticks),
            ControllerEvent::CaptureCompleted { session, result } => {
                self.on_capture_completed(session, result)
            }
            ControllerEvent::Environment(event) => self.handle_environment(event),
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.session.is_some()
    }

    /// True while a session exists but is not ticking
    pub fn is_paused(&self) -> bool {
        self.session.as_ref().map(|s| s.is_paused()).unwrap_or(false)
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn source_window(&self) -> Option<&SourceWindow> {
        self.session.as_ref().map(|s| &s.source)
    }

    pub fn requested_frame_rate(&self) -> Option<f64> {
        self.session.as_ref().map(|s| s.requested_frame_rate)
    }

    /// Rate ticks are currently scheduled at; `None` while paused or idle
    pub fn effective_frame_rate(&self) -> Option<f64> {
        self.session
            .as_ref()
            .and_then(|s| s.ticks)
            .map(|t| t.frame_rate)
    }

    /// Visibility recorded at the last check; `None` without a session
    pub fn visibility(&self) -> Option<Visibility> {
        self.session.as_ref().map(|s| s.visibility)
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    fn validate_source(&self, source: &SourceWindow) -> Result<(), CaptureError> {
        if !self.options.allow_host_windows && source.owner_pid == self.options.host_pid {
            return Err(CaptureError::invalid(format!(
                "window {} belongs to this application",
                source.id
            )));
        }
        if !source.on_screen {
            return Err(CaptureError::invalid(format!(
                "window {} is not on screen",
                source.id
            )));
        }
        if source.bounds.is_empty() {
            return Err(CaptureError::invalid(format!(
                "window {} has empty bounds",
                source.id
            )));
        }
        Ok(())
    }

    fn current_visibility(&self) -> Visibility {
        if self.screensaver_active {
            return Visibility::Hidden;
        }
        self.target
            .as_ref()
            .and_then(Weak::upgrade)
            .and_then(|target| target.snapshot())
            .map(|snapshot| classify(&snapshot))
            .unwrap_or(Visibility::Hidden)
    }

    fn desired_rate(&self, visibility: Visibility, requested: f64) -> Option<f64> {
        match visibility {
            Visibility::Hidden => None,
            Visibility::PartiallyVisible => Some(self.options.reduced_frame_rate),
            Visibility::FullyVisible => Some(requested),
        }
    }

    /// Bring the tick source in line with `desired`; no churn when already there
    fn apply_rate(&mut self, desired: Option<f64>) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let id = session.id;
        let current = session.ticks;

        match (current, desired) {
            (None, None) => {}
            (Some(active), Some(rate)) if same_rate(active.frame_rate, rate) => {}
            (Some(active), None) => {
                self.scheduler.cancel_ticks(active.handle);
                if let Some(session) = self.session.as_mut() {
                    session.ticks = None;
                }
                tracing::info!(%id, "Capture paused");
                self.notify_active(false);
            }
            (Some(active), Some(rate)) => {
                self.scheduler.cancel_ticks(active.handle);
                if let Some(session) = self.session.as_mut() {
                    session.ticks = None;
                }
                tracing::debug!(%id, from = active.frame_rate, to = rate, "Rescheduling ticks");
                self.start_ticks(rate);
            }
            (None, Some(rate)) => {
                tracing::info!(%id, frame_rate = rate, "Capture resumed");
                self.start_ticks(rate);
                self.notify_active(true);
            }
        }
    }

    fn start_ticks(&mut self, rate: f64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        debug_assert!(session.ticks.is_none(), "tick source already live");
        let handle = self
            .scheduler
            .schedule_ticks(session.id, frame_interval(rate));
        session.ticks = Some(ActiveTicks {
            handle,
            frame_rate: rate,
        });
    }

    fn notify_active(&mut self, is_active: bool) {
        if let Some(subscriber) = self.subscriber.as_mut() {
            subscriber.on_active_state_changed(is_active);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::WindowBounds;
    use crate::visibility::StaticTarget;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Schedule(SessionId, TickHandle, Duration),
        Cancel(TickHandle),
        Capture(SessionId, u32),
    }

    #[derive(Default)]
    struct RecordingScheduler {
        calls: Arc<Mutex<Vec<Call>>>,
        next: u64,
    }

    impl TickScheduler for RecordingScheduler {
        fn schedule_ticks(&mut self, session: SessionId, interval: Duration) -> TickHandle {
            self.next += 1;
            let handle = TickHandle(self.next);
            self.calls
                .lock()
                .unwrap()
                .push(Call::Schedule(session, handle, interval));
            handle
        }

        fn cancel_ticks(&mut self, ticks: TickHandle) {
            self.calls.lock().unwrap().push(Call::Cancel(ticks));
        }

        fn request_capture(&mut self, session: SessionId, window: SourceWindow) {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Capture(session, window.id));
        }
    }

    impl RecordingScheduler {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        /// Tick sources scheduled and not cancelled
        fn live_sources(&self) -> Vec<TickHandle> {
            let mut live = Vec::new();
            for call in self.calls() {
                match call {
                    Call::Schedule(_, h, _) => live.push(h),
                    Call::Cancel(h) => live.retain(|x| *x != h),
                    Call::Capture(..) => {}
                }
            }
            live
        }

        fn captures(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, Call::Capture(..)))
                .count()
        }

        fn schedules(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, Call::Schedule(..)))
                .count()
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Delivered {
        Frame(u32),
        Error(CaptureError),
        Active(bool),
    }

    #[derive(Clone, Default)]
    struct RecordingSubscriber {
        events: Arc<Mutex<Vec<Delivered>>>,
    }

    impl RecordingSubscriber {
        fn events(&self) -> Vec<Delivered> {
            self.events.lock().unwrap().clone()
        }
    }

    impl CaptureSubscriber for RecordingSubscriber {
        fn on_frame(&mut self, frame: CaptureFrame) {
            self.events
                .lock()
                .unwrap()
                .push(Delivered::Frame(frame.window_id));
        }

        fn on_error(&mut self, error: &CaptureError) {
            self.events
                .lock()
                .unwrap()
                .push(Delivered::Error(error.clone()));
        }

        fn on_active_state_changed(&mut self, is_active: bool) {
            self.events.lock().unwrap().push(Delivered::Active(is_active));
        }
    }

    const HOST_PID: u32 = 4242;

    struct Harness {
        controller: CaptureSessionController<RecordingScheduler>,
        subscriber: RecordingSubscriber,
        target: Arc<StaticTarget>,
    }

    impl Harness {
        fn new(ratio: f64) -> Self {
            let mut controller = CaptureSessionController::with_options(
                RecordingScheduler::default(),
                ControllerOptions {
                    host_pid: HOST_PID,
                    reduced_frame_rate: 1.0,
                    allow_host_windows: false,
                },
            );
            let subscriber = RecordingSubscriber::default();
            controller.set_subscriber(Box::new(subscriber.clone()));
            let target = Arc::new(StaticTarget::with_ratio(ratio));
            let target_dyn: Arc<dyn TargetWindow> = target.clone();
            controller.set_target(&target_dyn);
            Self {
                controller,
                subscriber,
                target,
            }
        }

        fn current_ticks(&self) -> TickHandle {
            *self
                .controller
                .scheduler()
                .live_sources()
                .last()
                .expect("no live tick source")
        }

        fn tick(&mut self) {
            let session = self.controller.session_id().expect("no session");
            let ticks = self.current_ticks();
            self.controller.on_tick(session, ticks);
        }
    }

    fn source(id: u32) -> SourceWindow {
        SourceWindow {
            id,
            owner_pid: 777,
            app_name: "Notes".to_string(),
            title: format!("Note {}", id),
            bounds: WindowBounds::new(10.0, 10.0, 800.0, 600.0),
            on_screen: true,
        }
    }

    fn frame(window_id: u32) -> CaptureFrame {
        CaptureFrame::from_rgba(window_id, 1, 1, vec![0, 0, 0, 255])
    }

    #[test]
    fn start_schedules_at_requested_rate_when_fully_visible() {
        let mut h = Harness::new(0.5);
        let id = h.controller.start_capture(source(1), 10.0).unwrap();

        let calls = h.controller.scheduler().calls();
        assert_eq!(
            calls,
            vec![Call::Schedule(id, TickHandle(1), Duration::from_millis(100))]
        );
        assert_eq!(h.controller.effective_frame_rate(), Some(10.0));
        assert!(!h.controller.is_paused());
        assert_eq!(h.subscriber.events(), vec![Delivered::Active(true)]);
    }

    #[test]
    fn partially_visible_target_runs_at_reduced_rate() {
        let mut h = Harness::new(0.2);
        h.controller.start_capture(source(1), 10.0).unwrap();

        assert_eq!(h.controller.visibility(), Some(Visibility::PartiallyVisible));
        assert_eq!(h.controller.effective_frame_rate(), Some(1.0));
        assert_eq!(h.controller.requested_frame_rate(), Some(10.0));

        h.target.set_ratio(0.31);
        h.controller.handle_environment(EnvironmentEvent::OcclusionChanged);
        assert_eq!(h.controller.effective_frame_rate(), Some(10.0));
        assert_eq!(h.controller.scheduler().live_sources().len(), 1);
    }

    #[test]
    fn hidden_target_starts_paused() {
        let mut h = Harness::new(0.05);
        h.controller.start_capture(source(1), 30.0).unwrap();

        assert!(h.controller.is_capturing());
        assert!(h.controller.is_paused());
        assert_eq!(h.controller.scheduler().schedules(), 0);
        assert_eq!(h.subscriber.events(), vec![Delivered::Active(false)]);
    }

    #[test]
    fn restart_replaces_session_without_orphaned_ticks() {
        let mut h = Harness::new(1.0);
        let first = h.controller.start_capture(source(1), 5.0).unwrap();
        let second = h.controller.start_capture(source(2), 20.0).unwrap();

        assert_ne!(first, second);
        assert_eq!(h.controller.scheduler().live_sources(), vec![TickHandle(2)]);
        assert_eq!(h.controller.source_window().map(|w| w.id), Some(2));

        // Cancel of the old source happens before the new one is scheduled
        let calls = h.controller.scheduler().calls();
        let cancel = calls
            .iter()
            .position(|c| *c == Call::Cancel(TickHandle(1)))
            .unwrap();
        let schedule = calls
            .iter()
            .position(|c| matches!(c, Call::Schedule(s, _, _) if *s == second))
            .unwrap();
        assert!(cancel < schedule);
    }

    #[test]
    fn stop_twice_is_a_noop() {
        let mut h = Harness::new(1.0);
        h.controller.start_capture(source(1), 5.0).unwrap();

        h.controller.stop_capture();
        let after_first = h.controller.scheduler().calls();
        h.controller.stop_capture();

        assert_eq!(h.controller.scheduler().calls(), after_first);
        assert!(!h.controller.is_capturing());
        assert!(h.controller.scheduler().live_sources().is_empty());
    }

    #[test]
    fn update_frame_rate_without_session_is_noop() {
        let mut h = Harness::new(1.0);
        assert!(h.controller.update_frame_rate(12.0).is_ok());
        assert!(h.controller.scheduler().calls().is_empty());
    }

    #[test]
    fn update_frame_rate_reschedules_running_session() {
        let mut h = Harness::new(1.0);
        h.controller.start_capture(source(1), 5.0).unwrap();
        h.controller.update_frame_rate(20.0).unwrap();

        assert_eq!(h.controller.effective_frame_rate(), Some(20.0));
        assert_eq!(h.controller.scheduler().live_sources(), vec![TickHandle(2)]);

        // Same rate again: no churn
        let before = h.controller.scheduler().calls().len();
        h.controller.update_frame_rate(20.0).unwrap();
        assert_eq!(h.controller.scheduler().calls().len(), before);
    }

    #[test]
    fn rate_change_keeps_capture_in_flight() {
        let mut h = Harness::new(1.0);
        let id = h.controller.start_capture(source(1), 5.0).unwrap();
        h.tick();
        assert_eq!(h.controller.scheduler().captures(), 1);

        h.controller.update_frame_rate(20.0).unwrap();
        assert_eq!(h.current_ticks(), TickHandle(2));

        // Still one capture outstanding across the reschedule
        h.tick();
        assert_eq!(h.controller.scheduler().captures(), 1);

        h.controller.on_capture_completed(id, Ok(frame(1)));
        assert_eq!(
            h.subscriber.events(),
            vec![Delivered::Active(true), Delivered::Frame(1)]
        );

        h.tick();
        assert_eq!(h.controller.scheduler().captures(), 2);
    }

    #[test]
    fn reduced_rate_switch_keeps_capture_in_flight() {
        let mut h = Harness::new(1.0);
        let id = h.controller.start_capture(source(1), 20.0).unwrap();
        h.tick();

        h.target.set_ratio(0.2);
        h.controller.reevaluate_visibility();
        assert_eq!(h.controller.visibility(), Some(Visibility::PartiallyVisible));
        assert_eq!(h.controller.effective_frame_rate(), Some(1.0));
        assert_eq!(h.current_ticks(), TickHandle(2));

        h.controller.on_capture_completed(id, Ok(frame(1)));
        assert_eq!(
            h.subscriber.events(),
            vec![Delivered::Active(true), Delivered::Frame(1)]
        );

        h.tick();
        assert_eq!(h.controller.scheduler().captures(), 2);
    }

    #[test]
    fn update_frame_rate_while_paused_does_not_tick() {
        let mut h = Harness::new(0.01);
        h.controller.start_capture(source(1), 5.0).unwrap();
        h.controller.update_frame_rate(25.0).unwrap();

        assert_eq!(h.controller.requested_frame_rate(), Some(25.0));
        assert!(h.controller.is_paused());
        assert_eq!(h.controller.scheduler().schedules(), 0);
    }

    #[test]
    fn update_frame_rate_rejects_out_of_range() {
        let mut h = Harness::new(1.0);
        h.controller.start_capture(source(1), 5.0).unwrap();
        let err = h.controller.update_frame_rate(0.0).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidConfiguration { .. }));
        assert_eq!(h.controller.requested_frame_rate(), Some(5.0));
    }

    #[test]
    fn partially_visible_ignores_requested_rate_changes() {
        let mut h = Harness::new(0.1);
        h.controller.start_capture(source(1), 5.0).unwrap();
        let before = h.controller.scheduler().calls().len();

        h.controller.update_frame_rate(40.0).unwrap();

        assert_eq!(h.controller.scheduler().calls().len(), before);
        assert_eq!(h.controller.effective_frame_rate(), Some(1.0));
    }

    #[test]
    fn hidden_then_visible_resumes_at_requested_rate() {
        let mut h = Harness::new(1.0);
        h.controller.start_capture(source(1), 15.0).unwrap();

        h.target.set_occlusion_visible(false);
        h.controller.handle_environment(EnvironmentEvent::OcclusionChanged);
        assert!(h.controller.is_paused());
        assert!(h.controller.scheduler().live_sources().is_empty());

        h.target.set_occlusion_visible(true);
        h.controller.handle_environment(EnvironmentEvent::OcclusionChanged);
        assert!(!h.controller.is_paused());
        assert_eq!(h.controller.effective_frame_rate(), Some(15.0));

        assert_eq!(
            h.subscriber.events(),
            vec![
                Delivered::Active(true),
                Delivered::Active(false),
                Delivered::Active(true)
            ]
        );
    }

    #[test]
    fn repeated_evaluation_causes_no_timer_churn() {
        let mut h = Harness::new(1.0);
        h.controller.start_capture(source(1), 15.0).unwrap();
        let before = h.controller.scheduler().calls();

        h.controller.handle_environment(EnvironmentEvent::OcclusionChanged);
        h.controller.handle_environment(EnvironmentEvent::AppActivated);
        h.controller.handle_environment(EnvironmentEvent::AppDeactivated);

        assert_eq!(h.controller.scheduler().calls(), before);
        assert_eq!(h.subscriber.events(), vec![Delivered::Active(true)]);
    }

    #[test]
    fn other_space_pauses_and_app_activation_does_not_gate() {
        let mut h = Harness::new(1.0);
        h.controller.start_capture(source(1), 15.0).unwrap();

        h.target.set_on_active_space(false);
        h.controller.handle_environment(EnvironmentEvent::ActiveSpaceChanged);
        assert!(h.controller.is_paused());

        // Activating the host app alone does not resume while on another space
        h.controller.handle_environment(EnvironmentEvent::AppActivated);
        assert!(h.controller.is_paused());

        h.target.set_on_active_space(true);
        h.controller.handle_environment(EnvironmentEvent::AppDeactivated);
        assert!(!h.controller.is_paused());
    }

    #[test]
    fn screensaver_pauses_until_stopped() {
        let mut h = Harness::new(1.0);
        h.controller.start_capture(source(1), 15.0).unwrap();

        h.controller.handle_environment(EnvironmentEvent::ScreensaverStarted);
        assert!(h.controller.is_paused());
        assert_eq!(h.controller.visibility(), Some(Visibility::Hidden));

        h.controller.handle_environment(EnvironmentEvent::ScreensaverStopped);
        assert_eq!(h.controller.effective_frame_rate(), Some(15.0));
    }

    #[test]
    fn dropped_target_classifies_hidden() {
        let mut h = Harness::new(1.0);
        h.controller.start_capture(source(1), 15.0).unwrap();

        let replacement: Arc<dyn TargetWindow> = Arc::new(StaticTarget::fully_visible());
        h.controller.set_target(&replacement);
        drop(replacement);

        // Takes effect on the next visibility check
        assert!(!h.controller.is_paused());
        h.controller.reevaluate_visibility();
        assert!(h.controller.is_paused());
    }

    #[test]
    fn tick_issues_capture_and_frame_is_delivered() {
        let mut h = Harness::new(1.0);
        let id = h.controller.start_capture(source(3), 15.0).unwrap();
        h.tick();

        assert_eq!(h.controller.scheduler().captures(), 1);
        h.controller.on_capture_completed(id, Ok(frame(3)));

        assert_eq!(
            h.subscriber.events(),
            vec![Delivered::Active(true), Delivered::Frame(3)]
        );
    }

    #[test]
    fn failed_capture_reports_once_and_next_tick_retries() {
        let mut h = Harness::new(1.0);
        let id = h.controller.start_capture(source(3), 15.0).unwrap();

        h.tick();
        let error = CaptureError::unavailable("window transiently unavailable");
        h.controller.on_capture_completed(id, Err(error.clone()));

        assert!(h.controller.is_capturing());
        h.tick();
        assert_eq!(h.controller.scheduler().captures(), 2);

        let errors: Vec<_> = h
            .subscriber
            .events()
            .into_iter()
            .filter(|e| matches!(e, Delivered::Error(_)))
            .collect();
        assert_eq!(errors, vec![Delivered::Error(error)]);
    }

    #[test]
    fn at_most_one_capture_in_flight() {
        let mut h = Harness::new(1.0);
        let id = h.controller.start_capture(source(3), 60.0).unwrap();

        h.tick();
        h.tick();
        h.tick();
        assert_eq!(h.controller.scheduler().captures(), 1);

        h.controller.on_capture_completed(id, Ok(frame(3)));
        h.tick();
        assert_eq!(h.controller.scheduler().captures(), 2);
    }

    #[test]
    fn stale_ticks_are_ignored() {
        let mut h = Harness::new(1.0);
        let id = h.controller.start_capture(source(3), 5.0).unwrap();
        let old = h.current_ticks();
        h.controller.update_frame_rate(30.0).unwrap();

        let current = h.current_ticks();
        h.controller.on_tick(id, old);
        h.controller.on_tick(SessionId(999), current);
        assert_eq!(h.controller.scheduler().captures(), 0);
    }

    #[test]
    fn results_after_stop_are_discarded() {
        let mut h = Harness::new(1.0);
        let id = h.controller.start_capture(source(3), 15.0).unwrap();
        h.tick();
        h.controller.stop_capture();

        h.controller.on_capture_completed(id, Ok(frame(3)));
        h.controller
            .on_capture_completed(id, Err(CaptureError::unavailable("late")));

        assert_eq!(
            h.subscriber.events(),
            vec![Delivered::Active(true), Delivered::Active(false)]
        );
    }

    #[test]
    fn results_from_replaced_session_are_discarded() {
        let mut h = Harness::new(1.0);
        let old = h.controller.start_capture(source(3), 15.0).unwrap();
        h.tick();
        h.controller.start_capture(source(4), 15.0).unwrap();

        h.controller.on_capture_completed(old, Ok(frame(3)));
        assert!(!h
            .subscriber
            .events()
            .iter()
            .any(|e| matches!(e, Delivered::Frame(_))));
    }

    #[test]
    fn results_while_paused_are_discarded() {
        let mut h = Harness::new(1.0);
        let id = h.controller.start_capture(source(3), 15.0).unwrap();
        h.tick();

        h.target.set_ratio(0.0);
        h.controller.reevaluate_visibility();
        h.controller.on_capture_completed(id, Ok(frame(3)));

        assert!(!h
            .subscriber
            .events()
            .iter()
            .any(|e| matches!(e, Delivered::Frame(_))));

        // The in-flight slot is released, so the resumed session captures again
        h.target.set_ratio(1.0);
        h.controller.reevaluate_visibility();
        h.tick();
        assert_eq!(h.controller.scheduler().captures(), 2);
    }

    #[test]
    fn rejects_invalid_configuration_without_touching_session() {
        let mut h = Harness::new(1.0);
        let id = h.controller.start_capture(source(1), 10.0).unwrap();

        let mut own = source(2);
        own.owner_pid = HOST_PID;
        let mut off_screen = source(3);
        off_screen.on_screen = false;
        let mut empty = source(4);
        empty.bounds = WindowBounds::new(0.0, 0.0, 0.0, 0.0);

        for (window, rate) in [
            (own, 10.0),
            (off_screen, 10.0),
            (empty, 10.0),
            (source(5), 0.5),
            (source(5), 61.0),
            (source(5), f64::NAN),
        ] {
            let err = h.controller.start_capture(window, rate).unwrap_err();
            assert!(matches!(err, CaptureError::InvalidConfiguration { .. }));
        }

        assert_eq!(h.controller.session_id(), Some(id));
        assert_eq!(h.controller.scheduler().live_sources().len(), 1);
    }

    #[test]
    fn host_windows_accepted_when_allowed() {
        let mut controller = CaptureSessionController::with_options(
            RecordingScheduler::default(),
            ControllerOptions {
                host_pid: HOST_PID,
                reduced_frame_rate: 1.0,
                allow_host_windows: true,
            },
        );
        let target: Arc<dyn TargetWindow> = Arc::new(StaticTarget::fully_visible());
        controller.set_target(&target);

        let mut own = source(2);
        own.owner_pid = HOST_PID;
        assert!(controller.start_capture(own, 10.0).is_ok());
        assert!(controller.is_capturing());
    }

    #[test]
    fn start_requires_display_window() {
        let mut controller =
            CaptureSessionController::new(RecordingScheduler::default());
        let err = controller.start_capture(source(1), 10.0).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidConfiguration { .. }));
        assert!(!controller.is_capturing());
    }
}
