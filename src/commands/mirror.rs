use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use glassview_capture::capture::{create_window_capturer, CaptureFrame, WindowCapturer};
use glassview_capture::controller::{CaptureSubscriber, ControllerOptions};
use glassview_capture::error::CaptureError;
use glassview_capture::platform::PlatformTargetWindow;
use glassview_capture::runtime::{CaptureHandle, CaptureRuntime};
use glassview_capture::visibility::{StaticTarget, TargetWindow};
use glassview_capture::window_filter::WindowIdentifier;
use glassview_capture::PollingEnvironment;

use crate::cli::MirrorArgs;
use crate::commands::windows;
use crate::settings::Settings;
use crate::settings_io;

/// Subscriber for headless runs: logs frames and signals when the frame budget is spent
struct FrameReporter {
    frames: u64,
    errors: u64,
    limit: Option<u64>,
    started: Instant,
    done: Option<oneshot::Sender<MirrorSummary>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct MirrorSummary {
    frames: u64,
    errors: u64,
}

impl FrameReporter {
    fn new(limit: Option<u64>, done: oneshot::Sender<MirrorSummary>) -> Self {
        Self {
            frames: 0,
            errors: 0,
            limit,
            started: Instant::now(),
            done: Some(done),
        }
    }

    fn summary(&self) -> MirrorSummary {
        MirrorSummary {
            frames: self.frames,
            errors: self.errors,
        }
    }
}

impl CaptureSubscriber for FrameReporter {
    fn on_frame(&mut self, frame: CaptureFrame) {
        self.frames += 1;
        tracing::debug!(
            frame = self.frames,
            width = frame.width,
            height = frame.height,
            window_id = frame.window_id,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Frame received"
        );

        if self.limit.is_some_and(|limit| self.frames >= limit) {
            let summary = self.summary();
            if let Some(done) = self.done.take() {
                let _ = done.send(summary);
            }
        }
    }

    fn on_error(&mut self, error: &CaptureError) {
        self.errors += 1;
        tracing::warn!(error = %error, count = self.errors, "Capture failed");
    }

    fn on_active_state_changed(&mut self, active: bool) {
        if active {
            tracing::info!("Capture active");
        } else {
            tracing::info!("Capture paused");
        }
    }
}

impl Drop for FrameReporter {
    fn drop(&mut self) {
        tracing::info!(
            frames = self.frames,
            errors = self.errors,
            seconds = self.started.elapsed().as_secs_f64(),
            "Mirror finished"
        );
    }
}

pub async fn run_mirror(settings: &mut Settings, args: &MirrorArgs) -> Result<()> {
    let window = windows::resolve_window(args.window, settings)?;
    let frame_rate = settings.effective_frame_rate(args.fps);

    let capturer: Arc<dyn WindowCapturer> =
        Arc::from(create_window_capturer().context("Failed to create window capturer")?);

    let (done_tx, done_rx) = oneshot::channel();
    let reporter = FrameReporter::new(args.frames, done_tx);
    let options = ControllerOptions {
        allow_host_windows: settings.window_filter.dev_mode,
        ..ControllerOptions::default()
    };
    let (runtime, handle) = CaptureRuntime::with_options(capturer, Box::new(reporter), options);

    // The controller only holds a weak reference; keep the target alive for the run.
    let target: Arc<dyn TargetWindow> = match args.target {
        Some(id) => Arc::new(PlatformTargetWindow::new(id)),
        None => Arc::new(StaticTarget::fully_visible()),
    };
    handle.set_target(&target);

    let poller = args.target.map(|_| {
        runtime.attach(Box::new(PollingEnvironment::from_millis(
            settings.visibility_poll_ms,
        )))
    });
    let runtime_task = tokio::spawn(runtime.run());

    let session = match handle.start_capture(window.clone(), frame_rate).await {
        Ok(session) => session,
        Err(e) => {
            shut_down(&handle, runtime_task, poller).await?;
            return Err(e)
                .with_context(|| format!("Could not mirror \"{}\"", window.display_title()));
        }
    };
    tracing::info!(
        %session,
        window = %window.display_title(),
        window_id = window.id,
        frame_rate,
        "Mirroring started"
    );

    if settings.remember_last_window && !args.no_remember {
        settings.last_window = Some(WindowIdentifier::of(&window));
        if args.fps.is_some() {
            settings.frame_rate = frame_rate;
        }
        if let Err(e) = settings_io::persist_settings_to_disk(settings) {
            tracing::warn!(error = %e, "Failed to remember window");
        }
    }

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                tracing::warn!(error = %e, "Ctrl-C handler failed");
            }
            tracing::info!("Interrupted");
        }
        summary = done_rx => {
            if let Ok(summary) = summary {
                tracing::info!(frames = summary.frames, errors = summary.errors, "Frame limit reached");
            }
        }
    }

    if let Some(status) = handle.status().await {
        tracing::debug!(?status, "Final capture status");
    }
    handle.stop_capture();
    shut_down(&handle, runtime_task, poller).await
}

/// Stop the runtime task and the visibility poller feeding it
async fn shut_down(
    handle: &CaptureHandle,
    runtime_task: JoinHandle<()>,
    poller: Option<JoinHandle<()>>,
) -> Result<()> {
    if let Some(poller) = poller {
        poller.abort();
    }
    handle.shutdown();
    runtime_task.await.context("Capture runtime task failed")
}
