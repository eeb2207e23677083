// THEORY:
// The `CaptureSession` owns the lifecycle of a frame source and the background task
// that drains it into a `FrameChannel`. It is the only place in the crate that knows
// about time, frame rates, and failing devices.
//
// Key architectural principles:
// 1.  **Explicit lifecycle**: a session moves through
//     Closed -> Opening -> Opened -> Capturing -> Stopped, and can fall into Error
//     from any state but Closed. Every move is checked against `can_transition_to`,
//     so an out-of-order call is a returned error rather than a silent misstep.
// 2.  **Observable state**: the current state lives in a `watch` channel. Callers
//     can poll it with `state()` or await a particular state via `subscribe()`.
// 3.  **Failure stays here**: a source error is logged and parks the session in
//     Error. The channel keeps whatever it last held, so consumers keep sampling
//     the last good frame.
// 4.  **Source ownership round-trips**: while capturing, the task owns the source;
//     `stop_capture` joins the task and takes the source back so capture can be
//     restarted.
// 5.  **Panics are failures too**: the capture loop runs under a small supervisor
//     task. If the loop panics (a misbehaving source, a broken timer) the
//     supervisor parks the session in Error, so nobody waits on a Capturing state
//     that will never change. The source is lost in that case.

use crate::acquisition::source::{FrameSource, SourceInfo};
use crate::error::{Result, VisionError};
use crate::frame_channel::FrameChannel;
use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Slowest supported capture rate: one frame an hour.
pub const MIN_FPS: f64 = 1.0 / 3600.0;
/// Fastest supported capture rate.
pub const MAX_FPS: f64 = 10_000.0;

/// Tick period for a capture rate of `fps` frames per second.
///
/// Rates outside `MIN_FPS..=MAX_FPS` (or not a number) are rejected, so the
/// period is always a representable, non-zero `Duration`.
pub fn frame_period(fps: f64) -> Result<Duration> {
    if !(MIN_FPS..=MAX_FPS).contains(&fps) {
        return Err(VisionError::config(format!(
            "frame rate must be within {MIN_FPS}..={MAX_FPS} fps, got {fps}"
        )));
    }
    match Duration::try_from_secs_f64(1.0 / fps) {
        Ok(period) if !period.is_zero() => Ok(period),
        _ => Err(VisionError::config(format!("frame rate {fps} has no usable tick period"))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Opening,
    Opened,
    Capturing,
    Stopped,
    Error(String),
}

impl SessionState {
    pub fn can_transition_to(&self, next: &SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Closed, Opening)
                | (Opening, Opened)
                | (Opened, Capturing)
                | (Opened, Closed)
                | (Capturing, Stopped)
                | (Stopped, Capturing)
                | (Stopped, Closed)
                | (Opening | Opened | Capturing | Stopped, Error(_))
                | (Error(_), Closed)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Closed => "closed",
            SessionState::Opening => "opening",
            SessionState::Opened => "opened",
            SessionState::Capturing => "capturing",
            SessionState::Stopped => "stopped",
            SessionState::Error(_) => "error",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Error(reason) => write!(f, "error ({reason})"),
            other => f.write_str(other.name()),
        }
    }
}

fn advance(state: &watch::Sender<SessionState>, next: SessionState) -> Result<()> {
    let mut outcome = Ok(());
    state.send_if_modified(|current| {
        if current.can_transition_to(&next) {
            info!("Capture session {} -> {}", current, next);
            *current = next.clone();
            true
        } else {
            outcome = Err(VisionError::InvalidTransition {
                from: current.name().to_string(),
                to: next.name().to_string(),
            });
            false
        }
    });
    outcome
}

struct CaptureTask<S> {
    stop: watch::Sender<bool>,
    /// Resolves to the source, or `None` if the capture loop panicked.
    handle: JoinHandle<Option<S>>,
}

/// Drives a `FrameSource` and publishes its frames into a shared `FrameChannel`.
pub struct CaptureSession<S: FrameSource> {
    channel: Arc<FrameChannel>,
    state: Arc<watch::Sender<SessionState>>,
    source: Option<S>,
    info: Option<SourceInfo>,
    task: Option<CaptureTask<S>>,
}

impl<S: FrameSource> CaptureSession<S> {
    pub fn new(channel: Arc<FrameChannel>) -> Self {
        let (state, _) = watch::channel(SessionState::Closed);
        Self {
            channel,
            state: Arc::new(state),
            source: None,
            info: None,
            task: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn channel(&self) -> &Arc<FrameChannel> {
        &self.channel
    }

    /// What the source reported when it was opened.
    pub fn source_info(&self) -> Option<SourceInfo> {
        self.info
    }

    /// Opens `source`. On failure the session lands in `Error` and the error is returned.
    pub fn open(&mut self, mut source: S) -> Result<SourceInfo> {
        advance(&self.state, SessionState::Opening)?;
        match source.open() {
            Ok(info) => {
                info!(
                    "Source {} opened at {}x{}",
                    source.name(),
                    info.width,
                    info.height
                );
                self.source = Some(source);
                self.info = Some(info);
                advance(&self.state, SessionState::Opened)?;
                Ok(info)
            }
            Err(e) => {
                warn!("Source {} failed to open: {}", source.name(), e);
                advance(&self.state, SessionState::Error(e.to_string()))?;
                Err(e)
            }
        }
    }

    /// Spawns the capture loop on the current tokio runtime, ticking at `fps`.
    pub fn start_capture(&mut self, fps: f64) -> Result<()> {
        let period = frame_period(fps)?;
        let current = self.state();
        if !current.can_transition_to(&SessionState::Capturing) {
            return Err(VisionError::InvalidTransition {
                from: current.name().to_string(),
                to: SessionState::Capturing.name().to_string(),
            });
        }
        let source = self
            .source
            .take()
            .ok_or_else(|| VisionError::source_message("no source to capture from"))?;
        advance(&self.state, SessionState::Capturing)?;

        let (stop, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(supervise(
            source,
            Arc::clone(&self.channel),
            Arc::clone(&self.state),
            stop_rx,
            period,
        ));
        self.task = Some(CaptureTask { stop, handle });
        Ok(())
    }

    /// Stops the capture loop and reclaims the source.
    ///
    /// If the loop already ended (end of stream or error) this just collects it.
    pub async fn stop_capture(&mut self) -> Result<()> {
        let task = self.task.take().ok_or_else(|| VisionError::InvalidTransition {
            from: self.state().name().to_string(),
            to: SessionState::Stopped.name().to_string(),
        })?;

        let _ = task.stop.send(true);
        let source = match task.handle.await {
            Ok(source) => source,
            Err(e) => {
                let message = format!("capture task did not finish: {e}");
                self.fail(&message);
                return Err(VisionError::CaptureTask { message });
            }
        };
        let Some(source) = source else {
            return Err(VisionError::CaptureTask {
                message: "capture loop panicked and dropped its source".to_string(),
            });
        };
        self.source = Some(source);

        if self.state() == SessionState::Capturing {
            advance(&self.state, SessionState::Stopped)?;
        }
        Ok(())
    }

    /// Parks the session in Error unless it already left the capture states.
    fn fail(&self, reason: &str) {
        if matches!(self.state(), SessionState::Capturing | SessionState::Stopped) {
            if let Err(e) = advance(&self.state, SessionState::Error(reason.to_string())) {
                warn!("{e}");
            }
        }
    }

    /// Stops any running capture, drops the source and returns to `Closed`.
    ///
    /// A capture task that died abnormally is logged and does not keep the
    /// session from closing.
    pub async fn close(&mut self) -> Result<()> {
        if self.task.is_some() {
            if let Err(e) = self.stop_capture().await {
                warn!("Closing after failed capture: {e}");
            }
        }
        if self.state() == SessionState::Closed {
            return Ok(());
        }
        advance(&self.state, SessionState::Closed)?;
        self.source = None;
        self.info = None;
        Ok(())
    }
}

/// Runs the capture loop as its own task and turns a panic inside it into the
/// Error state.
async fn supervise<S: FrameSource>(
    source: S,
    channel: Arc<FrameChannel>,
    state: Arc<watch::Sender<SessionState>>,
    stop: watch::Receiver<bool>,
    period: Duration,
) -> Option<S> {
    let name = source.name().to_string();
    let inner = tokio::spawn(capture_loop(source, channel, Arc::clone(&state), stop, period));
    match inner.await {
        Ok(source) => Some(source),
        Err(e) => {
            warn!("Capture loop for {name} died: {e}");
            if let Err(e) = advance(&state, SessionState::Error(format!("capture loop for {name} died: {e}"))) {
                warn!("{e}");
            }
            None
        }
    }
}

async fn capture_loop<S: FrameSource>(
    mut source: S,
    channel: Arc<FrameChannel>,
    state: Arc<watch::Sender<SessionState>>,
    mut stop: watch::Receiver<bool>,
    period: Duration,
) -> S {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    debug!("Capture loop for {} asked to stop", source.name());
                    break;
                }
            }
            _ = ticker.tick() => {
                match source.next_frame() {
                    Ok(Some(grid)) => {
                        debug!("Publishing {}x{} frame from {}", grid.width(), grid.height(), source.name());
                        channel.publish(grid);
                    }
                    Ok(None) => {
                        info!("Source {} reached end of stream", source.name());
                        if let Err(e) = advance(&state, SessionState::Stopped) {
                            warn!("{e}");
                        }
                        break;
                    }
                    Err(e) => {
                        warn!("Source {} failed mid-capture: {}", source.name(), e);
                        if let Err(e) = advance(&state, SessionState::Error(e.to_string())) {
                            warn!("{e}");
                        }
                        break;
                    }
                }
            }
        }
    }

    source
}
