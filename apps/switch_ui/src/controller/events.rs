//! UI reactions to controller notifications.

use shared::domain::{CompositeMode, MarkerRect, Port, ServeMode, StreamKind};
use switch_client::ControllerEvents;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

/// Tracks the UI event loop. Stopping is idempotent.
#[derive(Debug)]
pub struct RunLoop {
    state: LoopState,
    stop_requests: u32,
}

impl Default for RunLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl RunLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Idle,
            stop_requests: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    pub fn enter(&mut self) {
        if self.state == LoopState::Idle {
            self.state = LoopState::Running;
        }
    }

    /// Returns `true` only when this call actually stopped a running loop.
    pub fn quit(&mut self) -> bool {
        if self.state != LoopState::Running {
            return false;
        }
        self.state = LoopState::Stopped;
        self.stop_requests += 1;
        true
    }

    pub fn stop_requests(&self) -> u32 {
        self.stop_requests
    }
}

#[derive(Debug, Default)]
pub struct UiReactions {
    run_loop: RunLoop,
    controller_closed: bool,
    close_reason: Option<String>,
    composite_mode: Option<CompositeMode>,
}

impl UiReactions {
    pub fn run_loop(&self) -> &RunLoop {
        &self.run_loop
    }

    pub fn run_loop_mut(&mut self) -> &mut RunLoop {
        &mut self.run_loop
    }

    pub fn controller_closed(&self) -> bool {
        self.controller_closed
    }

    pub fn close_reason(&self) -> Option<&str> {
        self.close_reason.as_deref()
    }

    /// Last mode the controller reported; `None` until it announces one.
    pub fn composite_mode(&self) -> Option<CompositeMode> {
        self.composite_mode
    }
}

impl ControllerEvents for UiReactions {
    fn connection_closed(&mut self, reason: Option<&str>) {
        self.controller_closed = true;
        self.close_reason = reason.filter(|r| !r.is_empty()).map(str::to_string);
        if self.run_loop.quit() {
            info!(reason = reason.unwrap_or(""), "controller closed the connection; stopping UI loop");
        } else {
            debug!("controller closed the connection while the UI loop was not running");
        }
    }

    fn set_composite_mode(&mut self, mode: CompositeMode) {
        info!(mode = mode.number(), "current composition mode is {}", mode.label());
        self.composite_mode = Some(mode);
    }

    // Preview rendering is not attached yet; the remaining kinds are logged and ignored.

    fn set_compose_port(&mut self, port: Port) {
        debug!(port = port.0, "compose port set");
    }

    fn set_audio_port(&mut self, port: Port) {
        debug!(port = port.0, "audio port set");
    }

    fn add_preview_port(&mut self, port: Port, serve: ServeMode, kind: StreamKind) {
        debug!(port = port.0, ?serve, ?kind, "preview port added");
    }

    fn show_face_marker(&mut self, faces: &[MarkerRect]) {
        debug!(count = faces.len(), "face markers updated");
    }

    fn show_track_marker(&mut self, tracking: &[MarkerRect]) {
        debug!(count = tracking.len(), "track markers updated");
    }
}
