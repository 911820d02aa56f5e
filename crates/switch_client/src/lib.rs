//! Client side of the switch controller: the connection, and the per-notification
//! reaction surface that connected front-ends implement.

use std::time::Duration;

use shared::{
    domain::{ClientRole, CompositeMode, MarkerRect, Port, ServeMode, StreamKind},
    error::ControllerError,
    protocol::{ClientRequest, ControllerEvent},
};
use thiserror::Error;

mod connection;
#[cfg(any(test, feature = "test-util"))]
mod loopback;
mod queue;

pub use connection::{ConnectOptions, ControllerConnection, TcpConnector, MAX_LINE_BYTES};
#[cfg(any(test, feature = "test-util"))]
pub use loopback::{local_link, LocalFeed, LocalLink};

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("failed to reach controller at {address}: {source}")]
    Io {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("controller at {address} did not finish the handshake within {timeout:?}")]
    Timeout { address: String, timeout: Duration },
    #[error("controller rejected role {role}: {error}")]
    Rejected {
        role: ClientRole,
        error: ControllerError,
    },
    #[error("controller protocol violation: {0}")]
    Protocol(String),
    #[error("failed to start controller link worker: {0}")]
    Runtime(#[source] std::io::Error),
}

/// A request could not be queued because the link is already closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("controller link is closed")]
pub struct LinkClosed;

/// One queued controller notification, waiting to be delivered on the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    ConnectionClosed(Option<String>),
    CompositeModeSet(CompositeMode),
    ComposePortSet(Port),
    AudioPortSet(Port),
    PreviewPortAdded {
        port: Port,
        serve: ServeMode,
        kind: StreamKind,
    },
    FaceMarkersUpdated(Vec<MarkerRect>),
    TrackMarkersUpdated(Vec<MarkerRect>),
}

impl From<ControllerEvent> for Notification {
    fn from(event: ControllerEvent) -> Self {
        match event {
            ControllerEvent::CompositeModeSet { mode } => Notification::CompositeModeSet(mode),
            ControllerEvent::ComposePortSet { port } => Notification::ComposePortSet(port),
            ControllerEvent::AudioPortSet { port } => Notification::AudioPortSet(port),
            ControllerEvent::PreviewPortAdded { port, serve, kind } => {
                Notification::PreviewPortAdded { port, serve, kind }
            }
            ControllerEvent::FaceMarkersUpdated { faces } => Notification::FaceMarkersUpdated(faces),
            ControllerEvent::TrackMarkersUpdated { tracking } => {
                Notification::TrackMarkersUpdated(tracking)
            }
        }
    }
}

/// Reactions to controller notifications. Every kind has its own method so a front-end
/// can attach behaviour to one kind without touching the others; all default to no-ops.
pub trait ControllerEvents {
    /// The controller side went away. `reason` is `None` for a clean end of stream.
    fn connection_closed(&mut self, _reason: Option<&str>) {}

    /// The switch is now composing in `mode`; also sent once right after the handshake.
    fn set_composite_mode(&mut self, _mode: CompositeMode) {}

    fn set_compose_port(&mut self, _port: Port) {}

    fn set_audio_port(&mut self, _port: Port) {}

    fn add_preview_port(&mut self, _port: Port, _serve: ServeMode, _kind: StreamKind) {}

    fn show_face_marker(&mut self, _faces: &[MarkerRect]) {}

    fn show_track_marker(&mut self, _tracking: &[MarkerRect]) {}
}

pub fn dispatch<E: ControllerEvents + ?Sized>(events: &mut E, notification: Notification) {
    match notification {
        Notification::ConnectionClosed(reason) => events.connection_closed(reason.as_deref()),
        Notification::CompositeModeSet(mode) => events.set_composite_mode(mode),
        Notification::ComposePortSet(port) => events.set_compose_port(port),
        Notification::AudioPortSet(port) => events.set_audio_port(port),
        Notification::PreviewPortAdded { port, serve, kind } => {
            events.add_preview_port(port, serve, kind)
        }
        Notification::FaceMarkersUpdated(faces) => events.show_face_marker(&faces),
        Notification::TrackMarkersUpdated(tracking) => events.show_track_marker(&tracking),
    }
}

/// An established connection to the controller, as seen from the UI thread.
pub trait ControllerLink {
    fn role(&self) -> ClientRole;

    /// Delivers every queued notification to `events` on the calling thread and returns how
    /// many were delivered. Nothing is delivered after `connection_closed`.
    fn pump(&mut self, events: &mut dyn ControllerEvents) -> usize;

    fn is_closed(&self) -> bool;

    /// Queues `request` for the controller without waiting for it to be written.
    fn request(&mut self, request: ClientRequest) -> Result<(), LinkClosed>;

    /// Closes the link from this side. Does not report `connection_closed`.
    fn disconnect(&mut self);
}

pub trait Connector {
    type Link: ControllerLink;

    fn connect(&self, role: ClientRole) -> Result<Self::Link, ConnectError>;
}
