//! Newline-delimited JSON messages exchanged with the controller.

use serde::{Deserialize, Serialize};

use crate::{
    domain::{ClientRole, CompositeMode, MarkerRect, Port, ServeMode, StreamKind},
    error::ControllerError,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientRequest {
    Hello { role: ClientRole },
    SetCompositeMode { mode: CompositeMode },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum HandshakeReply {
    Welcome { client_id: u64 },
    Rejected { error: ControllerError },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ControllerEvent {
    CompositeModeSet {
        mode: CompositeMode,
    },
    ComposePortSet {
        port: Port,
    },
    AudioPortSet {
        port: Port,
    },
    PreviewPortAdded {
        port: Port,
        serve: ServeMode,
        kind: StreamKind,
    },
    FaceMarkersUpdated {
        faces: Vec<MarkerRect>,
    },
    TrackMarkersUpdated {
        tracking: Vec<MarkerRect>,
    },
}

pub fn encode_line<T: Serialize>(message: &T) -> serde_json::Result<String> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}
