use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! port_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u16);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

port_newtype!(Port);

pub const DEFAULT_VIDEO_INPUT_PORT: Port = Port(3000);
pub const DEFAULT_AUDIO_INPUT_PORT: Port = Port(4000);
pub const DEFAULT_CONTROLLER_PORT: Port = Port(5000);

/// Identifies what a connecting process does, so the controller can tell its clients apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientRole {
    #[serde(rename = "UI")]
    Ui,
    #[serde(rename = "CAPTURE")]
    Capture,
    #[serde(rename = "CONTROL")]
    Control,
}

impl ClientRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ClientRole::Ui => "UI",
            ClientRole::Capture => "CAPTURE",
            ClientRole::Control => "CONTROL",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "UI" => Some(ClientRole::Ui),
            "CAPTURE" => Some(ClientRole::Capture),
            "CONTROL" => Some(ClientRole::Control),
            _ => None,
        }
    }
}

impl fmt::Display for ClientRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServeMode {
    Nothing,
    Video,
    Audio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Composite,
    Preview,
    Audio,
}

/// A rectangle in composite-frame pixel coordinates, used for face and tracking markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Layout the switch composes its output in. The discriminant is the controller's mode number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeMode {
    PictureInPicture = 1,
    DualPreview = 2,
    DualEqual = 3,
}

impl CompositeMode {
    pub const ALL: [CompositeMode; 3] = [
        CompositeMode::PictureInPicture,
        CompositeMode::DualPreview,
        CompositeMode::DualEqual,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            CompositeMode::PictureInPicture => "Picture in picture",
            CompositeMode::DualPreview => "Side by side, preview",
            CompositeMode::DualEqual => "Side by side, equal",
        }
    }
}
