//! Declarative widget tree, loaded from a TOML file or the copy bundled into the binary.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::ui::widgets::{DialogButton, MainWindow, QuitDialog, ResponseCode};

const BUNDLED_DESCRIPTION: &str = include_str!("../assets/switch-ui.toml");
const BUNDLED_ORIGIN: &str = "<bundled>";

pub const MAIN_WINDOW: &str = "mainwindow";
pub const QUIT_DIALOG: &str = "quitdialog";
pub const CLOSE_SIGNAL: &str = "delete-event";
pub const CLOSE_HANDLER: &str = "cb_delete_event";

const KNOWN_HANDLERS: &[&str] = &[CLOSE_HANDLER];

#[derive(Debug, Error)]
pub enum UiDescriptionError {
    #[error("failed to read UI description '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse UI description {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("UI description {origin} has no widget named '{name}'")]
    MissingWidget { origin: String, name: String },
    #[error("widget '{name}' is a {found}, expected a {expected}")]
    WrongKind {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("window '{name}' has unusable size {width}x{height}")]
    InvalidSize { name: String, width: f32, height: f32 },
    #[error("window '{0}' does not bind a handler to 'delete-event'")]
    UnboundCloseHandler(String),
    #[error("widget '{widget}' binds signal '{signal}' to unknown handler '{handler}'")]
    UnknownHandler {
        widget: String,
        signal: String,
        handler: String,
    },
}

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    widgets: BTreeMap<String, WidgetSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum WidgetSpec {
    Window(WindowSpec),
    Dialog(DialogSpec),
}

impl WidgetSpec {
    fn kind(&self) -> &'static str {
        match self {
            WidgetSpec::Window(_) => "window",
            WidgetSpec::Dialog(_) => "dialog",
        }
    }
}

fn default_width() -> f32 {
    1024.0
}

fn default_height() -> f32 {
    640.0
}

#[derive(Debug, Clone, Deserialize)]
struct WindowSpec {
    title: String,
    #[serde(default)]
    heading: Option<String>,
    #[serde(default = "default_width")]
    width: f32,
    #[serde(default = "default_height")]
    height: f32,
    #[serde(default)]
    signals: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
struct DialogSpec {
    title: String,
    text: String,
    #[serde(default)]
    buttons: Vec<ButtonSpec>,
}

#[derive(Debug, Clone, Deserialize)]
struct ButtonSpec {
    label: String,
    response: i32,
}

#[derive(Debug, Clone)]
pub struct UiDescription {
    origin: String,
    widgets: BTreeMap<String, WidgetSpec>,
}

impl UiDescription {
    /// Reads `path` when given, otherwise falls back to the bundled description.
    pub fn load(path: Option<&Path>) -> Result<Self, UiDescriptionError> {
        match path {
            Some(path) => {
                info!(path = %path.display(), "loading UI description from file");
                let raw = fs::read_to_string(path).map_err(|source| UiDescriptionError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::parse(path.display().to_string(), &raw)
            }
            None => Self::bundled(),
        }
    }

    pub fn bundled() -> Result<Self, UiDescriptionError> {
        Self::parse(BUNDLED_ORIGIN, BUNDLED_DESCRIPTION)
    }

    pub fn parse(origin: impl Into<String>, raw: &str) -> Result<Self, UiDescriptionError> {
        let origin = origin.into();
        let document: Document = toml::from_str(raw).map_err(|source| UiDescriptionError::Parse {
            origin: origin.clone(),
            source,
        })?;
        Ok(Self {
            origin,
            widgets: document.widgets,
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    fn widget(&self, name: &str) -> Result<&WidgetSpec, UiDescriptionError> {
        self.widgets
            .get(name)
            .ok_or_else(|| UiDescriptionError::MissingWidget {
                origin: self.origin.clone(),
                name: name.to_string(),
            })
    }

    /// Resolves a window and checks its signal bindings against the known handlers.
    pub fn main_window(&self, name: &str) -> Result<MainWindow, UiDescriptionError> {
        let spec = match self.widget(name)? {
            WidgetSpec::Window(spec) => spec,
            other => {
                return Err(UiDescriptionError::WrongKind {
                    name: name.to_string(),
                    expected: "window",
                    found: other.kind(),
                })
            }
        };

        for (signal, handler) in &spec.signals {
            if !KNOWN_HANDLERS.contains(&handler.as_str()) {
                return Err(UiDescriptionError::UnknownHandler {
                    widget: name.to_string(),
                    signal: signal.clone(),
                    handler: handler.clone(),
                });
            }
        }
        if spec.signals.get(CLOSE_SIGNAL).map(String::as_str) != Some(CLOSE_HANDLER) {
            return Err(UiDescriptionError::UnboundCloseHandler(name.to_string()));
        }

        let usable = |side: f32| side.is_finite() && side > 0.0;
        if !usable(spec.width) || !usable(spec.height) {
            return Err(UiDescriptionError::InvalidSize {
                name: name.to_string(),
                width: spec.width,
                height: spec.height,
            });
        }

        Ok(MainWindow::new(name, spec.title.clone(), spec.width, spec.height)
            .with_heading(spec.heading.clone()))
    }

    pub fn quit_dialog(&self, name: &str) -> Result<QuitDialog, UiDescriptionError> {
        let spec = match self.widget(name)? {
            WidgetSpec::Dialog(spec) => spec,
            other => {
                return Err(UiDescriptionError::WrongKind {
                    name: name.to_string(),
                    expected: "dialog",
                    found: other.kind(),
                })
            }
        };

        let buttons = spec
            .buttons
            .iter()
            .map(|button| DialogButton {
                label: button.label.clone(),
                response: ResponseCode(button.response),
            })
            .collect();
        let dialog = QuitDialog::new(name, spec.title.clone(), spec.text.clone(), buttons);
        if !dialog.can_confirm() {
            warn!(
                widget = name,
                confirm = ResponseCode::CONFIRM.0,
                "quit dialog has no confirming button; quitting from the GUI is impossible"
            );
        }
        Ok(dialog)
    }
}
