use tracing::debug;

/// Response code a dialog button reports when clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResponseCode(pub i32);

impl ResponseCode {
    #[cfg(test)]
    pub const CANCEL: Self = Self(1);
    /// The only code that confirms quitting.
    pub const CONFIRM: Self = Self(2);
    /// Dialog dismissed without a choice (Escape, click outside).
    pub const DISMISSED: Self = Self(-4);

    pub fn confirms_quit(self) -> bool {
        self == Self::CONFIRM
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MainWindow {
    pub name: String,
    pub title: String,
    pub heading: Option<String>,
    pub width: f32,
    pub height: f32,
    deletable: bool,
    visible: bool,
}

impl MainWindow {
    pub fn new(name: impl Into<String>, title: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            heading: None,
            width,
            height,
            deletable: true,
            visible: false,
        }
    }

    pub fn with_heading(mut self, heading: Option<String>) -> Self {
        self.heading = heading;
        self
    }

    /// Whether the window chrome offers a close control.
    pub fn is_deletable(&self) -> bool {
        self.deletable
    }

    pub fn set_deletable(&mut self, deletable: bool) {
        self.deletable = deletable;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn destroy(self) {
        debug!(widget = %self.name, "destroyed main window");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogButton {
    pub label: String,
    pub response: ResponseCode,
}

/// Modal confirmation dialog. Hidden between uses, never destroyed while the main window lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuitDialog {
    pub name: String,
    pub title: String,
    pub text: String,
    pub buttons: Vec<DialogButton>,
    visible: bool,
    times_shown: u32,
    times_hidden: u32,
}

impl QuitDialog {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        text: impl Into<String>,
        buttons: Vec<DialogButton>,
    ) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            text: text.into(),
            buttons,
            visible: false,
            times_shown: 0,
            times_hidden: 0,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn show(&mut self) {
        self.visible = true;
        self.times_shown += 1;
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.times_hidden += 1;
    }

    #[cfg(test)]
    pub fn times_shown(&self) -> u32 {
        self.times_shown
    }

    #[cfg(test)]
    pub fn times_hidden(&self) -> u32 {
        self.times_hidden
    }

    pub fn can_confirm(&self) -> bool {
        self.buttons.iter().any(|b| b.response.confirms_quit())
    }

    pub fn destroy(self) {
        debug!(
            widget = %self.name,
            shown = self.times_shown,
            hidden = self.times_hidden,
            "destroyed quit dialog"
        );
    }
}
