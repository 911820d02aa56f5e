//! The single long-lived UI session and its start-up/shutdown ordering.

use shared::{
    domain::{ClientRole, CompositeMode},
    protocol::ClientRequest,
};
use switch_client::{ConnectError, Connector, ControllerLink};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    config::UiConfig,
    controller::{
        events::UiReactions,
        quit::{CloseDecision, QuitConfirmation},
    },
    ui::widgets::{MainWindow, QuitDialog, ResponseCode},
    ui_description::{UiDescription, UiDescriptionError, MAIN_WINDOW, QUIT_DIALOG},
};

/// Role this front-end presents to the controller.
pub const UI_ROLE: ClientRole = ClientRole::Ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Configured,
    WidgetsReady,
    Connected,
    Running,
    ShuttingDown,
    Terminated,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot {action} while the session is {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: LifecycleState,
    },
    #[error(transparent)]
    Description(#[from] UiDescriptionError),
    #[error(transparent)]
    Connect(#[from] ConnectError),
}

pub struct UiSession<L> {
    state: LifecycleState,
    config: UiConfig,
    main_window: Option<MainWindow>,
    quit_dialog: Option<QuitDialog>,
    quit_gate: QuitConfirmation,
    reactions: UiReactions,
    connection: Option<L>,
}

impl<L: ControllerLink> Default for UiSession<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ControllerLink> UiSession<L> {
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Created,
            config: UiConfig::default(),
            main_window: None,
            quit_dialog: None,
            quit_gate: QuitConfirmation::new(false),
            reactions: UiReactions::default(),
            connection: None,
        }
    }

    fn expect_state(
        &self,
        expected: LifecycleState,
        action: &'static str,
    ) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                action,
                state: self.state,
            })
        }
    }

    fn advance(&mut self, next: LifecycleState) {
        debug!(from = ?self.state, to = ?next, "ui session state change");
        self.state = next;
    }

    pub fn configure(&mut self, config: UiConfig) -> Result<(), SessionError> {
        self.expect_state(LifecycleState::Created, "configure")?;
        self.quit_gate = QuitConfirmation::new(config.quit_locked);
        self.config = config;
        self.advance(LifecycleState::Configured);
        Ok(())
    }

    pub fn setup(&mut self, description: &UiDescription) -> Result<(), SessionError> {
        self.expect_state(LifecycleState::Configured, "set up widgets")?;

        info!(origin = description.origin(), "loading main window from UI description");
        let mut main_window = description.main_window(MAIN_WINDOW)?;
        if self.config.quit_locked {
            main_window.set_deletable(false);
        }

        info!(origin = description.origin(), "loading quit dialog from UI description");
        let quit_dialog = description.quit_dialog(QUIT_DIALOG)?;

        self.main_window = Some(main_window);
        self.quit_dialog = Some(quit_dialog);
        self.advance(LifecycleState::WidgetsReady);
        Ok(())
    }

    pub fn connect<K>(&mut self, connector: &K) -> Result<(), SessionError>
    where
        K: Connector<Link = L>,
    {
        self.expect_state(LifecycleState::WidgetsReady, "connect")?;
        let link = connector.connect(UI_ROLE)?;
        self.connection = Some(link);
        self.advance(LifecycleState::Connected);
        Ok(())
    }

    /// Shows the main window; the caller then blocks in its event loop.
    pub fn enter_run_loop(&mut self) -> Result<(), SessionError> {
        self.expect_state(LifecycleState::Connected, "enter the run loop")?;
        if let Some(window) = self.main_window.as_mut() {
            window.show();
        }
        self.reactions.run_loop_mut().enter();
        self.advance(LifecycleState::Running);
        Ok(())
    }

    /// Delivers queued controller notifications. Releases the connection once the
    /// controller closed it.
    pub fn process_notifications(&mut self) -> usize {
        if self.state != LifecycleState::Running {
            return 0;
        }
        let Some(link) = self.connection.as_mut() else {
            return 0;
        };

        let delivered = link.pump(&mut self.reactions);
        if link.is_closed() {
            self.connection = None;
            if let Some(dialog) = self.quit_dialog.as_mut() {
                self.quit_gate.abandon(dialog);
            }
        }
        delivered
    }

    pub fn loop_running(&self) -> bool {
        self.reactions.run_loop().is_running()
    }

    /// Decides a window close request. Once the loop was stopped by the controller, the
    /// window closes without asking.
    pub fn request_close(&mut self) -> CloseDecision {
        if self.state != LifecycleState::Running || !self.loop_running() {
            return CloseDecision::Close;
        }
        match self.quit_dialog.as_mut() {
            Some(dialog) => self.quit_gate.on_close_request(dialog),
            None => CloseDecision::Keep,
        }
    }

    /// Asks the controller to switch composition. The shown mode changes only once the
    /// controller announces it.
    pub fn request_composite_mode(&mut self, mode: CompositeMode) -> bool {
        if self.state != LifecycleState::Running {
            return false;
        }
        let Some(link) = self.connection.as_mut() else {
            return false;
        };
        match link.request(ClientRequest::SetCompositeMode { mode }) {
            Ok(()) => {
                info!(mode = mode.number(), "switching to new composition mode");
                true
            }
            Err(err) => {
                warn!(mode = mode.number(), "cannot switch composition mode: {err}");
                false
            }
        }
    }

    pub fn composite_mode(&self) -> Option<CompositeMode> {
        self.reactions.composite_mode()
    }

    pub fn respond_to_quit_dialog(&mut self, response: ResponseCode) -> CloseDecision {
        match self.quit_dialog.as_mut() {
            Some(dialog) => self.quit_gate.on_response(dialog, response),
            None => CloseDecision::Keep,
        }
    }

    pub fn finish_run_loop(&mut self) -> Result<(), SessionError> {
        self.expect_state(LifecycleState::Running, "leave the run loop")?;
        self.reactions.run_loop_mut().quit();
        let run_loop = self.reactions.run_loop();
        debug!(
            loop_state = ?run_loop.state(),
            stop_requests = run_loop.stop_requests(),
            "left ui loop"
        );
        if let Some(window) = self.main_window.as_mut() {
            window.hide();
        }
        self.advance(LifecycleState::ShuttingDown);
        Ok(())
    }

    /// Destroys the widgets (main window first) and releases the connection. Idempotent.
    pub fn teardown(&mut self) {
        if self.state == LifecycleState::Terminated {
            return;
        }
        if let Some(window) = self.main_window.take() {
            window.destroy();
        }
        if let Some(dialog) = self.quit_dialog.take() {
            dialog.destroy();
        }
        if let Some(mut link) = self.connection.take() {
            link.disconnect();
            debug!(role = %link.role(), "released controller connection");
        }
        self.advance(LifecycleState::Terminated);
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn config(&self) -> &UiConfig {
        &self.config
    }

    pub fn main_window(&self) -> Option<&MainWindow> {
        self.main_window.as_ref()
    }

    pub fn quit_dialog(&self) -> Option<&QuitDialog> {
        self.quit_dialog.as_ref()
    }

    pub fn quit_locked(&self) -> bool {
        self.quit_gate.is_locked()
    }

    pub fn reactions(&self) -> &UiReactions {
        &self.reactions
    }

    pub fn connection(&self) -> Option<&L> {
        self.connection.as_ref()
    }
}
