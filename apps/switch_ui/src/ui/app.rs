use std::time::Duration;

use anyhow::{anyhow, ensure};
use eframe::egui;
use shared::domain::CompositeMode;
use switch_client::ControllerLink;
use tracing::{debug, info};

use crate::{
    controller::quit::CloseDecision,
    lifecycle::Frontend,
    session::UiSession,
    ui::widgets::ResponseCode,
    ui_description::QUIT_DIALOG,
};

const APP_ID: &str = "switch-ui";
const REPAINT_INTERVAL: Duration = Duration::from_millis(100);

/// Runs the session inside a native egui window.
#[derive(Debug, Default)]
pub struct EframeFrontend;

impl<L: ControllerLink> Frontend<L> for EframeFrontend {
    fn run(&mut self, session: &mut UiSession<L>) -> anyhow::Result<()> {
        let window = session
            .main_window()
            .ok_or_else(|| anyhow!("main window was not set up"))?;
        ensure!(window.is_visible(), "main window '{}' was never shown", window.name);

        let viewport = egui::ViewportBuilder::default()
            .with_title(window.title.clone())
            .with_inner_size([window.width, window.height])
            .with_close_button(window.is_deletable());
        let options = eframe::NativeOptions {
            viewport,
            ..Default::default()
        };

        eframe::run_native(
            APP_ID,
            options,
            Box::new(|_cc| Ok(Box::new(SwitchUiApp::new(session)))),
        )
        .map_err(|err| anyhow!("windowing layer failed: {err}"))
    }
}

/// Window-level action decided by [`FrameLogic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowCommand {
    Close,
    CancelClose,
}

impl WindowCommand {
    fn send(self, ctx: &egui::Context) {
        let command = match self {
            WindowCommand::Close => egui::ViewportCommand::Close,
            WindowCommand::CancelClose => egui::ViewportCommand::CancelClose,
        };
        ctx.send_viewport_cmd(command);
    }
}

/// Per-frame decisions about the main window, independent of drawing.
#[derive(Debug, Default)]
struct FrameLogic {
    close_sent: bool,
}

impl FrameLogic {
    /// Delivers pending notifications and answers this frame's close request, if any.
    fn begin_frame<L: ControllerLink>(
        &mut self,
        session: &mut UiSession<L>,
        close_requested: bool,
    ) -> Vec<WindowCommand> {
        let mut commands = Vec::new();
        session.process_notifications();

        if !session.loop_running() && !self.close_sent {
            info!("ui loop stopped; closing main window");
            commands.push(WindowCommand::Close);
            self.close_sent = true;
        }

        if close_requested {
            match session.request_close() {
                CloseDecision::Close => debug!("main window closing"),
                CloseDecision::Keep => commands.push(WindowCommand::CancelClose),
            }
        }
        commands
    }

    fn dialog_answered<L: ControllerLink>(
        &mut self,
        session: &mut UiSession<L>,
        response: ResponseCode,
    ) -> Option<WindowCommand> {
        match session.respond_to_quit_dialog(response) {
            CloseDecision::Close => Some(WindowCommand::Close),
            CloseDecision::Keep => None,
        }
    }
}

/// A clicked button wins; a modal closed any other way counts as dismissed.
fn dialog_response(clicked: Option<ResponseCode>, dismissed: bool) -> Option<ResponseCode> {
    match clicked {
        Some(response) => Some(response),
        None if dismissed => Some(ResponseCode::DISMISSED),
        None => None,
    }
}

struct SwitchUiApp<'s, L: ControllerLink> {
    session: &'s mut UiSession<L>,
    frame: FrameLogic,
}

impl<'s, L: ControllerLink> SwitchUiApp<'s, L> {
    fn new(session: &'s mut UiSession<L>) -> Self {
        Self {
            session,
            frame: FrameLogic::default(),
        }
    }

    /// Returns the composition mode the user picked this frame.
    fn show_main_window(&self, ctx: &egui::Context) -> Option<CompositeMode> {
        let session = &*self.session;
        let heading = session
            .main_window()
            .map(|w| w.heading.clone().unwrap_or_else(|| w.title.clone()))
            .unwrap_or_default();

        let reactions = session.reactions();
        let status = if reactions.controller_closed() {
            match reactions.close_reason() {
                Some(reason) => format!("controller closed the connection: {reason}"),
                None => "controller closed the connection".to_string(),
            }
        } else if session.connection().is_some() {
            "connected".to_string()
        } else {
            "not connected".to_string()
        };
        let role = session
            .connection()
            .map(|link| link.role().to_string())
            .unwrap_or_else(|| "-".to_string());
        let current_mode = session.composite_mode();

        let mut picked = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(heading);
            ui.add_space(8.0);
            egui::Grid::new("controller_status")
                .num_columns(2)
                .spacing([16.0, 4.0])
                .show(ui, |ui| {
                    ui.label("Controller");
                    ui.monospace(session.config().controller_address.as_str());
                    ui.end_row();

                    ui.label("Role");
                    ui.monospace(role);
                    ui.end_row();

                    ui.label("Status");
                    ui.label(status);
                    ui.end_row();
                });

            ui.add_space(12.0);
            ui.label("Composition");
            ui.add_enabled_ui(session.connection().is_some(), |ui| {
                ui.horizontal(|ui| {
                    for mode in CompositeMode::ALL {
                        let selected = current_mode == Some(mode);
                        if ui.selectable_label(selected, mode.label()).clicked() && !selected {
                            picked = Some(mode);
                        }
                    }
                });
            });

            if session.quit_locked() {
                ui.add_space(8.0);
                ui.weak("Quitting from the GUI is disabled.");
            }
        });
        picked
    }

    /// Draws the quit dialog while it is visible and returns the response once one is picked.
    fn show_quit_dialog(&self, ctx: &egui::Context) -> Option<ResponseCode> {
        let dialog = self.session.quit_dialog().filter(|d| d.is_visible())?;

        let mut clicked = None;
        let modal = egui::Modal::new(egui::Id::new(QUIT_DIALOG)).show(ctx, |ui| {
            ui.heading(dialog.title.as_str());
            ui.label(dialog.text.as_str());
            ui.add_space(12.0);
            ui.horizontal(|ui| {
                for button in &dialog.buttons {
                    if ui.button(button.label.as_str()).clicked() {
                        clicked = Some(button.response);
                    }
                }
            });
        });

        dialog_response(clicked, modal.should_close())
    }
}

impl<L: ControllerLink> eframe::App for SwitchUiApp<'_, L> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let close_requested = ctx.input(|i| i.viewport().close_requested());
        for command in self.frame.begin_frame(&mut *self.session, close_requested) {
            command.send(ctx);
        }

        if let Some(mode) = self.show_main_window(ctx) {
            self.session.request_composite_mode(mode);
        }

        if let Some(response) = self.show_quit_dialog(ctx) {
            if let Some(command) = self.frame.dialog_answered(&mut *self.session, response) {
                command.send(ctx);
            }
        }

        ctx.request_repaint_after(REPAINT_INTERVAL);
    }
}
