//! Gate between a window close request and actually closing.
//!
//! A close request suspends on the quit dialog: it is shown and the close is vetoed. The
//! user's response resumes it: the dialog is hidden again, and only the confirm code closes.

use tracing::{debug, info, warn};

use crate::ui::widgets::{QuitDialog, ResponseCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    Close,
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    AwaitingResponse,
    Confirmed,
}

#[derive(Debug)]
pub struct QuitConfirmation {
    locked: bool,
    phase: Phase,
}

impl QuitConfirmation {
    pub fn new(locked: bool) -> Self {
        Self {
            locked,
            phase: Phase::Idle,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    #[cfg(test)]
    pub fn is_awaiting_response(&self) -> bool {
        self.phase == Phase::AwaitingResponse
    }

    pub fn on_close_request(&mut self, dialog: &mut QuitDialog) -> CloseDecision {
        if self.locked {
            info!("close request vetoed: application was started non-quittable");
            return CloseDecision::Keep;
        }

        match self.phase {
            Phase::Confirmed => CloseDecision::Close,
            Phase::AwaitingResponse => CloseDecision::Keep,
            Phase::Idle => {
                info!("showing quit dialog");
                dialog.show();
                self.phase = Phase::AwaitingResponse;
                CloseDecision::Keep
            }
        }
    }

    pub fn on_response(&mut self, dialog: &mut QuitDialog, response: ResponseCode) -> CloseDecision {
        if self.phase != Phase::AwaitingResponse {
            warn!(response = response.0, "ignoring quit dialog response nobody asked for");
            return CloseDecision::Keep;
        }

        dialog.hide();
        if response.confirms_quit() {
            debug!("quit confirmed");
            self.phase = Phase::Confirmed;
            CloseDecision::Close
        } else {
            debug!(response = response.0, "quit cancelled");
            self.phase = Phase::Idle;
            CloseDecision::Keep
        }
    }

    /// Hides a dialog that is still waiting when the application shuts down for another reason.
    pub fn abandon(&mut self, dialog: &mut QuitDialog) {
        if self.phase == Phase::AwaitingResponse {
            dialog.hide();
            self.phase = Phase::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::widgets::DialogButton;

    fn dialog() -> QuitDialog {
        QuitDialog::new(
            "quitdialog",
            "Quit?",
            "Really quit?",
            vec![
                DialogButton {
                    label: "Cancel".to_string(),
                    response: ResponseCode::CANCEL,
                },
                DialogButton {
                    label: "Quit".to_string(),
                    response: ResponseCode::CONFIRM,
                },
            ],
        )
    }

    #[test]
    fn locked_gate_always_vetoes_and_never_shows_the_dialog() {
        let mut gate = QuitConfirmation::new(true);
        let mut dialog = dialog();

        for _ in 0..5 {
            assert_eq!(gate.on_close_request(&mut dialog), CloseDecision::Keep);
        }
        assert_eq!(dialog.times_shown(), 0);
        assert!(!dialog.is_visible());
    }

    #[test]
    fn confirm_closes_and_leaves_dialog_hidden() {
        let mut gate = QuitConfirmation::new(false);
        let mut dialog = dialog();

        assert_eq!(gate.on_close_request(&mut dialog), CloseDecision::Keep);
        assert!(dialog.is_visible());

        assert_eq!(
            gate.on_response(&mut dialog, ResponseCode::CONFIRM),
            CloseDecision::Close
        );
        assert!(!dialog.is_visible());
        assert_eq!((dialog.times_shown(), dialog.times_hidden()), (1, 1));

        // The window layer re-issues the close after confirmation.
        assert_eq!(gate.on_close_request(&mut dialog), CloseDecision::Close);
        assert_eq!(dialog.times_shown(), 1);
    }

    #[test]
    fn any_other_response_cancels_and_dialog_is_reusable() {
        let mut gate = QuitConfirmation::new(false);
        let mut dialog = dialog();

        for (round, response) in [ResponseCode::CANCEL, ResponseCode::DISMISSED, ResponseCode(7)]
            .into_iter()
            .enumerate()
        {
            assert_eq!(gate.on_close_request(&mut dialog), CloseDecision::Keep);
            assert!(dialog.is_visible());
            assert_eq!(gate.on_response(&mut dialog, response), CloseDecision::Keep);
            assert!(!dialog.is_visible());

            let expected = round as u32 + 1;
            assert_eq!(dialog.times_shown(), expected);
            assert_eq!(dialog.times_hidden(), expected);
        }
    }

    #[test]
    fn repeated_request_while_dialog_is_up_does_not_show_it_twice() {
        let mut gate = QuitConfirmation::new(false);
        let mut dialog = dialog();

        gate.on_close_request(&mut dialog);
        assert_eq!(gate.on_close_request(&mut dialog), CloseDecision::Keep);
        assert_eq!(dialog.times_shown(), 1);
        assert!(gate.is_awaiting_response());
    }

    #[test]
    fn stray_response_is_ignored() {
        let mut gate = QuitConfirmation::new(false);
        let mut dialog = dialog();

        assert_eq!(
            gate.on_response(&mut dialog, ResponseCode::CONFIRM),
            CloseDecision::Keep
        );
        assert_eq!(dialog.times_hidden(), 0);
        assert_eq!(gate.on_close_request(&mut dialog), CloseDecision::Keep);
        assert_eq!(dialog.times_shown(), 1);
    }

    #[test]
    fn abandon_hides_a_pending_dialog() {
        let mut gate = QuitConfirmation::new(false);
        let mut dialog = dialog();

        gate.on_close_request(&mut dialog);
        gate.abandon(&mut dialog);
        assert!(!dialog.is_visible());
        assert!(!gate.is_awaiting_response());

        gate.abandon(&mut dialog);
        assert_eq!(dialog.times_hidden(), 1);
    }
}
