use std::process::ExitCode;

use clap::error::ErrorKind;
use switch_client::{Connector, ControllerLink};
use tracing::{error, info};

use crate::{
    config::UiConfig,
    session::{SessionError, UiSession},
    ui_description::UiDescription,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    UsageError,
    ConnectFailed,
    ConfigError,
    FrontendFailed,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::UsageError => 1,
            ExitStatus::ConnectFailed => 2,
            ExitStatus::ConfigError => 3,
            ExitStatus::FrontendFailed => 4,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}

/// Status for a command line clap refused to turn into a config. Help and version requests
/// are answered by clap itself and count as success.
pub fn usage_status(err: &clap::Error) -> ExitStatus {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitStatus::Success,
        _ => ExitStatus::UsageError,
    }
}

/// The windowing layer: shows the main window and blocks in its event loop.
pub trait Frontend<L: ControllerLink> {
    fn run(&mut self, session: &mut UiSession<L>) -> anyhow::Result<()>;
}

pub fn launch<K, F>(config: UiConfig, connector: &K, frontend: &mut F) -> ExitStatus
where
    K: Connector,
    F: Frontend<K::Link>,
{
    let mut session = UiSession::new();
    let status = drive(&mut session, config, connector, frontend);
    session.teardown();
    info!(code = status.code(), state = ?session.state(), "switch ui exiting");
    status
}

fn drive<K, F>(
    session: &mut UiSession<K::Link>,
    config: UiConfig,
    connector: &K,
    frontend: &mut F,
) -> ExitStatus
where
    K: Connector,
    F: Frontend<K::Link>,
{
    let ui_file = config.ui_file.clone();
    if let Err(err) = session.configure(config) {
        error!("failed to configure ui session: {err}");
        return ExitStatus::ConfigError;
    }

    let description = match UiDescription::load(ui_file.as_deref()) {
        Ok(description) => description,
        Err(err) => {
            error!("{err}");
            return ExitStatus::ConfigError;
        }
    };
    if let Err(err) = session.setup(&description) {
        error!("failed to set up widgets: {err}");
        return ExitStatus::ConfigError;
    }

    match session.connect(connector) {
        Ok(()) => {}
        Err(SessionError::Connect(err)) => {
            error!(
                controller = %session.config().controller_address,
                "failed to connect to controller: {err}"
            );
            return ExitStatus::ConnectFailed;
        }
        Err(err) => {
            error!("failed to connect to controller: {err}");
            return ExitStatus::ConnectFailed;
        }
    }

    if let Err(err) = session.enter_run_loop() {
        error!("failed to start the ui loop: {err}");
        return ExitStatus::FrontendFailed;
    }
    info!("running ui loop");
    let outcome = frontend.run(session);
    if let Err(err) = session.finish_run_loop() {
        error!("failed to leave the ui loop cleanly: {err}");
    }

    match outcome {
        Ok(()) => ExitStatus::Success,
        Err(err) => {
            error!("ui loop failed: {err:#}");
            ExitStatus::FrontendFailed
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Write, time::Duration};

    use shared::domain::ClientRole;
    use switch_client::{ConnectError, LocalLink};

    use super::*;
    use crate::{
        controller::quit::CloseDecision,
        session::LifecycleState,
        test_support::{config, LocalConnector},
        ui::widgets::ResponseCode,
    };

    struct RefusingConnector;

    impl Connector for RefusingConnector {
        type Link = LocalLink;

        fn connect(&self, _role: ClientRole) -> Result<LocalLink, ConnectError> {
            Err(ConnectError::Timeout {
                address: "127.0.0.1:5000".to_string(),
                timeout: Duration::from_secs(5),
            })
        }
    }

    /// Stands in for the windowing layer; `script` plays the role of user and controller.
    struct ScriptedFrontend<S> {
        runs: u32,
        window_shown: bool,
        script: S,
    }

    impl<S> ScriptedFrontend<S>
    where
        S: FnMut(&mut UiSession<LocalLink>) -> anyhow::Result<()>,
    {
        fn new(script: S) -> Self {
            Self {
                runs: 0,
                window_shown: false,
                script,
            }
        }
    }

    impl<S> Frontend<LocalLink> for ScriptedFrontend<S>
    where
        S: FnMut(&mut UiSession<LocalLink>) -> anyhow::Result<()>,
    {
        fn run(&mut self, session: &mut UiSession<LocalLink>) -> anyhow::Result<()> {
            self.runs += 1;
            self.window_shown = session.main_window().is_some_and(|w| w.is_visible());
            (self.script)(session)
        }
    }

    fn usage_of(args: &[&str]) -> ExitStatus {
        let err = UiConfig::from_args(std::iter::once("switch-ui").chain(args.iter().copied()))
            .expect_err("clap should stop here");
        usage_status(&err)
    }

    #[test]
    fn bad_command_line_exits_with_usage_error() {
        let status = usage_of(&["--frobnicate"]);
        assert_eq!(status, ExitStatus::UsageError);
        assert_eq!(status.code(), 1);
        assert_eq!(usage_of(&["-u"]), ExitStatus::UsageError);
    }

    #[test]
    fn help_and_version_exit_successfully() {
        assert_eq!(usage_of(&["-h"]), ExitStatus::Success);
        assert_eq!(usage_of(&["--help"]).code(), 0);
        assert_eq!(usage_of(&["--version"]), ExitStatus::Success);
    }

    #[test]
    fn connect_failure_never_shows_the_window() {
        let mut frontend = ScriptedFrontend::new(|_: &mut UiSession<LocalLink>| Ok(()));
        let status = launch(config(&[]), &RefusingConnector, &mut frontend);

        assert_eq!(status, ExitStatus::ConnectFailed);
        assert_ne!(status.code(), 0);
        assert_eq!(frontend.runs, 0);
        assert!(!frontend.window_shown);
    }

    #[test]
    fn bad_ui_file_is_a_configuration_failure() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"[widgets.quitdialog]\nkind = \"dialog\"\ntitle = \"q\"\ntext = \"t\"\n")
            .expect("write");
        let path = file.path().to_string_lossy().to_string();

        let mut frontend = ScriptedFrontend::new(|_: &mut UiSession<LocalLink>| Ok(()));
        let connector = LocalConnector::default();
        let status = launch(config(&["-u", &path]), &connector, &mut frontend);

        assert_eq!(status, ExitStatus::ConfigError);
        assert_eq!(frontend.runs, 0);
        assert!(connector.feed.borrow().is_none());
    }

    #[test]
    fn controller_close_ends_the_loop_and_exits_cleanly() {
        let connector = LocalConnector::default();
        let feed_slot = &connector.feed;
        let mut frontend = ScriptedFrontend::new(|session: &mut UiSession<LocalLink>| {
            let feed = feed_slot.borrow().clone().expect("connected");
            feed.close(Some("controller stopped".to_string()));
            session.process_notifications();
            anyhow::ensure!(!session.loop_running(), "loop still running");

            feed.close(None);
            session.process_notifications();
            anyhow::ensure!(
                session.reactions().run_loop().stop_requests() == 1,
                "loop stopped twice"
            );
            Ok(())
        });

        let status = launch(config(&[]), &connector, &mut frontend);
        assert_eq!(status, ExitStatus::Success);
        assert_eq!(frontend.runs, 1);
        assert!(frontend.window_shown);
    }

    #[test]
    fn confirmed_quit_from_the_window_exits_cleanly() {
        let connector = LocalConnector::default();
        let mut frontend = ScriptedFrontend::new(|session: &mut UiSession<LocalLink>| {
            anyhow::ensure!(session.request_close() == CloseDecision::Keep);
            anyhow::ensure!(
                session.respond_to_quit_dialog(ResponseCode::CONFIRM) == CloseDecision::Close
            );
            anyhow::ensure!(session.request_close() == CloseDecision::Close);
            anyhow::ensure!(session.state() == LifecycleState::Running);
            Ok(())
        });

        assert_eq!(
            launch(config(&[]), &connector, &mut frontend),
            ExitStatus::Success
        );
    }

    #[test]
    fn frontend_failure_maps_to_its_own_status() {
        let connector = LocalConnector::default();
        let mut frontend = ScriptedFrontend::new(|_: &mut UiSession<LocalLink>| {
            anyhow::bail!("no display available")
        });

        let status = launch(config(&[]), &connector, &mut frontend);
        assert_eq!(status, ExitStatus::FrontendFailed);
        assert_eq!(status.code(), 4);
    }
}
