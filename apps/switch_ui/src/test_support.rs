//! In-memory controller and canned sessions for the switch-ui tests.

use std::cell::RefCell;

use shared::domain::ClientRole;
use switch_client::{local_link, ConnectError, Connector, LocalFeed, LocalLink};

use crate::{config::UiConfig, session::UiSession, ui_description::UiDescription};

#[derive(Default)]
pub(crate) struct LocalConnector {
    pub(crate) feed: RefCell<Option<LocalFeed>>,
    pub(crate) roles: RefCell<Vec<ClientRole>>,
}

impl Connector for LocalConnector {
    type Link = LocalLink;

    fn connect(&self, role: ClientRole) -> Result<LocalLink, ConnectError> {
        self.roles.borrow_mut().push(role);
        let (link, feed) = local_link(role);
        *self.feed.borrow_mut() = Some(feed);
        Ok(link)
    }
}

impl LocalConnector {
    pub(crate) fn feed(&self) -> LocalFeed {
        self.feed.borrow().clone().expect("connected")
    }
}

pub(crate) fn config(args: &[&str]) -> UiConfig {
    UiConfig::from_args(std::iter::once("switch-ui").chain(args.iter().copied())).expect("args")
}

/// A session built from the bundled description, connected and inside its run loop.
pub(crate) fn running_session(args: &[&str]) -> (UiSession<LocalLink>, LocalConnector) {
    let connector = LocalConnector::default();
    let mut session = UiSession::new();
    session.configure(config(args)).expect("configure");
    session
        .setup(&UiDescription::bundled().expect("bundled"))
        .expect("setup");
    session.connect(&connector).expect("connect");
    session.enter_run_loop().expect("run");
    (session, connector)
}
