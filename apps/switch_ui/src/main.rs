use std::process::ExitCode;

mod config;
mod controller;
mod lifecycle;
mod session;
#[cfg(test)]
mod test_support;
mod ui;
mod ui_description;

use switch_client::TcpConnector;

use crate::{config::UiConfig, ui::EframeFrontend};

fn main() -> ExitCode {
    let config = match UiConfig::from_args(std::env::args_os()) {
        Ok(config) => config,
        Err(err) => {
            let _ = err.print();
            return lifecycle::usage_status(&err).into();
        }
    };

    config::init_tracing(&config);

    let connector = TcpConnector::new(config.connect_options());
    let mut frontend = EframeFrontend;
    lifecycle::launch(config, &connector, &mut frontend).into()
}
