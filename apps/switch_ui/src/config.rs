use std::{ffi::OsString, io::IsTerminal, path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};
use switch_client::ConnectOptions;
use tracing_subscriber::EnvFilter;

pub const CONTROLLER_ENV: &str = "SWITCH_UI_CONTROLLER";
pub const CONNECT_TIMEOUT_ENV: &str = "SWITCH_UI_CONNECT_TIMEOUT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

#[derive(Parser, Debug)]
#[command(
    name = "switch-ui",
    version,
    about = "Graphical front-end for the video switch controller"
)]
pub struct Cli {
    /// Also print debug messages.
    #[arg(short, long)]
    pub verbose: bool,
    /// Don't allow the user to quit the application from the GUI.
    #[arg(short = 'Q', long = "disallow-quit", alias = "dissalow-quit")]
    pub disallow_quit: bool,
    /// Build the GUI from a custom UI description instead of the bundled one.
    #[arg(short = 'u', long = "ui-file", value_name = "FILE")]
    pub ui_file: Option<PathBuf>,
    /// Controller address [default: 127.0.0.1:5000].
    #[arg(long, value_name = "HOST:PORT")]
    pub controller: Option<String>,
    /// Seconds to wait for the controller to accept the connection [default: 5].
    #[arg(long = "connect-timeout", value_name = "SECS")]
    pub connect_timeout: Option<u64>,
    /// When to colour log output.
    #[arg(short = 'c', long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,
}

/// Start-up configuration, fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiConfig {
    pub verbose: bool,
    pub quit_locked: bool,
    pub ui_file: Option<PathBuf>,
    pub controller_address: String,
    pub connect_timeout: Duration,
    pub color: ColorChoice,
}

impl Default for UiConfig {
    fn default() -> Self {
        let connect = ConnectOptions::default();
        Self {
            verbose: false,
            quit_locked: false,
            ui_file: None,
            controller_address: connect.address,
            connect_timeout: connect.timeout,
            color: ColorChoice::Auto,
        }
    }
}

impl UiConfig {
    pub fn from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args)?;
        Ok(Self::from_cli(cli, |name| std::env::var(name).ok()))
    }

    /// Flags win over the environment, which wins over the defaults.
    pub fn from_cli(cli: Cli, env: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self {
            verbose: cli.verbose,
            quit_locked: cli.disallow_quit,
            ui_file: cli.ui_file,
            color: cli.color,
            ..Self::default()
        };

        if let Some(address) = env(CONTROLLER_ENV).filter(|v| !v.trim().is_empty()) {
            config.controller_address = address.trim().to_string();
        }
        if let Some(secs) = env(CONNECT_TIMEOUT_ENV).and_then(|v| v.trim().parse::<u64>().ok()) {
            config.connect_timeout = Duration::from_secs(secs);
        }

        if let Some(address) = cli.controller {
            config.controller_address = address;
        }
        if let Some(secs) = cli.connect_timeout {
            config.connect_timeout = Duration::from_secs(secs);
        }

        config
    }

    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            address: self.controller_address.clone(),
            timeout: self.connect_timeout,
        }
    }
}

pub fn init_tracing(config: &UiConfig) {
    let default_level = if config.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let ansi = match config.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stderr().is_terminal(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(ansi)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("switch-ui").chain(args.iter().copied()))
            .expect("valid args")
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn no_flags_yield_defaults() {
        let config = UiConfig::from_cli(parse(&[]), no_env);
        assert_eq!(config, UiConfig::default());
        assert!(!config.quit_locked);
        assert_eq!(config.controller_address, "127.0.0.1:5000");
    }

    #[test]
    fn short_q_locks_quitting() {
        let config = UiConfig::from_cli(parse(&["-Q"]), no_env);
        assert!(config.quit_locked);
    }

    #[test]
    fn long_flags_and_legacy_spelling_are_accepted() {
        let config = UiConfig::from_cli(
            parse(&["--verbose", "--dissalow-quit", "--ui-file", "custom.toml"]),
            no_env,
        );
        assert!(config.verbose);
        assert!(config.quit_locked);
        assert_eq!(config.ui_file, Some(PathBuf::from("custom.toml")));

        let config = UiConfig::from_cli(parse(&["-v", "-u", "other.toml", "--disallow-quit"]), no_env);
        assert!(config.verbose && config.quit_locked);
        assert_eq!(config.ui_file, Some(PathBuf::from("other.toml")));
    }

    #[test]
    fn environment_overrides_defaults_but_not_flags() {
        let env = |name: &str| match name {
            CONTROLLER_ENV => Some("10.0.0.2:5000".to_string()),
            CONNECT_TIMEOUT_ENV => Some("9".to_string()),
            _ => None,
        };

        let config = UiConfig::from_cli(parse(&[]), env);
        assert_eq!(config.controller_address, "10.0.0.2:5000");
        assert_eq!(config.connect_timeout, Duration::from_secs(9));

        let config = UiConfig::from_cli(
            parse(&["--controller", "switch.local:5000", "--connect-timeout", "1"]),
            env,
        );
        assert_eq!(config.controller_address, "switch.local:5000");
        assert_eq!(config.connect_options().timeout, Duration::from_secs(1));
    }

    #[test]
    fn unknown_flag_is_a_parse_error() {
        let err = UiConfig::from_args(["switch-ui", "--frobnicate"]).expect_err("bad flag");
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn ui_file_requires_a_value() {
        assert!(UiConfig::from_args(["switch-ui", "-u"]).is_err());
    }
}
