//! Command-line surface of the `mp` binary.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

/// What this invocation should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    /// Become the daemon.
    RunDaemon,
    /// Ask the running daemon to stop and wait for it to exit.
    Stop,
    /// Ask the running daemon to reload its plugins.
    ReloadPlugins,
}

/// Command-line interface for the `mp` daemon.
#[derive(Parser, Debug)]
#[command(
    name = "mp",
    about = "Media provider daemon and control client",
    version
)]
pub(crate) struct Cli {
    /// Stops the running daemon and waits for its process to exit.
    #[arg(long, conflicts_with = "reload_plugins")]
    pub(crate) stop: bool,
    /// Asks the running daemon to reload its plugins.
    #[arg(long = "reload-plugins", alias = "reloadPlugins")]
    pub(crate) reload_plugins: bool,
    /// Additional settings file layered over the defaults.
    #[arg(
        long = "additional-settings",
        alias = "additionalSettings",
        value_name = "PATH"
    )]
    pub(crate) additional_settings: Option<PathBuf>,
    /// Bus channel endpoint, e.g. `unix:///run/mp/mp_bus.sock`.
    #[arg(long, value_name = "URL")]
    pub(crate) bus_socket: Option<String>,
    /// Telemetry filter expression.
    #[arg(long, value_name = "FILTER")]
    pub(crate) log_filter: Option<String>,
    /// Telemetry output format (`json` or `compact`).
    #[arg(long, value_name = "FORMAT")]
    pub(crate) log_format: Option<String>,
}

impl Cli {
    pub(crate) fn action(&self) -> Action {
        if self.stop {
            Action::Stop
        } else if self.reload_plugins {
            Action::ReloadPlugins
        } else {
            Action::RunDaemon
        }
    }

    /// Arguments forwarded to the layered configuration loader.
    ///
    /// The settings file travels as `--config-path`; configuration flags are
    /// passed through verbatim so the loader applies them last.
    pub(crate) fn config_arguments(&self) -> Vec<OsString> {
        let mut arguments = vec![OsString::from("mp")];
        if let Some(path) = &self.additional_settings {
            arguments.push(OsString::from("--config-path"));
            arguments.push(path.clone().into_os_string());
        }
        let flags = [
            ("--bus-socket", &self.bus_socket),
            ("--log-filter", &self.log_filter),
            ("--log-format", &self.log_format),
        ];
        for (flag, value) in flags {
            if let Some(value) = value {
                arguments.push(OsString::from(flag));
                arguments.push(OsString::from(value));
            }
        }
        arguments
    }
}
