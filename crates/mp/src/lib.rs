//! Control plane of the `mp` media daemon.
//!
//! A fresh invocation either becomes the daemon or acts as a client of one
//! that is already running. As the daemon, a [`ProcessSupervisor`] loads
//! configuration, registers the control hooks on a
//! [`mp_hooks::HookDispatcher`], binds the bus channel, starts the
//! subsystems through `Status.onStartup` and serves bus requests until it is
//! asked to stop. As a client, the process sends one request over the bus
//! (`Status.stop` or `Plugins.reload`) and, when stopping, waits for the
//! daemon's process to exit with a [`ProcessWaiter`].

mod cli;
mod client;
mod config;
mod health;
mod placeholder_subsystems;
mod subsystems;
mod supervisor;
mod telemetry;
mod waiter;

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;

use crate::cli::{Action, Cli};

pub use client::{ControlError, reload_plugins, stop_daemon};
pub use config::{ConfigLoader, OrthoConfigLoader, StaticConfigLoader};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use subsystems::{CacheControl, Collaborators, PluginHost, Subsystem, SubsystemError};
pub use supervisor::{
    LaunchError, ProcessRecord, ProcessSupervisor, ShutdownError, ShutdownSignal, SignalListener,
    StopCallback, SupervisorControl, SupervisorState, SystemShutdownSignal, run_daemon,
};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use waiter::{
    DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT, ExitWaiter, ProcessWaiter, WaitError,
};

/// Runs `mp` with the given arguments and output streams.
///
/// Returns [`ExitCode::SUCCESS`] after a normal daemon run or a completed
/// client action and [`ExitCode::FAILURE`] otherwise. Failures are written to
/// `stderr`.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) if matches!(error.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = write!(stdout, "{error}");
            return ExitCode::SUCCESS;
        }
        Err(error) => {
            let _ = write!(stderr, "{error}");
            return ExitCode::FAILURE;
        }
    };

    let loader = OrthoConfigLoader::new(cli.config_arguments());
    let outcome = match cli.action() {
        Action::RunDaemon => run_daemon(&loader).map_err(|error| error.to_string()),
        Action::Stop => load_then(&loader, |config| {
            stop_daemon(&config.bus_channel(), &ProcessWaiter::default(), stdout)
        }),
        Action::ReloadPlugins => {
            load_then(&loader, |config| reload_plugins(&config.bus_channel(), stdout))
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            let _ = writeln!(stderr, "{message}");
            ExitCode::FAILURE
        }
    }
}

fn load_then<F>(loader: &OrthoConfigLoader, action: F) -> Result<(), String>
where
    F: FnOnce(mp_config::Config) -> Result<(), ControlError>,
{
    let config = loader
        .load()
        .map_err(|error| format!("failed to load configuration: {error}"))?;
    action(config).map_err(|error| error.to_string())
}

#[cfg(test)]
mod tests;
