//! Client-mode actions against a running daemon.

use std::io::{self, Write};

use mp_bus::{BusClient, ClientError};
use mp_config::BusChannel;
use mp_hooks::names::{PLUGINS_RELOAD, STATUS_GET_OS_PID, STATUS_STOP};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::waiter::{ExitWaiter, WaitError};

const CONTROL_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::control");

/// Failures of a client-mode action.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The bus request failed.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// `Status.getOSPid` did not answer with a usable pid.
    #[error("daemon answered {hook} with {value} instead of a pid", hook = STATUS_GET_OS_PID)]
    UnexpectedPid {
        /// Value the daemon returned.
        value: Value,
    },
    /// The daemon accepted the stop but its process did not exit.
    #[error("daemon pid {pid} did not stop: {source}")]
    Wait {
        /// Daemon process id.
        pid: u32,
        /// Underlying wait failure.
        #[source]
        source: WaitError,
    },
    /// Reporting the outcome failed.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// Stops the daemon serving `channel` and waits for its process to exit.
///
/// # Errors
///
/// Returns [`ControlError`] when no daemon answers, the pid reply is
/// unusable, or the process outlives the waiter.
pub fn stop_daemon<X, O>(channel: &BusChannel, waiter: &X, out: &mut O) -> Result<(), ControlError>
where
    X: ExitWaiter + ?Sized,
    O: Write + ?Sized,
{
    let mut client = BusClient::connect(channel)?;
    let reply = client.request(STATUS_GET_OS_PID, None)?;
    let pid = pid_from(reply)?;
    client.request(STATUS_STOP, None)?;
    client.disconnect();
    info!(target: CONTROL_TARGET, pid, channel = %channel, "stop accepted; waiting for exit");

    waiter
        .wait_for_exit(pid)
        .map_err(|source| ControlError::Wait { pid, source })?;
    writeln!(out, "daemon pid {pid} stopped cleanly")?;
    Ok(())
}

/// Asks the daemon serving `channel` to reload its plugins.
///
/// # Errors
///
/// Returns [`ControlError`] when no daemon answers or the reload fails.
pub fn reload_plugins<O>(channel: &BusChannel, out: &mut O) -> Result<(), ControlError>
where
    O: Write + ?Sized,
{
    let mut client = BusClient::connect(channel)?;
    client.request(PLUGINS_RELOAD, None)?;
    client.disconnect();
    writeln!(out, "plugins reloaded")?;
    Ok(())
}

fn pid_from(value: Value) -> Result<u32, ControlError> {
    value
        .as_u64()
        .and_then(|pid| u32::try_from(pid).ok())
        .filter(|pid| *pid > 0)
        .ok_or(ControlError::UnexpectedPid { value })
}
