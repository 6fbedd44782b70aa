//! Waiting for a stopped daemon's process to exit.

use std::thread;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use thiserror::Error;
use tracing::debug;

const WAITER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::waiter");

/// Delay between liveness probes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// How long [`ProcessWaiter`] waits before giving up.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocks until a process has exited.
pub trait ExitWaiter {
    /// Returns once `pid` no longer names a live process.
    ///
    /// # Errors
    ///
    /// Returns [`WaitError`] when the process outlives the wait or cannot be
    /// probed.
    fn wait_for_exit(&self, pid: u32) -> Result<(), WaitError>;
}

/// Polls a pid with the null signal until it disappears.
#[derive(Debug, Clone, Copy)]
pub struct ProcessWaiter {
    poll_interval: Duration,
    timeout: Duration,
}

impl Default for ProcessWaiter {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT)
    }
}

impl ProcessWaiter {
    /// Builds a waiter with explicit timings.
    #[must_use]
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval,
            timeout,
        }
    }

    /// Upper bound on a single wait.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl ExitWaiter for ProcessWaiter {
    fn wait_for_exit(&self, pid: u32) -> Result<(), WaitError> {
        let target = process_id(pid)?;
        let deadline = Instant::now() + self.timeout;
        loop {
            if !is_alive(target, pid)? {
                debug!(target: WAITER_TARGET, pid, "process exited");
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(WaitError::Timeout {
                    pid,
                    timeout: self.timeout,
                });
            }
            thread::sleep(self.poll_interval.min(deadline - now));
        }
    }
}

fn process_id(pid: u32) -> Result<Pid, WaitError> {
    match i32::try_from(pid) {
        Ok(raw) if raw > 0 => Ok(Pid::from_raw(raw)),
        _ => Err(WaitError::InvalidPid { pid }),
    }
}

// EPERM means the pid exists under another user.
fn is_alive(target: Pid, pid: u32) -> Result<bool, WaitError> {
    match kill(target, None) {
        Ok(()) | Err(Errno::EPERM) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(source) => Err(WaitError::CheckProcess { pid, source }),
    }
}

/// Errors raised while waiting for a process to exit.
#[derive(Debug, Error)]
pub enum WaitError {
    /// The process was still alive when the wait ended.
    #[error("process {pid} did not exit within {timeout:?}")]
    Timeout {
        /// Process that outlived the wait.
        pid: u32,
        /// Bound that elapsed.
        timeout: Duration,
    },
    /// The pid cannot name a single process.
    #[error("pid {pid} does not name a single process")]
    InvalidPid {
        /// Rejected pid.
        pid: u32,
    },
    /// Probing the process failed.
    #[error("failed to probe process {pid}: {source}")]
    CheckProcess {
        /// Probed process.
        pid: u32,
        /// Underlying OS error.
        #[source]
        source: Errno,
    },
}
