//! Termination-signal handling.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::{Handle, Signals};
use thiserror::Error;
use tracing::{info, warn};

use super::SUPERVISOR_TARGET;

const SHUTDOWN_SIGNALS: [i32; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];

/// Callback invoked for every termination signal received.
pub type StopCallback = Arc<dyn Fn() + Send + Sync>;

/// Source of termination requests delivered outside the bus.
pub trait ShutdownSignal: Send + Sync {
    /// Starts listening; `on_signal` runs for every request received until
    /// the returned listener is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error when the listener cannot be installed.
    fn install(&self, on_signal: StopCallback) -> Result<SignalListener, ShutdownError>;
}

/// Errors raised while installing a signal listener.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Signal handlers could not be registered.
    #[error("failed to register signal handlers: {source}")]
    Register {
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// The listener thread could not be spawned.
    #[error("failed to spawn signal listener thread: {source}")]
    Spawn {
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
}

/// Running signal listener. Dropping it stops listening.
#[derive(Default)]
pub struct SignalListener {
    handle: Option<Handle>,
    thread: Option<JoinHandle<()>>,
}

impl SignalListener {
    /// A listener with nothing to stop.
    #[must_use]
    pub fn inert() -> Self {
        Self::default()
    }
}

impl Drop for SignalListener {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.close();
        }
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            warn!(target: SUPERVISOR_TARGET, "signal listener thread panicked");
        }
    }
}

/// Listens for `SIGTERM`, `SIGINT`, `SIGQUIT` and `SIGHUP`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl SystemShutdownSignal {
    /// Builds the process-wide signal source.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn install(&self, on_signal: StopCallback) -> Result<SignalListener, ShutdownError> {
        let mut signals =
            Signals::new(SHUTDOWN_SIGNALS).map_err(|source| ShutdownError::Register { source })?;
        let handle = signals.handle();
        let thread = thread::Builder::new()
            .name("mp-signals".to_owned())
            .spawn(move || {
                for signal in signals.forever() {
                    info!(target: SUPERVISOR_TARGET, signal, "termination signal received");
                    on_signal();
                }
            })
            .map_err(|source| ShutdownError::Spawn { source })?;
        Ok(SignalListener {
            handle: Some(handle),
            thread: Some(thread),
        })
    }
}
