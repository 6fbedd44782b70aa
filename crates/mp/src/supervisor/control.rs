use std::sync::{Mutex, MutexGuard, PoisonError};

use mp_bus::BusStopHandle;
use once_cell::sync::OnceCell;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::SUPERVISOR_TARGET;
use super::record::ProcessRecord;

/// Phase of the daemon lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// Launch in progress; the accept loop has not started.
    Starting,
    /// Serving bus requests.
    Running,
    /// A stop was requested; the accept loop has not returned yet.
    Stopping,
    /// The accept loop returned.
    Stopped,
}

/// Shared control surface of a running supervisor.
///
/// Handed to the `Status.stop` hook, the signal listener and anyone else who
/// may need to stop the daemon or read its process record.
#[derive(Debug)]
pub struct SupervisorControl {
    inner: Mutex<ControlState>,
    record: OnceCell<ProcessRecord>,
}

#[derive(Debug)]
struct ControlState {
    phase: SupervisorState,
    server: Option<BusStopHandle>,
}

impl SupervisorControl {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(ControlState {
                phase: SupervisorState::Starting,
                server: None,
            }),
            record: OnceCell::new(),
        }
    }

    /// Requests shutdown and hands back `last_return` untouched.
    ///
    /// Only the first call after the bus is bound has an effect; every other
    /// call is a no-op.
    pub fn stop(&self, last_return: Value) -> Value {
        let mut state = self.lock();
        match state.server.take() {
            Some(server) => {
                state.phase = SupervisorState::Stopping;
                server.stop();
                info!(target: SUPERVISOR_TARGET, "daemon stop requested");
            }
            None => debug!(target: SUPERVISOR_TARGET, phase = ?state.phase, "stop ignored"),
        }
        last_return
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn state(&self) -> SupervisorState {
        self.lock().phase
    }

    /// Process record, once the bus is bound.
    #[must_use]
    pub fn record(&self) -> Option<&ProcessRecord> {
        self.record.get()
    }

    pub(crate) fn attach(&self, server: BusStopHandle) {
        self.lock().server = Some(server);
    }

    pub(crate) fn record_start(&self, record: ProcessRecord) {
        if self.record.set(record).is_err() {
            warn!(target: SUPERVISOR_TARGET, "process start already recorded");
        }
    }

    pub(crate) fn mark_running(&self) {
        let mut state = self.lock();
        if state.phase == SupervisorState::Starting {
            state.phase = SupervisorState::Running;
        }
    }

    pub(crate) fn mark_stopped(&self) {
        let mut state = self.lock();
        state.server = None;
        state.phase = SupervisorState::Stopped;
    }

    fn lock(&self) -> MutexGuard<'_, ControlState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
