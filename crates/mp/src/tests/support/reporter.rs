//! Health reporter that records lifecycle events for assertions.

use mp_config::{BusChannel, Config};
use mp_hooks::HookError;

use super::collaborators::EventLog;
use crate::health::HealthReporter;
use crate::supervisor::LaunchError;

/// Everything observable during a supervised run, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    BootstrapStarting,
    BootstrapSucceeded,
    LaunchFailed(String),
    BusBound(String),
    StartupCompleted,
    ShutdownStarting,
    ShutdownHandlerFailed(String),
    ShutdownCompleted,
    SubsystemStarted(&'static str),
    SubsystemStopped(&'static str),
    PluginsReloaded,
    CacheDisabled,
}

pub(crate) struct RecordingHealthReporter {
    log: EventLog,
}

impl RecordingHealthReporter {
    pub(crate) fn new(log: EventLog) -> Self {
        Self { log }
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.log.record(Event::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.log.record(Event::BootstrapSucceeded);
    }

    fn launch_failed(&self, error: &LaunchError) {
        self.log.record(Event::LaunchFailed(error.to_string()));
    }

    fn bus_bound(&self, channel: &BusChannel) {
        self.log.record(Event::BusBound(channel.name().to_owned()));
    }

    fn startup_completed(&self) {
        self.log.record(Event::StartupCompleted);
    }

    fn shutdown_starting(&self) {
        self.log.record(Event::ShutdownStarting);
    }

    fn shutdown_handler_failed(&self, error: &HookError) {
        self.log.record(Event::ShutdownHandlerFailed(error.to_string()));
    }

    fn shutdown_completed(&self) {
        self.log.record(Event::ShutdownCompleted);
    }
}
