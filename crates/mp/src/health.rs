//! Lifecycle events surfaced to operators.

use std::sync::Arc;

use mp_config::{BusChannel, Config};
use mp_hooks::HookError;

use crate::supervisor::LaunchError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer notified as the daemon moves through its lifecycle.
pub trait HealthReporter: Send + Sync {
    /// Before configuration is loaded.
    fn bootstrap_starting(&self);

    /// Configuration and telemetry are ready.
    fn bootstrap_succeeded(&self, config: &Config);

    /// The launch failed before the accept loop was entered.
    fn launch_failed(&self, error: &LaunchError);

    /// The bus channel was bound.
    fn bus_bound(&self, channel: &BusChannel);

    /// Every `Status.onStartup` handler succeeded.
    fn startup_completed(&self);

    /// The accept loop returned and shutdown handlers are about to run.
    fn shutdown_starting(&self);

    /// A `Status.onShutdown` handler failed; shutdown carries on.
    fn shutdown_handler_failed(&self, error: &HookError);

    /// Shutdown finished and the dispatcher was freed.
    fn shutdown_completed(&self);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn launch_failed(&self, error: &LaunchError) {
        (**self).launch_failed(error);
    }

    fn bus_bound(&self, channel: &BusChannel) {
        (**self).bus_bound(channel);
    }

    fn startup_completed(&self) {
        (**self).startup_completed();
    }

    fn shutdown_starting(&self) {
        (**self).shutdown_starting();
    }

    fn shutdown_handler_failed(&self, error: &HookError) {
        (**self).shutdown_handler_failed(error);
    }

    fn shutdown_completed(&self) {
        (**self).shutdown_completed();
    }
}

/// Default reporter that records lifecycle events with `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting daemon bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            bus_socket = %config.bus_socket(),
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            "daemon bootstrap completed"
        );
    }

    fn launch_failed(&self, error: &LaunchError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "launch_failed",
            error = %error,
            "daemon launch failed"
        );
    }

    fn bus_bound(&self, channel: &BusChannel) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bus_bound",
            channel = %channel,
            "bus channel ready"
        );
    }

    fn startup_completed(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "startup_completed",
            "subsystems started"
        );
    }

    fn shutdown_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "shutdown_starting",
            "stopping subsystems"
        );
    }

    fn shutdown_handler_failed(&self, error: &HookError) {
        tracing::warn!(
            target: HEALTH_TARGET,
            event = "shutdown_handler_failed",
            error = %error,
            "subsystem failed to stop cleanly"
        );
    }

    fn shutdown_completed(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "shutdown_completed",
            "daemon shutdown completed"
        );
    }
}
