use std::sync::Arc;

use mp_bus::BusServer;
use mp_hooks::HookDispatcher;
use mp_hooks::names::{STATUS_ON_SHUTDOWN, STATUS_ON_STARTUP};
use serde_json::Value;
use tracing::debug;

use super::SUPERVISOR_TARGET;
use super::control::SupervisorControl;
use super::errors::LaunchError;
use super::hooks::{register_control_hooks, register_subsystems};
use super::record::ProcessRecord;
use super::shutdown::{ShutdownSignal, SignalListener, StopCallback, SystemShutdownSignal};
use crate::config::ConfigLoader;
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::subsystems::Collaborators;
use crate::telemetry;

/// Owns one daemon run from configuration loading to shutdown.
pub struct ProcessSupervisor {
    dispatcher: Arc<HookDispatcher>,
    control: Arc<SupervisorControl>,
    reporter: Arc<dyn HealthReporter>,
    collaborators: Collaborators,
}

impl ProcessSupervisor {
    /// Prepares a supervisor; nothing runs until [`Self::run`].
    #[must_use]
    pub fn new(reporter: Arc<dyn HealthReporter>, collaborators: Collaborators) -> Self {
        Self {
            dispatcher: Arc::new(HookDispatcher::new()),
            control: Arc::new(SupervisorControl::new()),
            reporter,
            collaborators,
        }
    }

    /// Control surface usable from other threads while [`Self::run`] blocks.
    #[must_use]
    pub fn control(&self) -> Arc<SupervisorControl> {
        Arc::clone(&self.control)
    }

    /// The dispatcher the daemon serves. Extra hooks registered before
    /// [`Self::run`] are reachable over the bus.
    #[must_use]
    pub fn dispatcher(&self) -> Arc<HookDispatcher> {
        Arc::clone(&self.dispatcher)
    }

    /// Launches the daemon and blocks until it has been stopped and shut down.
    ///
    /// Subsystems started before a failing `Status.onStartup` handler are
    /// left running and `Status.onShutdown` is not fired.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError`] when any launch step fails. Shutdown handler
    /// failures are reported through the [`HealthReporter`] instead.
    pub fn run<L, S>(self, loader: &L, signal: &S) -> Result<(), LaunchError>
    where
        L: ConfigLoader + ?Sized,
        S: ShutdownSignal + ?Sized,
    {
        self.reporter.bootstrap_starting();
        let server = match self.start(loader) {
            Ok(server) => server,
            Err(error) => return Err(self.abort(error)),
        };

        let listener = match signal.install(self.stop_callback()) {
            Ok(listener) => listener,
            Err(error) => {
                drop(server);
                self.shutdown(SignalListener::inert());
                return Err(self.abort(error.into()));
            }
        };

        self.control.mark_running();
        server.run(&self.dispatcher);
        self.control.mark_stopped();
        self.shutdown(listener);
        Ok(())
    }

    fn start<L>(&self, loader: &L) -> Result<BusServer, LaunchError>
    where
        L: ConfigLoader + ?Sized,
    {
        let config = loader.load()?;
        telemetry::initialise(&config)?;
        self.reporter.bootstrap_succeeded(&config);

        if self.collaborators.cache.is_some() {
            debug!(target: SUPERVISOR_TARGET, "cache collaborator resolved");
        }
        register_control_hooks(&self.dispatcher, &self.control, &self.collaborators.plugins);

        let channel = config.bus_channel();
        let server = BusServer::bind(&channel)?;
        self.control.attach(server.stop_handle());
        self.reporter.bus_bound(&channel);
        self.control.record_start(ProcessRecord::capture());

        register_subsystems(&self.dispatcher, &self.collaborators.subsystems);
        self.dispatcher
            .call(STATUS_ON_STARTUP, None)
            .map_err(|source| LaunchError::SubsystemStartup { source })?;
        self.reporter.startup_completed();
        Ok(server)
    }

    fn stop_callback(&self) -> StopCallback {
        let control = Arc::clone(&self.control);
        Arc::new(move || {
            control.stop(Value::Null);
        })
    }

    fn abort(&self, error: LaunchError) -> LaunchError {
        self.reporter.launch_failed(&error);
        self.dispatcher.free();
        error
    }

    fn shutdown(&self, listener: SignalListener) {
        drop(listener);
        self.reporter.shutdown_starting();
        let (_, failures) = self.dispatcher.call_best_effort(STATUS_ON_SHUTDOWN, None);
        for failure in &failures {
            self.reporter.shutdown_handler_failed(failure);
        }
        if let Some(cache) = &self.collaborators.cache {
            cache.disable();
        }
        self.dispatcher.free();
        self.reporter.shutdown_completed();
    }
}

/// Runs the stock daemon: structured health reporting, placeholder
/// subsystems and the process-wide termination signals.
///
/// # Errors
///
/// Returns [`LaunchError`] when the launch fails.
pub fn run_daemon<L>(loader: &L) -> Result<(), LaunchError>
where
    L: ConfigLoader + ?Sized,
{
    let reporter: Arc<dyn HealthReporter> = Arc::new(StructuredHealthReporter::new());
    ProcessSupervisor::new(reporter, Collaborators::placeholders())
        .run(loader, &SystemShutdownSignal::new())
}
