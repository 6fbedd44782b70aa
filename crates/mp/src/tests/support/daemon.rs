//! A supervised daemon running on a background thread.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use mp_config::BusChannel;
use serde_json::Value;

use super::{EventLog, RecordingHealthReporter, TestConfigLoader, TestShutdownSignal};
use crate::subsystems::Collaborators;
use crate::supervisor::{ProcessSupervisor, SupervisorControl, SupervisorState};

const READY_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(10);

pub(crate) struct TestDaemon {
    loader: TestConfigLoader,
    signal: Arc<TestShutdownSignal>,
    control: Arc<SupervisorControl>,
    thread: Option<JoinHandle<Result<(), String>>>,
}

impl TestDaemon {
    /// Launches a supervisor and waits until it serves the bus.
    pub(crate) fn start(log: &EventLog, collaborators: Collaborators) -> Self {
        Self::start_with(log, collaborators, |_| {})
    }

    /// Like [`Self::start`], letting `prepare` adjust the supervisor first.
    pub(crate) fn start_with<F>(log: &EventLog, collaborators: Collaborators, prepare: F) -> Self
    where
        F: FnOnce(&ProcessSupervisor),
    {
        let loader = TestConfigLoader::new();
        let signal = Arc::new(TestShutdownSignal::default());
        let supervisor = ProcessSupervisor::new(
            Arc::new(RecordingHealthReporter::new(log.clone())),
            collaborators,
        );
        prepare(&supervisor);
        let control = supervisor.control();

        let thread_loader = loader.clone();
        let thread_signal = Arc::clone(&signal);
        let thread = thread::spawn(move || {
            supervisor
                .run(&thread_loader, &*thread_signal)
                .map_err(|error| error.to_string())
        });

        let mut daemon = Self {
            loader,
            signal,
            control,
            thread: Some(thread),
        };
        daemon.wait_until_running();
        daemon
    }

    fn wait_until_running(&mut self) {
        let deadline = Instant::now() + READY_TIMEOUT;
        while self.control.state() != SupervisorState::Running {
            if self.thread.as_ref().is_some_and(JoinHandle::is_finished) {
                panic!("daemon exited during launch: {:?}", self.join());
            }
            assert!(Instant::now() < deadline, "daemon did not start");
            thread::sleep(POLL_INTERVAL);
        }
    }

    pub(crate) fn loader(&self) -> &TestConfigLoader {
        &self.loader
    }

    pub(crate) fn channel(&self) -> BusChannel {
        self.loader.channel()
    }

    pub(crate) fn control(&self) -> &SupervisorControl {
        &self.control
    }

    pub(crate) fn raise_signal(&self) {
        assert!(self.signal.raise(), "signal listener was not installed");
    }

    /// Waits for the run to finish and returns its outcome.
    pub(crate) fn join(&mut self) -> Result<(), String> {
        let thread = self.thread.take().expect("daemon already joined");
        let deadline = Instant::now() + READY_TIMEOUT;
        while !thread.is_finished() {
            assert!(Instant::now() < deadline, "daemon did not stop");
            thread::sleep(POLL_INTERVAL);
        }
        thread.join().expect("daemon thread panicked")
    }
}

impl Drop for TestDaemon {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.control.stop(Value::Null);
            drop(thread.join());
        }
    }
}
