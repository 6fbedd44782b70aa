//! Test doubles and a background daemon harness.

mod collaborators;
mod config_loader;
mod daemon;
mod reporter;
mod signal;

pub(crate) use collaborators::{EventLog, RecordingSubsystem, recording_collaborators};
pub(crate) use config_loader::TestConfigLoader;
pub(crate) use daemon::TestDaemon;
pub(crate) use reporter::{Event, RecordingHealthReporter};
pub(crate) use signal::{FailingShutdownSignal, TestShutdownSignal};
