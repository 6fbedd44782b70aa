//! Subsystem, plugin and cache doubles sharing one event log.

use std::sync::{Arc, Mutex};

use super::reporter::Event;
use crate::subsystems::{CacheControl, Collaborators, PluginHost, Subsystem, SubsystemError};

/// Shared, ordered record of [`Event`]s.
#[derive(Debug, Clone, Default)]
pub(crate) struct EventLog {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventLog {
    pub(crate) fn record(&self, event: Event) {
        self.events.lock().expect("event log poisoned").push(event);
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.lock().expect("event log poisoned").clone()
    }

    pub(crate) fn contains(&self, event: &Event) -> bool {
        self.events().contains(event)
    }

    /// Index of `event`, panicking when it was never recorded.
    pub(crate) fn position(&self, event: &Event) -> usize {
        let events = self.events();
        events
            .iter()
            .position(|candidate| candidate == event)
            .unwrap_or_else(|| panic!("{event:?} missing from {events:?}"))
    }
}

pub(crate) struct RecordingSubsystem {
    name: &'static str,
    log: EventLog,
    fail_start: bool,
    fail_stop: bool,
}

impl RecordingSubsystem {
    pub(crate) fn new(name: &'static str, log: &EventLog) -> Self {
        Self {
            name,
            log: log.clone(),
            fail_start: false,
            fail_stop: false,
        }
    }

    pub(crate) fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub(crate) fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }
}

impl Subsystem for RecordingSubsystem {
    fn name(&self) -> &str {
        self.name
    }

    fn start(&self) -> Result<(), SubsystemError> {
        if self.fail_start {
            return Err(SubsystemError::new(self.name, "port already taken"));
        }
        self.log.record(Event::SubsystemStarted(self.name));
        Ok(())
    }

    fn stop(&self) -> Result<(), SubsystemError> {
        if self.fail_stop {
            return Err(SubsystemError::new(self.name, "worker did not drain"));
        }
        self.log.record(Event::SubsystemStopped(self.name));
        Ok(())
    }
}

pub(crate) struct RecordingPlugins {
    log: EventLog,
}

impl PluginHost for RecordingPlugins {
    fn reload(&self) -> Result<(), SubsystemError> {
        self.log.record(Event::PluginsReloaded);
        Ok(())
    }
}

pub(crate) struct RecordingCache {
    log: EventLog,
}

impl CacheControl for RecordingCache {
    fn disable(&self) {
        self.log.record(Event::CacheDisabled);
    }
}

/// Collaborators that log to `log`: the given subsystems, a recording plugin
/// host and a recording cache.
pub(crate) fn recording_collaborators(
    log: &EventLog,
    subsystems: Vec<RecordingSubsystem>,
) -> Collaborators {
    Collaborators {
        subsystems: subsystems
            .into_iter()
            .map(|subsystem| Arc::new(subsystem) as Arc<dyn Subsystem>)
            .collect(),
        plugins: Arc::new(RecordingPlugins { log: log.clone() }),
        cache: Some(Arc::new(RecordingCache { log: log.clone() })),
    }
}
