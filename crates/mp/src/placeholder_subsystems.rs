//! Placeholder collaborators used while the media services are implemented.

use crate::subsystems::{PluginHost, Subsystem, SubsystemError};

const SUBSYSTEM_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::subsystems::noop");

/// Subsystems started by a stock daemon, in start order.
pub(crate) const PLACEHOLDER_SUBSYSTEMS: [&str; 4] = [
    "http_server",
    "database_tasks",
    "memory_tasks",
    "upnp_control_point",
];

/// Subsystem that logs lifecycle requests without running anything.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NoopSubsystem {
    name: &'static str,
}

impl NoopSubsystem {
    pub(crate) fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl Subsystem for NoopSubsystem {
    fn name(&self) -> &str {
        self.name
    }

    fn start(&self) -> Result<(), SubsystemError> {
        tracing::warn!(
            target: SUBSYSTEM_TARGET,
            subsystem = self.name,
            "subsystem start requested but not yet implemented"
        );
        Ok(())
    }

    fn stop(&self) -> Result<(), SubsystemError> {
        tracing::debug!(target: SUBSYSTEM_TARGET, subsystem = self.name, "subsystem stopped");
        Ok(())
    }
}

/// Plugin host without plugins.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct NoopPluginHost;

impl PluginHost for NoopPluginHost {
    fn reload(&self) -> Result<(), SubsystemError> {
        tracing::warn!(
            target: SUBSYSTEM_TARGET,
            "plugin reload requested but no plugin host is configured"
        );
        Ok(())
    }
}
