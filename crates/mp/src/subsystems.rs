//! Collaborators the supervisor drives through lifecycle hooks.
//!
//! Subsystems (HTTP serving, task runners, the UPnP control point) are
//! opaque to the control plane: each is started from `Status.onStartup` and
//! stopped from `Status.onShutdown`, in the order it was handed to the
//! supervisor.

use std::sync::Arc;

use thiserror::Error;

use crate::placeholder_subsystems::{NoopPluginHost, NoopSubsystem, PLACEHOLDER_SUBSYSTEMS};

/// A long-running service started and stopped with the daemon.
pub trait Subsystem: Send + Sync {
    /// Name used in telemetry and errors.
    fn name(&self) -> &str;

    /// Starts the service.
    ///
    /// # Errors
    ///
    /// A failure aborts the daemon launch.
    fn start(&self) -> Result<(), SubsystemError>;

    /// Stops the service. Must be safe to call after an earlier subsystem
    /// failed to stop.
    ///
    /// # Errors
    ///
    /// A failure is reported and shutdown carries on.
    fn stop(&self) -> Result<(), SubsystemError>;
}

/// Owner of the daemon's plugins.
pub trait PluginHost: Send + Sync {
    /// Reloads every plugin.
    ///
    /// # Errors
    ///
    /// Returned to the client that requested the reload.
    fn reload(&self) -> Result<(), SubsystemError>;
}

/// Handle on the optional shared cache.
pub trait CacheControl: Send + Sync {
    /// Disables the cache once subsystems have stopped.
    fn disable(&self);
}

/// Failure reported by a collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{subsystem}: {message}")]
pub struct SubsystemError {
    subsystem: String,
    message: String,
}

impl SubsystemError {
    /// Describes a failure of `subsystem`.
    #[must_use]
    pub fn new(subsystem: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subsystem: subsystem.into(),
            message: message.into(),
        }
    }

    /// Name of the failing collaborator.
    #[must_use]
    pub fn subsystem(&self) -> &str {
        &self.subsystem
    }

    /// Failure description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Everything the supervisor starts, stops or reloads on the daemon's behalf.
pub struct Collaborators {
    /// Subsystems in start order.
    pub subsystems: Vec<Arc<dyn Subsystem>>,
    /// Target of `Plugins.reload`.
    pub plugins: Arc<dyn PluginHost>,
    /// Cache disabled at shutdown, when one is configured.
    pub cache: Option<Arc<dyn CacheControl>>,
}

impl Collaborators {
    /// Collaborators used until the real services are wired in.
    #[must_use]
    pub fn placeholders() -> Self {
        Self {
            subsystems: PLACEHOLDER_SUBSYSTEMS
                .into_iter()
                .map(|name| Arc::new(NoopSubsystem::new(name)) as Arc<dyn Subsystem>)
                .collect(),
            plugins: Arc::new(NoopPluginHost),
            cache: None,
        }
    }
}
