use std::sync::Arc;

use mp_bus::BusError;
use mp_hooks::HookError;
use ortho_config::OrthoError;
use thiserror::Error;

use super::shutdown::ShutdownError;
use crate::telemetry::TelemetryError;

/// Errors that abort a daemon launch.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration could not be loaded.
    #[error("failed to load configuration: {source}")]
    Config {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry could not be installed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The bus channel could not be bound.
    #[error(transparent)]
    Bus {
        /// Underlying bind error.
        #[from]
        source: BusError,
    },
    /// A `Status.onStartup` handler failed.
    #[error("subsystem startup failed: {source}")]
    SubsystemStartup {
        /// Error returned by the failing handler.
        #[source]
        source: HookError,
    },
    /// The termination-signal listener could not be installed.
    #[error("failed to install shutdown signal listener: {source}")]
    Signal {
        /// Underlying installation error.
        #[source]
        source: ShutdownError,
    },
}

impl From<Arc<OrthoError>> for LaunchError {
    fn from(source: Arc<OrthoError>) -> Self {
        Self::Config { source }
    }
}

impl From<TelemetryError> for LaunchError {
    fn from(source: TelemetryError) -> Self {
        Self::Telemetry { source }
    }
}

impl From<ShutdownError> for LaunchError {
    fn from(source: ShutdownError) -> Self {
        Self::Signal { source }
    }
}
