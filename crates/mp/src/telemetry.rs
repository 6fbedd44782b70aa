//! Process-wide `tracing` setup for the daemon.

use std::io::{self, IsTerminal};

use mp_config::{Config, LogFormat};
use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::subscriber::{SetGlobalDefaultError, set_global_default};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::{self, time::UtcTime};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

static INSTALLED: OnceCell<LogFormat> = OnceCell::new();

/// Proof that telemetry is installed, carrying the format in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
}

impl TelemetryHandle {
    /// Output format chosen by the first successful installation.
    #[must_use]
    pub fn format(&self) -> LogFormat {
        self.format
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured filter expression did not parse.
    #[error("invalid log filter '{filter}': {source}")]
    Filter {
        /// Rejected expression.
        filter: String,
        /// Parser diagnostic.
        #[source]
        source: ParseError,
    },
    /// Another global subscriber was installed first.
    #[error("failed to install telemetry subscriber: {source}")]
    Install {
        /// Underlying registration error.
        #[source]
        source: SetGlobalDefaultError,
    },
}

/// Installs the global subscriber on first use.
///
/// Later calls keep the first configuration and succeed, so a process that
/// launches more than one supervisor (as the test suite does) logs once.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or a foreign global
/// subscriber is already in place.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    INSTALLED
        .get_or_try_init(|| install(config))
        .map(|format| TelemetryHandle { format: *format })
}

fn install(config: &Config) -> Result<LogFormat, TelemetryError> {
    let filter =
        EnvFilter::try_new(config.log_filter()).map_err(|source| TelemetryError::Filter {
            filter: config.log_filter().to_owned(),
            source,
        })?;
    let format = config.log_format();
    let subscriber = Registry::default().with(output_layer(format)).with(filter);
    set_global_default(subscriber).map_err(|source| TelemetryError::Install { source })?;
    Ok(format)
}

// Events go to stderr; stdout is reserved for client-mode results.
fn output_layer(format: LogFormat) -> Box<dyn Layer<Registry> + Send + Sync> {
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339())
        .with_target(true);
    match format {
        LogFormat::Json => layer.json().flatten_event(true).boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    }
}
