//! Shared configuration for the `mp` daemon and its control client.
//!
//! Both halves of the control plane must agree on where the bus channel lives
//! and how logging is set up, so the configuration is resolved through a
//! single [`Config`] type. Values are layered by `ortho_config`: built-in
//! defaults, then a configuration file (`--config-path`, fed from the
//! `--additional-settings` flag), then `MP_*` environment variables, then
//! command-line flags.

mod channel;
mod defaults;
mod logging;
mod socket;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use channel::BusChannel;
pub use defaults::{
    DEFAULT_BUS_CHANNEL, DEFAULT_LOG_FILTER, DEFAULT_TCP_PORT, channel_endpoint,
    default_bus_socket, default_log_filter, default_log_filter_string, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved configuration shared by the daemon and the control client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "MP")]
pub struct Config {
    /// Endpoint of the control bus channel.
    #[serde(default = "default_bus_socket")]
    #[ortho_config(default = default_bus_socket())]
    pub bus_socket: SocketEndpoint,
    /// `tracing` filter expression applied to daemon telemetry.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for daemon telemetry.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bus_socket: default_bus_socket(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Endpoint of the control bus channel.
    #[must_use]
    pub fn bus_socket(&self) -> &SocketEndpoint {
        &self.bus_socket
    }

    /// The named bus channel the daemon binds and clients connect to.
    #[must_use]
    pub fn bus_channel(&self) -> BusChannel {
        BusChannel::new(DEFAULT_BUS_CHANNEL, self.bus_socket.clone())
    }

    /// Telemetry filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Telemetry output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
