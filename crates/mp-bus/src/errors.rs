//! Error types for both ends of the bus.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use mp_config::SocketPreparationError;
use thiserror::Error;

/// Errors raised while binding or running a [`crate::BusServer`].
#[derive(Debug, Error)]
pub enum BusError {
    /// Another live server already owns the channel.
    #[error("bus channel '{channel}' is already in use at {endpoint}")]
    ChannelInUse {
        /// Channel name.
        channel: String,
        /// Endpoint the live server is bound to.
        endpoint: String,
    },
    /// The socket's parent directory could not be created or secured.
    #[error("failed to prepare socket directory for '{channel}': {source}")]
    Prepare {
        /// Channel name.
        channel: String,
        /// Filesystem failure.
        #[source]
        source: SocketPreparationError,
    },
    /// The TCP host did not resolve to an address.
    #[error("failed to resolve TCP address {host}:{port}: {source}")]
    Resolve {
        /// Configured host.
        host: String,
        /// Configured port.
        port: u16,
        /// Resolver failure.
        #[source]
        source: io::Error,
    },
    /// The TCP listener could not be bound.
    #[error("failed to bind TCP listener at {addr}: {source}")]
    BindTcp {
        /// Resolved address.
        addr: SocketAddr,
        /// Bind failure.
        #[source]
        source: io::Error,
    },
    /// The listener refused non-blocking mode.
    #[error("failed to enable non-blocking accepts: {source}")]
    NonBlocking {
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// Unix endpoints cannot be served on this platform.
    #[cfg(not(unix))]
    #[error("unix sockets are unsupported for endpoint {endpoint}")]
    UnsupportedUnix {
        /// Rejected endpoint.
        endpoint: String,
    },
    /// The Unix listener could not be bound.
    #[cfg(unix)]
    #[error("failed to bind unix listener at {path}: {source}")]
    BindUnix {
        /// Socket path.
        path: String,
        /// Bind failure.
        #[source]
        source: io::Error,
    },
    /// Something other than a socket occupies the path.
    #[cfg(unix)]
    #[error("unix socket path {path} is not a socket")]
    UnixNotSocket {
        /// Occupied path.
        path: String,
    },
    /// An existing socket file could not be checked for a live owner.
    #[cfg(unix)]
    #[error("failed to inspect existing unix socket {path}: {source}")]
    UnixProbe {
        /// Socket path.
        path: String,
        /// Connect failure other than refusal.
        #[source]
        source: io::Error,
    },
    /// A stale socket file could not be removed.
    #[cfg(unix)]
    #[error("failed to remove stale unix socket {path}: {source}")]
    UnixCleanup {
        /// Socket path.
        path: String,
        /// Removal failure.
        #[source]
        source: io::Error,
    },
}

/// Errors surfaced to a [`crate::BusClient`] caller.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Nothing is listening on the channel: the daemon is not running.
    #[error("no daemon is listening on bus channel '{channel}' ({endpoint})")]
    NoSuchDaemon {
        /// Channel name.
        channel: String,
        /// Endpoint that refused the connection.
        endpoint: String,
    },
    /// Connecting failed for a reason other than an absent daemon.
    #[error("failed to connect to bus channel '{channel}' ({endpoint}): {source}")]
    Connect {
        /// Channel name.
        channel: String,
        /// Endpoint dialled.
        endpoint: String,
        /// Connect failure.
        #[source]
        source: io::Error,
    },
    /// The request line could not be written.
    #[error("failed to send '{hook}' request: {source}")]
    Send {
        /// Requested hook.
        hook: String,
        /// Write failure.
        #[source]
        source: io::Error,
    },
    /// The reply could not be read.
    #[error("failed to read reply to '{hook}': {source}")]
    Read {
        /// Requested hook.
        hook: String,
        /// Read failure.
        #[source]
        source: io::Error,
    },
    /// No complete reply arrived within the reply timeout.
    #[error("no reply to '{hook}' within {timeout:?}")]
    Timeout {
        /// Requested hook.
        hook: String,
        /// Reply timeout in effect.
        timeout: Duration,
    },
    /// The reply could not be decoded.
    #[error("protocol error in reply to '{hook}': {message}")]
    Protocol {
        /// Requested hook.
        hook: String,
        /// Decoding diagnostic.
        message: String,
    },
    /// The daemon answered with an error.
    #[error("daemon rejected '{hook}': {message}")]
    Remote {
        /// Requested hook.
        hook: String,
        /// Error text from the daemon.
        message: String,
    },
}

impl ClientError {
    /// Reports whether the failure means no daemon is running.
    #[must_use]
    pub fn is_no_such_daemon(&self) -> bool {
        matches!(self, Self::NoSuchDaemon { .. })
    }
}
