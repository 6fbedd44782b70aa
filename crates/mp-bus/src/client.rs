//! Control-client end of the bus.

use std::io;
use std::time::{Duration, Instant};

use mp_config::BusChannel;
use serde_json::Value;
use tracing::debug;

use crate::CLIENT_TARGET;
use crate::errors::ClientError;
use crate::protocol::{BusReply, BusRequest, MAX_REPLY_BYTES, read_frame, write_frame};
use crate::stream::ConnectionStream;

/// Bound on establishing a connection to the daemon.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Bound on waiting for the daemon's reply to one request.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// Short-lived sender of control requests to a running daemon.
///
/// Every request travels on its own connection. The connection opened by
/// [`BusClient::connect`] serves the first request; later requests open a
/// fresh connection each. Nothing is retried.
#[derive(Debug)]
pub struct BusClient {
    channel: BusChannel,
    connection: Option<ConnectionStream>,
    connect_timeout: Duration,
    reply_timeout: Duration,
}

impl BusClient {
    /// Connects to the daemon listening on `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NoSuchDaemon`] when nothing listens on the
    /// channel, or [`ClientError::Connect`] for other connection failures.
    pub fn connect(channel: &BusChannel) -> Result<Self, ClientError> {
        Self::connect_with_timeouts(channel, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REPLY_TIMEOUT)
    }

    /// Connects with explicit connect and reply bounds.
    ///
    /// # Errors
    ///
    /// As for [`BusClient::connect`].
    pub fn connect_with_timeouts(
        channel: &BusChannel,
        connect_timeout: Duration,
        reply_timeout: Duration,
    ) -> Result<Self, ClientError> {
        let connection = open(channel, connect_timeout)?;
        debug!(target: CLIENT_TARGET, %channel, "connected to bus channel");
        Ok(Self {
            channel: channel.clone(),
            connection: Some(connection),
            connect_timeout,
            reply_timeout,
        })
    }

    /// Channel this client talks to.
    #[must_use]
    pub fn channel(&self) -> &BusChannel {
        &self.channel
    }

    /// Sends one request and waits for its reply.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Timeout`] when the complete reply has not arrived
    /// within the reply timeout, [`ClientError::Protocol`] for a malformed reply and
    /// [`ClientError::Remote`] when the daemon reports a failure. Connection
    /// failures surface as in [`BusClient::connect`].
    pub fn request(&mut self, hook: &str, params: Option<Value>) -> Result<Value, ClientError> {
        let mut stream = match self.connection.take() {
            Some(stream) => stream,
            None => open(&self.channel, self.connect_timeout)?,
        };
        stream
            .set_io_timeout(self.reply_timeout)
            .map_err(|source| ClientError::Send {
                hook: hook.to_owned(),
                source,
            })?;

        debug!(target: CLIENT_TARGET, hook, "sending bus request");
        write_frame(&mut stream, &BusRequest::new(hook, params)).map_err(|source| {
            ClientError::Send {
                hook: hook.to_owned(),
                source,
            }
        })?;

        let deadline = Instant::now() + self.reply_timeout;
        let frame = match read_frame(&mut stream.until(deadline), MAX_REPLY_BYTES) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                return Err(ClientError::Protocol {
                    hook: hook.to_owned(),
                    message: String::from("connection closed before a reply arrived"),
                });
            }
            Err(error) if is_timeout(&error) => {
                return Err(ClientError::Timeout {
                    hook: hook.to_owned(),
                    timeout: self.reply_timeout,
                });
            }
            Err(error) if error.kind() == io::ErrorKind::InvalidData => {
                return Err(ClientError::Protocol {
                    hook: hook.to_owned(),
                    message: error.to_string(),
                });
            }
            Err(source) => {
                return Err(ClientError::Read {
                    hook: hook.to_owned(),
                    source,
                });
            }
        };

        match BusReply::parse(&frame) {
            Ok(BusReply::Value { value }) => Ok(value),
            Ok(BusReply::Error { message }) => Err(ClientError::Remote {
                hook: hook.to_owned(),
                message,
            }),
            Err(message) => Err(ClientError::Protocol {
                hook: hook.to_owned(),
                message,
            }),
        }
    }

    /// Releases any open connection. Safe to call repeatedly.
    pub fn disconnect(&mut self) {
        if self.connection.take().is_some() {
            debug!(target: CLIENT_TARGET, channel = %self.channel, "disconnected from bus channel");
        }
    }
}

fn open(channel: &BusChannel, timeout: Duration) -> Result<ConnectionStream, ClientError> {
    ConnectionStream::connect(channel.endpoint(), timeout).map_err(|source| {
        if daemon_absent(&source) {
            ClientError::NoSuchDaemon {
                channel: channel.name().to_owned(),
                endpoint: channel.endpoint().to_string(),
            }
        } else {
            ClientError::Connect {
                channel: channel.name().to_owned(),
                endpoint: channel.endpoint().to_string(),
                source,
            }
        }
    })
}

fn daemon_absent(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound | io::ErrorKind::AddrNotAvailable
    )
}

fn is_timeout(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
