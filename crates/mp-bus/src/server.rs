//! Daemon end of the bus.

use std::io;
use std::net::TcpListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use mp_config::{BusChannel, SocketEndpoint};
use mp_hooks::{HookDispatcher, HookName};
use tracing::{debug, info, warn};

use crate::SERVER_TARGET;
use crate::errors::BusError;
use crate::protocol::{BusReply, BusRequest, MAX_REQUEST_BYTES, read_frame, write_frame};
use crate::stream::{ConnectionStream, resolve_tcp_address};

#[cfg(unix)]
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::FileTypeExt;
#[cfg(unix)]
use std::os::unix::net::{UnixListener, UnixStream};
#[cfg(unix)]
use std::path::Path;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);
const ERROR_BACKOFF: Duration = Duration::from_millis(150);
const CONNECTION_IO_TIMEOUT: Duration = Duration::from_secs(5);

/// A bound bus channel that answers requests through a [`HookDispatcher`].
///
/// Connections are served one at a time on the thread that calls
/// [`BusServer::run`]. Dropping the server releases the channel and removes a
/// Unix socket file it created.
#[derive(Debug)]
pub struct BusServer {
    channel: BusChannel,
    listener: ListenerKind,
    stop: BusStopHandle,
}

#[derive(Debug)]
enum ListenerKind {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixListener),
}

/// Requests that a [`BusServer`] leave its accept loop.
///
/// Handles are cheap to clone. Stopping is idempotent, and stopping a server
/// that is not running only makes a later [`BusServer::run`] return at once.
#[derive(Debug, Clone, Default)]
pub struct BusStopHandle {
    requested: Arc<AtomicBool>,
}

impl BusStopHandle {
    /// Asks the accept loop to return after the connection in progress.
    pub fn stop(&self) {
        if !self.requested.swap(true, Ordering::SeqCst) {
            debug!(target: SERVER_TARGET, "bus stop requested");
        }
    }

    /// Reports whether a stop has been requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

impl BusServer {
    /// Binds `channel`.
    ///
    /// A Unix socket file left behind by a dead server is removed and
    /// rebound.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::ChannelInUse`] when a live server already owns the
    /// channel, or another [`BusError`] when the endpoint cannot be bound.
    pub fn bind(channel: &BusChannel) -> Result<Self, BusError> {
        channel
            .endpoint()
            .prepare_filesystem()
            .map_err(|source| BusError::Prepare {
                channel: channel.name().to_owned(),
                source,
            })?;

        let listener = match channel.endpoint() {
            SocketEndpoint::Tcp { host, port } => {
                ListenerKind::Tcp(bind_tcp(channel, host, *port)?)
            }
            SocketEndpoint::Unix { path } => {
                #[cfg(unix)]
                {
                    ListenerKind::Unix(bind_unix(channel, path.as_std_path())?)
                }

                #[cfg(not(unix))]
                {
                    return Err(BusError::UnsupportedUnix {
                        endpoint: path.to_string(),
                    });
                }
            }
        };

        // From here on `Drop` owns cleanup of the socket file.
        let server = Self {
            channel: channel.clone(),
            listener,
            stop: BusStopHandle::default(),
        };
        server
            .set_nonblocking()
            .map_err(|source| BusError::NonBlocking { source })?;

        info!(target: SERVER_TARGET, channel = %server.channel, "bus channel bound");
        Ok(server)
    }

    /// Channel this server is bound to.
    #[must_use]
    pub fn channel(&self) -> &BusChannel {
        &self.channel
    }

    /// Endpoint actually bound, with the real port for TCP port 0 binds.
    #[must_use]
    pub fn local_endpoint(&self) -> SocketEndpoint {
        match (&self.listener, self.channel.endpoint()) {
            (ListenerKind::Tcp(listener), SocketEndpoint::Tcp { host, port }) => {
                let port = listener.local_addr().map_or(*port, |addr| addr.port());
                SocketEndpoint::tcp(host.clone(), port)
            }
            (_, endpoint) => endpoint.clone(),
        }
    }

    /// Handle that makes [`BusServer::run`] return.
    #[must_use]
    pub fn stop_handle(&self) -> BusStopHandle {
        self.stop.clone()
    }

    /// Serves connections until a stop is requested, then releases the
    /// channel.
    ///
    /// Each connection gets exactly one reply. The reply to the request that
    /// triggered the stop is written before the loop notices the stop.
    pub fn run(self, dispatcher: &HookDispatcher) {
        info!(target: SERVER_TARGET, channel = %self.channel, "bus accept loop running");
        let mut last_error = None::<io::ErrorKind>;
        while !self.stop.is_stopped() {
            match self.accept() {
                Ok(Some(stream)) => {
                    last_error = None;
                    serve_connection(stream, dispatcher);
                }
                Ok(None) => thread::sleep(ACCEPT_BACKOFF),
                Err(error) => {
                    let kind = error.kind();
                    if last_error != Some(kind) {
                        warn!(target: SERVER_TARGET, %error, "bus accept error");
                    }
                    last_error = Some(kind);
                    thread::sleep(ERROR_BACKOFF);
                }
            }
        }
        info!(target: SERVER_TARGET, channel = %self.channel, "stopped listening");
    }

    fn set_nonblocking(&self) -> io::Result<()> {
        match &self.listener {
            ListenerKind::Tcp(listener) => listener.set_nonblocking(true),
            #[cfg(unix)]
            ListenerKind::Unix(listener) => listener.set_nonblocking(true),
        }
    }

    fn accept(&self) -> io::Result<Option<ConnectionStream>> {
        let accepted = match &self.listener {
            ListenerKind::Tcp(listener) => listener.accept().and_then(|(stream, _)| {
                stream.set_nonblocking(false)?;
                Ok(ConnectionStream::Tcp(stream))
            }),
            #[cfg(unix)]
            ListenerKind::Unix(listener) => listener.accept().and_then(|(stream, _)| {
                stream.set_nonblocking(false)?;
                Ok(ConnectionStream::Unix(stream))
            }),
        };
        match accepted {
            Ok(stream) => Ok(Some(stream)),
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(error) => Err(error),
        }
    }
}

impl Drop for BusServer {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let ListenerKind::Unix(_) = self.listener
            && let Some(path) = self.channel.endpoint().unix_path()
            && let Err(error) = fs::remove_file(path.as_std_path())
            && error.kind() != io::ErrorKind::NotFound
        {
            warn!(
                target: SERVER_TARGET,
                %error,
                path = %path,
                "failed to remove bus socket file"
            );
        }
        debug!(target: SERVER_TARGET, channel = %self.channel, "bus channel released");
    }
}

fn serve_connection(mut stream: ConnectionStream, dispatcher: &HookDispatcher) {
    if let Err(error) = stream.set_io_timeout(CONNECTION_IO_TIMEOUT) {
        warn!(target: SERVER_TARGET, %error, "failed to set bus connection timeout");
        return;
    }

    let deadline = Instant::now() + CONNECTION_IO_TIMEOUT;
    let frame = match read_frame(&mut stream.until(deadline), MAX_REQUEST_BYTES) {
        Ok(Some(frame)) => frame,
        Ok(None) => return,
        Err(error) => {
            warn!(target: SERVER_TARGET, %error, "failed to read bus request");
            return;
        }
    };

    let reply = answer(&frame, dispatcher);
    if let Err(error) = write_frame(&mut stream, &reply) {
        warn!(target: SERVER_TARGET, %error, "failed to write bus reply");
    }
}

fn answer(frame: &[u8], dispatcher: &HookDispatcher) -> BusReply {
    let request = match BusRequest::parse(frame) {
        Ok(request) => request,
        Err(message) => {
            warn!(target: SERVER_TARGET, %message, "rejected bus request");
            return BusReply::error(message);
        }
    };
    let hook = match request.hook.parse::<HookName>() {
        Ok(hook) => hook,
        Err(error) => return BusReply::error(error.to_string()),
    };

    debug!(target: SERVER_TARGET, %hook, "serving bus request");
    match dispatcher.call(hook.as_str(), request.params.as_ref()) {
        Ok(value) => BusReply::value(value),
        Err(error) => {
            warn!(target: SERVER_TARGET, %hook, %error, "bus request failed");
            BusReply::error(error.to_string())
        }
    }
}

fn bind_tcp(channel: &BusChannel, host: &str, port: u16) -> Result<TcpListener, BusError> {
    let addr = resolve_tcp_address(host, port).map_err(|source| BusError::Resolve {
        host: host.to_owned(),
        port,
        source,
    })?;
    TcpListener::bind(addr).map_err(|source| {
        if source.kind() == io::ErrorKind::AddrInUse {
            channel_in_use(channel)
        } else {
            BusError::BindTcp { addr, source }
        }
    })
}

#[cfg(unix)]
fn bind_unix(channel: &BusChannel, path: &Path) -> Result<UnixListener, BusError> {
    if path.exists() {
        let shown = path.display().to_string();
        let metadata = fs::symlink_metadata(path).map_err(|source| BusError::UnixProbe {
            path: shown.clone(),
            source,
        })?;
        if !metadata.file_type().is_socket() {
            return Err(BusError::UnixNotSocket { path: shown });
        }
        match UnixStream::connect(path) {
            Ok(_peer) => return Err(channel_in_use(channel)),
            Err(error)
                if matches!(
                    error.kind(),
                    io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound
                ) =>
            {
                info!(target: SERVER_TARGET, path = %shown, "removing stale bus socket");
                fs::remove_file(path).map_err(|source| BusError::UnixCleanup {
                    path: shown,
                    source,
                })?;
            }
            Err(source) => return Err(BusError::UnixProbe { path: shown, source }),
        }
    }

    UnixListener::bind(path).map_err(|source| {
        if source.kind() == io::ErrorKind::AddrInUse {
            channel_in_use(channel)
        } else {
            BusError::BindUnix {
                path: path.display().to_string(),
                source,
            }
        }
    })
}

fn channel_in_use(channel: &BusChannel) -> BusError {
    BusError::ChannelInUse {
        channel: channel.name().to_owned(),
        endpoint: channel.endpoint().to_string(),
    }
}
