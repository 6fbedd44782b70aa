//! Transport-agnostic stream used on both ends of the bus.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use mp_config::SocketEndpoint;

#[cfg(unix)]
use std::os::fd::OwnedFd;
#[cfg(unix)]
use std::os::unix::net::UnixStream;

#[cfg(unix)]
use socket2::{Domain, SockAddr, Socket, Type};

/// A connected bus stream.
#[derive(Debug)]
pub(crate) enum ConnectionStream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl ConnectionStream {
    /// Opens a stream to `endpoint`, bounding the connect by `timeout`.
    pub(crate) fn connect(endpoint: &SocketEndpoint, timeout: Duration) -> io::Result<Self> {
        match endpoint {
            SocketEndpoint::Tcp { host, port } => {
                let address = resolve_tcp_address(host, *port)?;
                TcpStream::connect_timeout(&address, timeout).map(Self::Tcp)
            }
            SocketEndpoint::Unix { path } => {
                #[cfg(unix)]
                {
                    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
                    let address = SockAddr::unix(path.as_std_path())?;
                    socket.connect_timeout(&address, timeout)?;
                    Ok(Self::Unix(UnixStream::from(OwnedFd::from(socket))))
                }

                #[cfg(not(unix))]
                {
                    Err(io::Error::new(
                        io::ErrorKind::Unsupported,
                        format!("unix sockets are unsupported for {path}"),
                    ))
                }
            }
        }
    }

    /// Reader over this stream that fails with `TimedOut` once `deadline`
    /// passes, however the peer paces its bytes.
    pub(crate) fn until(&mut self, deadline: Instant) -> DeadlineReader<'_> {
        DeadlineReader {
            stream: self,
            deadline,
        }
    }

    fn set_read_timeout(&self, timeout: Duration) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.set_read_timeout(Some(timeout)),
            #[cfg(unix)]
            Self::Unix(stream) => stream.set_read_timeout(Some(timeout)),
        }
    }

    /// Applies the same timeout to reads and writes.
    pub(crate) fn set_io_timeout(&self, timeout: Duration) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => {
                stream.set_read_timeout(Some(timeout))?;
                stream.set_write_timeout(Some(timeout))
            }
            #[cfg(unix)]
            Self::Unix(stream) => {
                stream.set_read_timeout(Some(timeout))?;
                stream.set_write_timeout(Some(timeout))
            }
        }
    }
}

impl Read for ConnectionStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

/// See [`ConnectionStream::until`].
pub(crate) struct DeadlineReader<'a> {
    stream: &'a mut ConnectionStream,
    deadline: Instant,
}

impl Read for DeadlineReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "read deadline passed"));
        }
        self.stream.set_read_timeout(remaining)?;
        self.stream.read(buf)
    }
}

impl Write for ConnectionStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

/// First address `host` resolves to.
pub(crate) fn resolve_tcp_address(host: &str, port: u16) -> io::Result<SocketAddr> {
    (host, port).to_socket_addrs()?.next().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("{host}:{port} resolved to no addresses"),
        )
    })
}
