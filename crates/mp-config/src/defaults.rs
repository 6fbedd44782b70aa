#[cfg(unix)]
use camino::Utf8PathBuf;
#[cfg(unix)]
use std::env;

#[cfg(unix)]
use libc::geteuid;

#[cfg(unix)]
use dirs::runtime_dir;

use crate::logging::LogFormat;
use crate::socket::SocketEndpoint;

/// Name of the channel the daemon binds when nothing else is configured.
pub const DEFAULT_BUS_CHANNEL: &str = "mp_bus";

/// Base TCP port used for bus channels when Unix domain sockets are not available.
pub const DEFAULT_TCP_PORT: u16 = 9779;

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the binary.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value for serde defaults.
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the daemon.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Endpoint of the default `mp_bus` channel.
#[must_use]
pub fn default_bus_socket() -> SocketEndpoint {
    channel_endpoint(DEFAULT_BUS_CHANNEL)
}

/// Resolves the local endpoint for a named bus channel.
///
/// On Unix the channel maps to `<runtime dir>/mp/<name>.sock`, falling back to
/// a per-user directory under the system temporary directory when no runtime
/// directory is available. Other platforms use a loopback TCP port derived
/// from the channel name.
#[must_use]
pub fn channel_endpoint(name: &str) -> SocketEndpoint {
    channel_endpoint_inner(name)
}

#[cfg(unix)]
fn channel_endpoint_inner(name: &str) -> SocketEndpoint {
    let (mut base, apply_namespace) = match runtime_base_directory() {
        Some(dir) => (dir, false),
        None => (fallback_base_directory(), true),
    };

    base.push("mp");
    if apply_namespace {
        base.push(user_namespace());
    }

    SocketEndpoint::unix(base.join(format!("{name}.sock")))
}

#[cfg(unix)]
fn runtime_base_directory() -> Option<Utf8PathBuf> {
    runtime_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
}

#[cfg(unix)]
fn fallback_base_directory() -> Utf8PathBuf {
    let candidate = env::temp_dir();
    Utf8PathBuf::from_path_buf(candidate).unwrap_or_else(|_| Utf8PathBuf::from("/tmp"))
}

#[cfg(unix)]
fn user_namespace() -> String {
    // SAFETY: `geteuid` has no preconditions and cannot fail.
    let uid = unsafe { geteuid() };
    format!("uid-{uid}")
}

#[cfg(not(unix))]
fn channel_endpoint_inner(name: &str) -> SocketEndpoint {
    let offset = name.bytes().fold(0_u16, |acc, byte| {
        acc.wrapping_mul(31).wrapping_add(u16::from(byte)) % 1000
    });
    SocketEndpoint::tcp("127.0.0.1", DEFAULT_TCP_PORT + offset)
}
