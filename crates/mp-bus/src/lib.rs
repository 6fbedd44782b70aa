//! Local request/reply bus between the `mp` daemon and its control client.
//!
//! The daemon binds a [`BusServer`] on a named channel and answers each
//! connection with exactly one reply: the connection carries one JSON request
//! line naming a hook, the server runs that hook through a
//! [`mp_hooks::HookDispatcher`], writes one JSON reply line and closes the
//! connection. A [`BusClient`] is the other end of that exchange.
//!
//! ```text
//! -> {"hook":"Status.getOSPid","params":null}
//! <- {"kind":"value","value":4242}
//! ```

mod client;
mod errors;
mod protocol;
mod server;
mod stream;

pub use client::{BusClient, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REPLY_TIMEOUT};
pub use errors::{BusError, ClientError};
pub use protocol::{BusReply, BusRequest, MAX_REQUEST_BYTES};
pub use server::{BusServer, BusStopHandle};

const SERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::server");
const CLIENT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::client");

#[cfg(all(test, unix))]
mod tests;
