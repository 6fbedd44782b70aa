use std::fmt;

use crate::defaults::channel_endpoint;
use crate::socket::SocketEndpoint;

/// A named local address the control bus listens on.
///
/// The name identifies the channel to operators and in telemetry; the
/// endpoint is where the listener actually binds. At most one server may hold
/// a channel at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusChannel {
    name: String,
    endpoint: SocketEndpoint,
}

impl BusChannel {
    /// Pairs a channel name with an explicit endpoint.
    #[must_use]
    pub fn new(name: impl Into<String>, endpoint: SocketEndpoint) -> Self {
        Self {
            name: name.into(),
            endpoint,
        }
    }

    /// Resolves a channel name to its platform default endpoint.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let endpoint = channel_endpoint(&name);
        Self { name, endpoint }
    }

    /// Channel name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Endpoint the channel binds to.
    #[must_use]
    pub fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }
}

impl fmt::Display for BusChannel {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} ({})", self.name, self.endpoint)
    }
}
