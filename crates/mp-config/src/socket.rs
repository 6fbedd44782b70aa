use std::fmt;
use std::fs::DirBuilder;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use url::Url;

/// Local address of a bus channel.
///
/// Configuration files may spell the endpoint either as a table
/// (`{ transport = "unix", path = "/run/mp/mp_bus.sock" }`) or as a URL string
/// (`"unix:///run/mp/mp_bus.sock"`, `"tcp://127.0.0.1:9779"`). The URL form is
/// also what environment variables and command-line flags carry.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum SocketEndpoint {
    /// Socket file on the local filesystem.
    Unix {
        /// Filesystem path of the socket.
        path: Utf8PathBuf,
    },
    /// TCP socket endpoint.
    Tcp {
        /// Host name or address.
        host: String,
        /// Port number.
        port: u16,
    },
}

impl SocketEndpoint {
    /// Endpoint for a socket file at `path`.
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }

    /// Loopback or LAN endpoint at `host:port`.
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Socket file path, for Unix endpoints only.
    #[must_use]
    pub fn unix_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Unix { path } => Some(path.as_ref()),
            Self::Tcp { .. } => None,
        }
    }

    /// Creates the directory that will hold a Unix socket file, owner-only.
    ///
    /// # Errors
    ///
    /// Fails for bare file names and for directories that cannot be created.
    pub fn prepare_filesystem(&self) -> Result<(), SocketPreparationError> {
        let Some(path) = self.unix_path() else {
            return Ok(());
        };
        let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) else {
            return Err(SocketPreparationError::MissingParent {
                path: path.to_path_buf(),
            });
        };

        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }

        if let Err(source) = builder.create(parent.as_std_path())
            && source.kind() != std::io::ErrorKind::AlreadyExists
        {
            return Err(SocketPreparationError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            });
        }

        Ok(())
    }
}

impl fmt::Display for SocketEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix { path } => write!(f, "unix://{path}"),
            Self::Tcp { host, port } => write!(f, "tcp://{host}:{port}"),
        }
    }
}

impl FromStr for SocketEndpoint {
    type Err = SocketParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(input)?;
        match url.scheme() {
            "unix" => {
                let path = url.path();
                if path.is_empty() || path == "/" {
                    return Err(SocketParseError::MissingUnixPath(input.to_owned()));
                }
                Ok(Self::unix(path))
            }
            "tcp" => {
                let host = url
                    .host_str()
                    .ok_or_else(|| SocketParseError::MissingHost(input.to_owned()))?;
                let port = url
                    .port()
                    .ok_or_else(|| SocketParseError::MissingPort(input.to_owned()))?;
                Ok(Self::tcp(host, port))
            }
            other => Err(SocketParseError::UnsupportedScheme(other.to_owned())),
        }
    }
}

/// Accepted on-disk spellings of an endpoint.
#[derive(Deserialize)]
#[serde(untagged)]
enum EndpointRepr {
    Url(String),
    Table(EndpointTable),
}

#[derive(Deserialize)]
#[serde(tag = "transport", rename_all = "snake_case")]
enum EndpointTable {
    Unix { path: Utf8PathBuf },
    Tcp { host: String, port: u16 },
}

impl TryFrom<EndpointRepr> for SocketEndpoint {
    type Error = SocketParseError;

    fn try_from(repr: EndpointRepr) -> Result<Self, Self::Error> {
        match repr {
            EndpointRepr::Url(text) => text.parse(),
            EndpointRepr::Table(EndpointTable::Unix { path }) => Ok(Self::Unix { path }),
            EndpointRepr::Table(EndpointTable::Tcp { host, port }) => Ok(Self::Tcp { host, port }),
        }
    }
}

impl<'de> Deserialize<'de> for SocketEndpoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let repr = EndpointRepr::deserialize(deserializer)?;
        Self::try_from(repr).map_err(serde::de::Error::custom)
    }
}

/// Reasons an endpoint URL is rejected.
#[derive(Debug, Error)]
pub enum SocketParseError {
    /// Only `unix` and `tcp` are understood.
    #[error("bus endpoint scheme '{0}' is neither unix nor tcp")]
    UnsupportedScheme(String),
    /// A `tcp` URL without a host.
    #[error("bus endpoint '{0}' names no host")]
    MissingHost(String),
    /// A `tcp` URL without a port.
    #[error("bus endpoint '{0}' names no port")]
    MissingPort(String),
    /// A `unix` URL without a file path.
    #[error("bus endpoint '{0}' names no socket file")]
    MissingUnixPath(String),
    /// Not a URL at all.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// Failures creating the directory of a Unix socket file.
#[derive(Debug, Error)]
pub enum SocketPreparationError {
    /// The path is a bare file name.
    #[error("bus socket '{path}' must live in a directory")]
    MissingParent {
        /// Offending socket path.
        path: Utf8PathBuf,
    },
    /// The directory could not be created.
    #[error("cannot create bus socket directory '{path}': {source}")]
    CreateDirectory {
        /// Directory being created.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn unix_endpoints_render_as_urls() {
        let endpoint = SocketEndpoint::unix(Utf8PathBuf::from("/tmp/mp/mp_bus.sock"));
        assert_eq!(endpoint.to_string(), "unix:///tmp/mp/mp_bus.sock");
    }

    #[test]
    fn parse_tcp_socket() {
        let endpoint: SocketEndpoint = "tcp://127.0.0.1:9000".parse().expect("parse tcp");
        assert_eq!(endpoint, SocketEndpoint::tcp("127.0.0.1", 9000));
    }

    #[rstest]
    #[case::bad_scheme("http://localhost:80")]
    #[case::missing_port("tcp://localhost")]
    #[case::missing_path("unix://")]
    fn rejects_unusable_endpoints(#[case] input: &str) {
        assert!(input.parse::<SocketEndpoint>().is_err(), "{input} should fail");
    }

    #[test]
    fn deserialises_url_strings() {
        #[derive(Deserialize)]
        struct Wrapper {
            socket: SocketEndpoint,
        }

        let wrapper: Wrapper =
            serde_json::from_str(r#"{"socket":"unix:///run/mp/mp_bus.sock"}"#).expect("parse");
        assert_eq!(wrapper.socket, SocketEndpoint::unix("/run/mp/mp_bus.sock"));
    }

    #[test]
    fn deserialises_tables() {
        let endpoint: SocketEndpoint =
            serde_json::from_str(r#"{"transport":"tcp","host":"127.0.0.1","port":9779}"#)
                .expect("parse");
        assert_eq!(endpoint, SocketEndpoint::tcp("127.0.0.1", 9779));
    }

    #[test]
    fn prepare_filesystem_creates_parent_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("mp_bus.sock");
        let endpoint = SocketEndpoint::unix(path.to_str().expect("utf8 path"));
        endpoint.prepare_filesystem().expect("prepare filesystem");
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn prepare_filesystem_rejects_bare_file_names() {
        let endpoint = SocketEndpoint::unix("mp_bus.sock");
        let error = endpoint
            .prepare_filesystem()
            .expect_err("bare name has no parent");
        assert!(matches!(error, SocketPreparationError::MissingParent { .. }));
    }
}
