//! Configuration loader pointing the bus at a private temporary directory.

use std::sync::Arc;

use mp_config::{BusChannel, Config, LogFormat, SocketEndpoint};
use ortho_config::OrthoError;
use tempfile::TempDir;

use crate::config::ConfigLoader;

/// Loader whose bus channel lives under its own temporary directory.
///
/// Clones share the directory, so two supervisors built from clones contend
/// for the same channel.
#[derive(Debug, Clone)]
pub(crate) struct TestConfigLoader {
    dir: Arc<TempDir>,
}

impl TestConfigLoader {
    pub(crate) fn new() -> Self {
        Self {
            dir: Arc::new(TempDir::new().expect("create socket directory")),
        }
    }

    pub(crate) fn config(&self) -> Config {
        let path = self.dir.path().join("mp").join("test_bus.sock");
        Config {
            bus_socket: SocketEndpoint::unix(path.to_str().expect("utf8 socket path")),
            log_filter: "warn".to_owned(),
            log_format: LogFormat::Compact,
        }
    }

    pub(crate) fn channel(&self) -> BusChannel {
        self.config().bus_channel()
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config())
    }
}
