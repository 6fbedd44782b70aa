//! Configuration loading for both daemon and client modes.

use std::ffi::OsString;
use std::sync::Arc;

use mp_config::Config;
use ortho_config::{OrthoConfig, OrthoError};

/// Abstracts configuration loading so launches can be tested in isolation.
pub trait ConfigLoader: Send + Sync {
    /// Loads the layered configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader's error when a layer cannot be read or merged.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that layers defaults, the settings file, `MP_*` environment
/// variables and forwarded command-line flags.
#[derive(Debug, Clone)]
pub struct OrthoConfigLoader {
    arguments: Vec<OsString>,
}

impl OrthoConfigLoader {
    /// Builds a loader over already-filtered configuration arguments. The
    /// first argument is the program name.
    #[must_use]
    pub fn new(arguments: Vec<OsString>) -> Self {
        Self { arguments }
    }
}

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter(self.arguments.iter().cloned())
    }
}

/// Loader that always yields the same configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps a fixed configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}
