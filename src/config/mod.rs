//! Environment-driven configuration.
//!
//! Values are read from the process environment after an optional `.env`
//! file has been loaded with `dotenvy`. Each section resolves itself and
//! falls back to its `Default`.

mod docker;
pub(crate) mod helpers;
mod wait;

pub use docker::{DEFAULT_DOCKER_URL, DockerConfig, normalize_docker_url};
pub use wait::WaitConfig;

use crate::error::ConfigError;

/// Full configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub wait: WaitConfig,
    pub docker: DockerConfig,
}

impl Config {
    /// Resolve every section from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            wait: WaitConfig::resolve()?,
            docker: DockerConfig::resolve()?,
        })
    }
}
