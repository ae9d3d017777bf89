use std::time::Duration;

use crate::config::helpers::{optional_env, parse_bool_env, parse_optional_env};
use crate::error::ConfigError;

/// Default Docker daemon URL.
pub const DEFAULT_DOCKER_URL: &str = "http://localhost:2375";

/// Docker daemon access configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerConfig {
    /// Daemon URL, `http://` or `unix://`. A `tcp://` prefix is rewritten to `http://`.
    pub url: String,
    /// Skip all Docker work (waits still run).
    pub skip: bool,
    /// Leave started containers in place when a wait fails (for debugging).
    pub keep_on_failure: bool,
    /// Grace period given to a container on stop before it is killed.
    pub stop_grace: Duration,
    /// Timeout for requests against the daemon.
    pub request_timeout_secs: u64,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DOCKER_URL.to_string(),
            skip: false,
            keep_on_failure: false,
            stop_grace: Duration::from_secs(10),
            request_timeout_secs: 120,
        }
    }
}

impl DockerConfig {
    pub(crate) fn resolve() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let url = optional_env("DOCKER_URL")?
            .or(optional_env("DOCKER_HOST")?)
            .map(|u| normalize_docker_url(&u))
            .unwrap_or(defaults.url);

        Ok(Self {
            url,
            skip: parse_bool_env("DOCKWAIT_SKIP", defaults.skip)?,
            keep_on_failure: parse_bool_env("DOCKWAIT_KEEP_ON_FAILURE", defaults.keep_on_failure)?,
            stop_grace: Duration::from_secs(parse_optional_env(
                "DOCKWAIT_STOP_GRACE_SECS",
                defaults.stop_grace.as_secs(),
            )?),
            request_timeout_secs: parse_optional_env(
                "DOCKWAIT_DOCKER_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            )?,
        })
    }
}

/// Rewrite a `tcp://` daemon address to `http://`; other schemes pass through.
pub fn normalize_docker_url(url: &str) -> String {
    match url.strip_prefix("tcp://") {
        Some(rest) => format!("http://{rest}"),
        None => url.to_string(),
    }
}
