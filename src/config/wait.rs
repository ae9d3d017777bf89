use std::time::Duration;

use crate::config::helpers::parse_optional_env;
use crate::error::ConfigError;
use crate::wait::{DEFAULT_MAX_WAIT, RETRY_INTERVAL};

/// Poll engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Ceiling used when a wait is called with a non-positive deadline.
    pub default_max_wait: Duration,
    /// Sleep between two polling rounds.
    pub retry_interval: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            default_max_wait: DEFAULT_MAX_WAIT,
            retry_interval: RETRY_INTERVAL,
        }
    }
}

impl WaitConfig {
    pub(crate) fn resolve() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let default_max_wait_ms = parse_optional_env(
            "DOCKWAIT_DEFAULT_MAX_WAIT_MS",
            defaults.default_max_wait.as_millis() as u64,
        )?;
        if default_max_wait_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DOCKWAIT_DEFAULT_MAX_WAIT_MS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        let retry_interval_ms = parse_optional_env(
            "DOCKWAIT_RETRY_INTERVAL_MS",
            defaults.retry_interval.as_millis() as u64,
        )?;
        if retry_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DOCKWAIT_RETRY_INTERVAL_MS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            default_max_wait: Duration::from_millis(default_max_wait_ms),
            retry_interval: Duration::from_millis(retry_interval_ms),
        })
    }
}
