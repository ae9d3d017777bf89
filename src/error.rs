//! Error types for waiting, probing, configuration and container access.

use std::time::Duration;

use thiserror::Error;

/// Result type for wait operations.
pub type Result<T> = std::result::Result<T, WaitError>;

/// Errors raised by a probe, either at construction or while evaluating.
///
/// Transport failures never show up here: a refused or timed out connection
/// is reported as "not ready" by the probe itself.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The status spec is neither `NNN` nor `NNN..MMM`.
    #[error("Invalid status spec '{spec}': {reason}")]
    InvalidStatusSpec {
        /// The spec as given.
        spec: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The HTTP method is not a valid token.
    #[error("Invalid HTTP method '{method}'")]
    InvalidMethod {
        /// The method as given.
        method: String,
    },

    /// The URL could not be parsed.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The URL as given.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// The target answered 501, so the configured method will never work.
    #[error("Invalid or not supported HTTP method '{method}' for checking {url}")]
    UnsupportedMethod {
        /// Upper-cased method that was sent.
        method: String,
        /// Target URL.
        url: String,
    },

    /// The watched container exited before any probe succeeded.
    #[error("Container '{id}' stopped while waiting")]
    ContainerStopped {
        /// Container ID or name.
        id: String,
    },

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Errors returned by the poll engine and the bounded task runner.
#[derive(Debug, Error)]
pub enum WaitError {
    /// `wait_for` was called without any probe.
    #[error("No probes given to wait for")]
    NoProbes,

    /// The deadline passed before a probe succeeded (or before the task finished).
    #[error("{message} (waited {elapsed:?})")]
    Timeout {
        /// Fixed message describing what timed out.
        message: String,
        /// Wall-clock time spent at the moment of failure.
        elapsed: Duration,
    },

    /// A probe failed in a way that must not be retried.
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// The bounded unit of work returned an error.
    #[error("Task failed: {0}")]
    Task(anyhow::Error),

    /// The bounded unit of work panicked.
    #[error("Task panicked: {0}")]
    TaskPanicked(String),
}

impl WaitError {
    /// Returns true if this is a deadline expiry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }

    /// Milliseconds waited before the timeout, if this is a timeout.
    pub fn elapsed_millis(&self) -> Option<u64> {
        match self {
            WaitError::Timeout { elapsed, .. } => Some(elapsed.as_millis() as u64),
            _ => None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable holds a value that cannot be used.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue {
        /// Environment variable name.
        key: String,
        /// What is wrong with the value.
        message: String,
    },
}

/// Errors from the container collaborator.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Docker could not be reached.
    #[error("Docker not available at {url}: {reason}")]
    DockerNotAvailable {
        /// Daemon URL that was tried.
        url: String,
        /// Client or ping error.
        reason: String,
    },

    /// The daemon refused to start the container.
    #[error("Failed to start container '{id}': {reason}")]
    StartFailed {
        /// Container ID or name.
        id: String,
        /// Daemon error.
        reason: String,
    },

    /// The container could not be stopped.
    #[error("Failed to stop container '{id}': {reason}")]
    StopFailed {
        /// Container ID or name.
        id: String,
        /// Daemon error.
        reason: String,
    },

    /// The container could not be removed.
    #[error("Failed to remove container '{id}': {reason}")]
    RemoveFailed {
        /// Container ID or name.
        id: String,
        /// Daemon error.
        reason: String,
    },

    /// The container state could not be read.
    #[error("Failed to inspect container '{id}': {reason}")]
    InspectFailed {
        /// Container ID or name.
        id: String,
        /// Daemon error.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_exposes_elapsed() {
        let err = WaitError::Timeout {
            message: "No checker finished successfully".to_string(),
            elapsed: Duration::from_millis(2040),
        };
        assert!(err.is_timeout());
        assert_eq!(err.elapsed_millis(), Some(2040));
        assert!(err.to_string().starts_with("No checker finished successfully"));
    }

    #[test]
    fn test_unsupported_method_names_method_and_url() {
        let err = WaitError::from(ProbeError::UnsupportedMethod {
            method: "GET".to_string(),
            url: "http://x/health".to_string(),
        });
        assert!(!err.is_timeout());
        assert_eq!(err.elapsed_millis(), None);
        let msg = err.to_string();
        assert!(msg.contains("'GET'"));
        assert!(msg.contains("http://x/health"));
    }
}
