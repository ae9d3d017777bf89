//! Wait-until-ready engine.
//!
//! A freshly started container is rarely usable the moment it is started.
//! This module polls one or more [`Probe`]s until one reports readiness or
//! a deadline passes.
//!
//! # Flow
//!
//! ```text
//!   wait_for(max_wait, probes)
//!         │
//!         ▼
//!   ┌──────────────────┐  ready   ┌──────────────────────┐
//!   │ evaluate probes  │─────────▶│ Ok(elapsed)          │
//!   │ in input order   │          └──────────────────────┘
//!   └──────────────────┘
//!         │ none ready
//!         ▼
//!   ┌──────────────────┐ deadline ┌──────────────────────┐
//!   │ sleep interval   │─────────▶│ Err(Timeout{elapsed})│
//!   └──────────────────┘          └──────────────────────┘
//!         │ time left
//!         └──────▶ back to evaluate
//! ```
//!
//! Every probe is released exactly once, in input order, on every exit
//! path: success, timeout, a fatal probe error, or the wait future being
//! dropped.
//!
//! # Example
//!
//! ```rust,no_run
//! use dockwait::wait::{HttpProbe, Probe, TcpProbe, wait_for};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let probes: Vec<Box<dyn Probe>> = vec![
//!     Box::new(HttpProbe::new("http://localhost:8080/health", Some("GET"), Some("200..204"))?),
//!     Box::new(TcpProbe::new("localhost", &[5432])),
//! ];
//!
//! let elapsed = wait_for(30, probes).await?;
//! println!("ready after {} ms", elapsed.as_millis());
//! # Ok(())
//! # }
//! ```

pub mod http;
pub mod runner;
pub mod tcp;

pub use http::{HttpProbe, StatusRange};
pub use runner::{BoundedTask, run_bounded};
pub use tcp::{TcpProbe, TcpTarget};

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::config::WaitConfig;
use crate::error::{ProbeError, Result, WaitError};

/// Ceiling applied when a wait is given a non-positive deadline.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_millis(10_000);

/// Sleep between two polling rounds.
pub const RETRY_INTERVAL: Duration = Duration::from_millis(500);

/// Upper bound for a single probe attempt (connect, read, acquire).
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(500);

/// Message carried by a poll engine timeout.
pub const NO_PROBE_SUCCEEDED: &str = "No checker finished successfully";

/// A readiness check.
///
/// `evaluate` makes one attempt bounded by [`PROBE_TIMEOUT`]. Transport
/// failures mean "not ready yet" and come back as `Ok(false)`; an `Err` is
/// fatal and stops the whole wait.
#[async_trait]
pub trait Probe: Send {
    /// Short label used in logs.
    fn name(&self) -> String;

    /// Make one readiness attempt.
    async fn evaluate(&mut self) -> std::result::Result<bool, ProbeError>;

    /// Release held resources. Failures are logged by the caller, never escalated.
    fn release(&mut self) -> std::result::Result<(), ProbeError> {
        Ok(())
    }
}

/// Owns the probe set of one wait and releases it when dropped.
struct ReleaseGuard {
    probes: Vec<Box<dyn Probe>>,
}

impl ReleaseGuard {
    fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Probe>> {
        self.probes.iter_mut()
    }
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        for probe in &mut self.probes {
            if let Err(e) = probe.release() {
                tracing::warn!("Failed to release probe {}: {}", probe.name(), e);
            }
        }
    }
}

/// Poll engine with configurable ceiling and retry interval.
#[derive(Debug, Clone, Default)]
pub struct Waiter {
    config: WaitConfig,
}

impl Waiter {
    /// Create a waiter from configuration.
    pub fn new(config: WaitConfig) -> Self {
        Self { config }
    }

    /// Deadline for a wait of `max_wait_secs`. Zero or negative uses the default ceiling.
    pub fn effective_max_wait(&self, max_wait_secs: i64) -> Duration {
        if max_wait_secs > 0 {
            Duration::from_secs(max_wait_secs as u64)
        } else {
            self.config.default_max_wait
        }
    }

    /// Poll `probes` until one is ready or the deadline passes.
    ///
    /// Returns the elapsed time on success. The first ready probe in input
    /// order wins; later probes in that round are not evaluated.
    pub async fn wait_for(
        &self,
        max_wait_secs: i64,
        probes: Vec<Box<dyn Probe>>,
    ) -> Result<Duration> {
        if probes.is_empty() {
            return Err(WaitError::NoProbes);
        }

        let max_wait = self.effective_max_wait(max_wait_secs);
        let start = Instant::now();
        let mut probes = ReleaseGuard { probes };

        tracing::debug!(
            "Waiting up to {:?} for {} probe(s)",
            max_wait,
            probes.probes.len()
        );

        loop {
            for probe in probes.iter_mut() {
                if probe.evaluate().await? {
                    let elapsed = start.elapsed();
                    tracing::info!("{} ready after {} ms", probe.name(), elapsed.as_millis());
                    return Ok(elapsed);
                }
            }

            tokio::time::sleep(self.config.retry_interval).await;

            if start.elapsed() >= max_wait {
                break;
            }
        }

        let elapsed = start.elapsed();
        tracing::warn!("{} after {} ms", NO_PROBE_SUCCEEDED, elapsed.as_millis());
        Err(WaitError::Timeout {
            message: NO_PROBE_SUCCEEDED.to_string(),
            elapsed,
        })
    }
}

/// Poll `probes` with the default configuration. See [`Waiter::wait_for`].
pub async fn wait_for(max_wait_secs: i64, probes: Vec<Box<dyn Probe>>) -> Result<Duration> {
    Waiter::default().wait_for(max_wait_secs, probes).await
}
