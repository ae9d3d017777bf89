//! Bounded execution of a single unit of work.
//!
//! Unlike the poll engine this does not retry: the work is spawned once and
//! awaited up to a deadline.
//!
//! # Limitations
//!
//! - The deadline does not abort the work. When it passes, the spawned task
//!   is detached and keeps running until it finishes on its own or the
//!   runtime shuts down. Callers that need the work stopped must use
//!   [`BoundedTask::abort_handle`] themselves.
//! - A non-positive deadline disables the bound entirely: the work runs to
//!   completion however long it takes. A zero deadline coming from a
//!   misconfiguration therefore silently removes timeout protection.

use std::future::Future;
use std::time::Duration;

use tokio::task::{AbortHandle, JoinError, JoinHandle};
use tokio::time::Instant;

use crate::error::{Result, WaitError};

/// Message carried by a bounded task timeout.
pub const TASK_TIMED_OUT: &str = "timed out waiting for execution to complete";

/// A unit of work spawned on the runtime, waiting to be bounded.
pub struct BoundedTask {
    handle: JoinHandle<anyhow::Result<()>>,
    started: Instant,
}

impl BoundedTask {
    /// Spawn `work` on the current runtime. The clock starts now.
    pub fn spawn<F>(work: F) -> Self
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            started: Instant::now(),
            handle: tokio::spawn(work),
        }
    }

    /// Handle for cancelling the work from outside. A cancelled task is
    /// not a failure: [`wait`](Self::wait) returns the elapsed time.
    pub fn abort_handle(&self) -> AbortHandle {
        self.handle.abort_handle()
    }

    /// Wait for the work, at most `max_wait_secs` seconds when positive.
    pub async fn wait(self, max_wait_secs: i64) -> Result<Duration> {
        let Self { handle, started } = self;

        if max_wait_secs <= 0 {
            settle(handle.await)?;
            return Ok(started.elapsed());
        }

        let limit = Duration::from_secs(max_wait_secs as u64);
        match tokio::time::timeout(limit, handle).await {
            Ok(joined) => {
                settle(joined)?;
                Ok(started.elapsed())
            }
            Err(_) => {
                let elapsed = started.elapsed();
                tracing::warn!("{} after {} ms", TASK_TIMED_OUT, elapsed.as_millis());
                Err(WaitError::Timeout {
                    message: TASK_TIMED_OUT.to_string(),
                    elapsed,
                })
            }
        }
    }
}

fn settle(joined: std::result::Result<anyhow::Result<()>, JoinError>) -> Result<()> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(WaitError::Task(e)),
        Err(e) if e.is_cancelled() => {
            tracing::debug!("Bounded task was cancelled, treating as finished");
            Ok(())
        }
        Err(e) => Err(WaitError::TaskPanicked(panic_message(e))),
    }
}

fn panic_message(e: JoinError) -> String {
    let payload = e.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run `work` and return how long it took, failing with a timeout if it
/// does not finish within `max_wait_secs` (when positive).
pub async fn run_bounded<F>(max_wait_secs: i64, work: F) -> Result<Duration>
where
    F: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    BoundedTask::spawn(work).wait(max_wait_secs).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_work_within_deadline_returns_elapsed() {
        let elapsed = run_bounded(2, async {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(elapsed, Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expiry_is_timeout_and_work_keeps_running() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);

        let err = run_bounded(1, async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            flag.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await
        .unwrap_err();

        match err {
            WaitError::Timeout { ref message, elapsed } => {
                assert_eq!(message, TASK_TIMED_OUT);
                assert!(elapsed >= Duration::from_secs(1), "{elapsed:?}");
                assert!(elapsed < Duration::from_millis(1500), "{elapsed:?}");
            }
            other => panic!("expected timeout, got {other:?}"),
        }

        // Detached, not aborted.
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_positive_deadline_runs_unbounded() {
        let elapsed = run_bounded(0, async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(elapsed, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_work_error_propagates() {
        let err = run_bounded(5, async { Err(anyhow::anyhow!("boom")) })
            .await
            .unwrap_err();

        assert!(matches!(err, WaitError::Task(ref e) if e.to_string() == "boom"));
    }

    #[tokio::test]
    async fn test_panic_is_reported() {
        let explode = true;
        let err = run_bounded(5, async move {
            if explode {
                panic!("exploded");
            }
            Ok(())
        })
        .await
        .unwrap_err();

        assert!(matches!(err, WaitError::TaskPanicked(ref m) if m == "exploded"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_is_benign() {
        let task = BoundedTask::spawn(async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(())
        });
        task.abort_handle().abort();

        let result = task.wait(5).await;

        assert!(result.is_ok(), "cancelled work is not a failure: {result:?}");
    }
}
