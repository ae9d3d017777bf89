//! Container access and shutdown bookkeeping.
//!
//! The wait engine does not talk to Docker itself. Anything that needs a
//! container (starting it before a wait, stopping it afterwards, checking it
//! is still alive while waiting) goes through [`ContainerAccess`], which is
//! injected by the caller. [`DockerAccess`] is the Docker implementation.

mod docker;
mod probe;
mod shutdown;

pub use docker::DockerAccess;
pub use probe::ContainerRunningProbe;
pub use shutdown::{ShutdownAction, ShutdownActions};

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ContainerError;

/// Result type for container operations.
pub type Result<T> = std::result::Result<T, ContainerError>;

/// Lifecycle operations on an existing container.
#[async_trait]
pub trait ContainerAccess: Send + Sync {
    /// Start a created container.
    async fn start(&self, id: &str) -> Result<()>;

    /// Stop a running container, killing it after `grace`.
    async fn stop(&self, id: &str, grace: Duration) -> Result<()>;

    /// Remove a container and its anonymous volumes.
    async fn remove(&self, id: &str) -> Result<()>;

    /// Whether the container is currently running.
    async fn is_running(&self, id: &str) -> Result<bool>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// In-memory container access recording every call.
    #[derive(Default)]
    pub(crate) struct RecordingAccess {
        pub calls: Mutex<Vec<String>>,
        pub running: Mutex<HashMap<String, bool>>,
        pub fail_stop: Mutex<Vec<String>>,
    }

    impl RecordingAccess {
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn set_running(&self, id: &str, running: bool) {
            self.running.lock().unwrap().insert(id.to_string(), running);
        }
    }

    #[async_trait]
    impl ContainerAccess for RecordingAccess {
        async fn start(&self, id: &str) -> Result<()> {
            self.calls.lock().unwrap().push(format!("start {id}"));
            self.set_running(id, true);
            Ok(())
        }

        async fn stop(&self, id: &str, grace: Duration) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("stop {id} {}s", grace.as_secs()));
            if self.fail_stop.lock().unwrap().iter().any(|f| f == id) {
                return Err(ContainerError::StopFailed {
                    id: id.to_string(),
                    reason: "no such container".to_string(),
                });
            }
            self.set_running(id, false);
            Ok(())
        }

        async fn remove(&self, id: &str) -> Result<()> {
            self.calls.lock().unwrap().push(format!("remove {id}"));
            Ok(())
        }

        async fn is_running(&self, id: &str) -> Result<bool> {
            self.running
                .lock()
                .unwrap()
                .get(id)
                .copied()
                .ok_or_else(|| ContainerError::InspectFailed {
                    id: id.to_string(),
                    reason: "unknown container".to_string(),
                })
        }
    }
}
