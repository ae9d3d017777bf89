//! Actions that tear down containers this process started.

use std::time::Duration;

use crate::container::{ContainerAccess, Result};

/// Stop (and optionally remove) one container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShutdownAction {
    pub container_id: String,
    pub remove: bool,
}

impl ShutdownAction {
    pub fn new(container_id: impl Into<String>, remove: bool) -> Self {
        Self {
            container_id: container_id.into(),
            remove,
        }
    }

    /// Stop the container, then remove it if requested.
    pub async fn execute(&self, access: &dyn ContainerAccess, grace: Duration) -> Result<()> {
        access.stop(&self.container_id, grace).await?;
        tracing::info!("Stopped container {}", self.container_id);
        if self.remove {
            access.remove(&self.container_id).await?;
            tracing::info!("Removed container {}", self.container_id);
        }
        Ok(())
    }
}

/// Registered shutdown actions, kept in registration order.
///
/// Owned by whoever starts containers and passed around explicitly.
#[derive(Debug, Default)]
pub struct ShutdownActions {
    actions: Vec<ShutdownAction>,
}

impl ShutdownActions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action. Returns false if it was already registered.
    pub fn register(&mut self, action: ShutdownAction) -> bool {
        if self.actions.contains(&action) {
            return false;
        }
        self.actions.push(action);
        true
    }

    /// Take every action out of the registry, newest first.
    pub fn drain_reversed(&mut self) -> Vec<ShutdownAction> {
        self.actions.drain(..).rev().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run every action newest first and clear the registry.
    ///
    /// Failures are logged and do not stop later actions. Returns the number
    /// of actions that failed.
    pub async fn run_all(&mut self, access: &dyn ContainerAccess, grace: Duration) -> usize {
        let mut failed = 0;
        for action in self.drain_reversed() {
            if let Err(e) = action.execute(access, grace).await {
                tracing::warn!("Shutdown of container {} failed: {}", action.container_id, e);
                failed += 1;
            }
        }
        failed
    }
}
