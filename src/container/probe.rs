use std::sync::Arc;

use async_trait::async_trait;

use crate::container::ContainerAccess;
use crate::error::ProbeError;
use crate::wait::{PROBE_TIMEOUT, Probe};

/// Watches a container while other probes wait for it.
///
/// Never reports readiness. Fails the wait as soon as the container is seen
/// not running, so a crashed container does not burn the whole deadline.
/// Inspection errors and inspections slower than [`PROBE_TIMEOUT`] count as
/// "no news". Place it after the readiness probes.
pub struct ContainerRunningProbe {
    access: Arc<dyn ContainerAccess>,
    id: String,
}

impl ContainerRunningProbe {
    pub fn new(access: Arc<dyn ContainerAccess>, id: impl Into<String>) -> Self {
        Self {
            access,
            id: id.into(),
        }
    }
}

#[async_trait]
impl Probe for ContainerRunningProbe {
    fn name(&self) -> String {
        format!("container {}", self.id)
    }

    async fn evaluate(&mut self) -> Result<bool, ProbeError> {
        match tokio::time::timeout(PROBE_TIMEOUT, self.access.is_running(&self.id)).await {
            Ok(Ok(true)) => Ok(false),
            Ok(Ok(false)) => Err(ProbeError::ContainerStopped {
                id: self.id.clone(),
            }),
            Ok(Err(e)) => {
                tracing::trace!("Could not inspect container {}: {}", self.id, e);
                Ok(false)
            }
            Err(_) => {
                tracing::trace!(
                    "Inspecting container {} timed out after {:?}",
                    self.id,
                    PROBE_TIMEOUT
                );
                Ok(false)
            }
        }
    }
}
