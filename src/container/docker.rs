use std::time::Duration;

use async_trait::async_trait;
use bollard::container::{
    InspectContainerOptions, RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
};
use bollard::{API_DEFAULT_VERSION, Docker};

use crate::config::DockerConfig;
use crate::container::{ContainerAccess, Result};
use crate::error::ContainerError;

/// [`ContainerAccess`] backed by the Docker Engine API.
#[derive(Debug, Clone)]
pub struct DockerAccess {
    docker: Docker,
}

impl DockerAccess {
    /// Connect to the daemon named by `config.url` and check it responds.
    pub async fn connect(config: &DockerConfig) -> Result<Self> {
        let url = config.url.clone();
        let unavailable = |reason: String| ContainerError::DockerNotAvailable {
            url: url.clone(),
            reason,
        };

        let docker =
            open_client(&url, config.request_timeout_secs).map_err(|e| unavailable(e.to_string()))?;

        docker
            .ping()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        tracing::debug!("Connected to Docker at {}", url);
        Ok(Self { docker })
    }
}

fn open_client(url: &str, timeout_secs: u64) -> std::result::Result<Docker, bollard::errors::Error> {
    #[cfg(unix)]
    if let Some(path) = url.strip_prefix("unix://") {
        return Docker::connect_with_unix(path, timeout_secs, API_DEFAULT_VERSION);
    }
    Docker::connect_with_http(url, timeout_secs, API_DEFAULT_VERSION)
}

#[async_trait]
impl ContainerAccess for DockerAccess {
    async fn start(&self, id: &str) -> Result<()> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| ContainerError::StartFailed {
                id: id.to_string(),
                reason: e.to_string(),
            })?;
        tracing::info!("Started container {}", id);
        Ok(())
    }

    async fn stop(&self, id: &str, grace: Duration) -> Result<()> {
        self.docker
            .stop_container(
                id,
                Some(StopContainerOptions {
                    t: grace.as_secs() as i64,
                }),
            )
            .await
            .map_err(|e| ContainerError::StopFailed {
                id: id.to_string(),
                reason: e.to_string(),
            })
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.docker
            .remove_container(
                id,
                Some(RemoveContainerOptions {
                    force: true,
                    v: true,
                    ..Default::default()
                }),
            )
            .await
            .map_err(|e| ContainerError::RemoveFailed {
                id: id.to_string(),
                reason: e.to_string(),
            })
    }

    async fn is_running(&self, id: &str) -> Result<bool> {
        let info = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
            .map_err(|e| ContainerError::InspectFailed {
                id: id.to_string(),
                reason: e.to_string(),
            })?;
        Ok(info.state.and_then(|s| s.running).unwrap_or(false))
    }
}
