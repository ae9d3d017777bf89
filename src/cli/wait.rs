use std::sync::Arc;

use clap::Args;
use serde::Serialize;

use crate::config::Config;
use crate::container::{
    ContainerAccess, ContainerRunningProbe, DockerAccess, ShutdownAction, ShutdownActions,
};
use crate::error::ProbeError;
use crate::wait::{HttpProbe, Probe, TcpProbe, Waiter};

/// What to wait for.
#[derive(Args, Debug, Clone)]
#[command(group(
    clap::ArgGroup::new("target")
        .required(true)
        .multiple(true)
        .args(["url", "tcp_ports"])
))]
pub struct WaitArgs {
    /// URL to ping until it answers with an accepted status
    #[arg(long)]
    pub url: Option<String>,

    /// HTTP method for the ping (default: HEAD)
    #[arg(long, requires = "url")]
    pub method: Option<String>,

    /// Accepted status: a code ("204") or an inclusive range ("200..399")
    #[arg(long, requires = "url")]
    pub status: Option<String>,

    /// Host whose TCP ports are checked
    #[arg(long, default_value = "localhost")]
    pub tcp_host: String,

    /// TCP port that must accept connections (repeat or comma-separate)
    #[arg(long = "tcp-port", value_delimiter = ',')]
    pub tcp_ports: Vec<u16>,

    /// Seconds to wait at most (0 or less: 10 s default)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub time: i64,

    /// Start this container first and stop it again if the wait fails
    #[arg(long)]
    pub container: Option<String>,

    /// Keep the container when the wait fails
    #[arg(long, requires = "container")]
    pub keep: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Outcome printed after a successful wait.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WaitReport {
    pub status: &'static str,
    pub elapsed_ms: u64,
    pub checks: Vec<String>,
}

/// Build the probe set described by `args`, HTTP first.
pub fn build_probes(args: &WaitArgs) -> Result<Vec<Box<dyn Probe>>, ProbeError> {
    let mut probes: Vec<Box<dyn Probe>> = Vec::new();
    if let Some(url) = &args.url {
        probes.push(Box::new(HttpProbe::new(
            url,
            args.method.as_deref(),
            args.status.as_deref(),
        )?));
    }
    if !args.tcp_ports.is_empty() {
        probes.push(Box::new(TcpProbe::new(&args.tcp_host, &args.tcp_ports)));
    }
    Ok(probes)
}

pub async fn run_wait_command(args: WaitArgs, config: &Config) -> anyhow::Result<()> {
    let access: Option<Arc<dyn ContainerAccess>> = match &args.container {
        Some(id) if config.docker.skip => {
            tracing::info!("Docker skipped, not starting container {}", id);
            None
        }
        Some(_) => {
            let docker = DockerAccess::connect(&config.docker).await?;
            Some(Arc::new(docker) as Arc<dyn ContainerAccess>)
        }
        None => None,
    };

    let report = wait_with_container(&args, config, access).await?;
    if args.json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!("ready after {} ms", report.elapsed_ms);
    }
    Ok(())
}

/// Run the wait described by `args`, managing `args.container` through `access`.
///
/// With no `access` the container (if any) is left alone. Otherwise it is
/// started, watched while waiting, and stopped and removed again when the
/// wait fails, unless keeping it was asked for.
pub async fn wait_with_container(
    args: &WaitArgs,
    config: &Config,
    access: Option<Arc<dyn ContainerAccess>>,
) -> anyhow::Result<WaitReport> {
    let mut probes = build_probes(args)?;
    let checks: Vec<String> = probes.iter().map(|p| p.name()).collect();

    let mut shutdown = ShutdownActions::new();
    let access = match (&args.container, access) {
        (Some(id), Some(access)) => {
            access.start(id).await?;
            shutdown.register(ShutdownAction::new(id.clone(), true));
            probes.push(Box::new(ContainerRunningProbe::new(Arc::clone(&access), id.clone())));
            Some(access)
        }
        _ => None,
    };

    let waiter = Waiter::new(config.wait);
    match waiter.wait_for(args.time, probes).await {
        Ok(elapsed) => Ok(WaitReport {
            status: "ready",
            elapsed_ms: elapsed.as_millis() as u64,
            checks,
        }),
        Err(e) => {
            let keep = args.keep || config.docker.keep_on_failure;
            if let Some(access) = access {
                if keep {
                    tracing::info!("Keeping container after failed wait");
                } else {
                    shutdown.run_all(access.as_ref(), config.docker.stop_grace).await;
                }
            }
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::testing::RecordingAccess;
    use tokio::net::TcpListener;

    fn args() -> WaitArgs {
        WaitArgs {
            url: None,
            method: None,
            status: None,
            tcp_host: "localhost".to_string(),
            tcp_ports: Vec::new(),
            time: 0,
            container: None,
            keep: false,
            json: false,
        }
    }

    #[test]
    fn test_build_probes_http_then_tcp() {
        let probes = build_probes(&WaitArgs {
            url: Some("http://localhost:8080/health".to_string()),
            method: Some("get".to_string()),
            tcp_ports: vec![5432, 6379],
            ..args()
        })
        .unwrap();

        let names: Vec<String> = probes.iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            vec![
                "GET http://localhost:8080/health",
                "tcp localhost:[5432,6379]"
            ]
        );
    }

    #[test]
    fn test_build_probes_rejects_bad_status() {
        let result = build_probes(&WaitArgs {
            url: Some("http://localhost:8080/".to_string()),
            status: Some("ok".to_string()),
            ..args()
        });
        assert!(matches!(result, Err(ProbeError::InvalidStatusSpec { .. })));
    }

    #[test]
    fn test_report_json_shape() {
        let report = WaitReport {
            status: "ready",
            elapsed_ms: 1500,
            checks: vec!["tcp localhost:[80]".to_string()],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "ready",
                "elapsed_ms": 1500,
                "checks": ["tcp localhost:[80]"],
            })
        );
    }

    #[tokio::test]
    async fn test_wait_command_times_out_on_closed_port() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = run_wait_command(
            WaitArgs {
                tcp_host: "127.0.0.1".to_string(),
                tcp_ports: vec![port],
                time: 1,
                ..args()
            },
            &Config::default(),
        )
        .await;

        let err = result.unwrap_err();
        let wait_err = err.downcast_ref::<crate::error::WaitError>().unwrap();
        assert!(wait_err.is_timeout());
    }

    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    fn container_args(port: u16) -> WaitArgs {
        WaitArgs {
            tcp_host: "127.0.0.1".to_string(),
            tcp_ports: vec![port],
            time: 1,
            container: Some("app".to_string()),
            ..args()
        }
    }

    #[tokio::test]
    async fn test_failed_wait_stops_and_removes_container() {
        let recording = Arc::new(RecordingAccess::default());
        let access: Arc<dyn ContainerAccess> = recording.clone();

        let args = container_args(closed_port().await);

        let result = wait_with_container(&args, &Config::default(), Some(access)).await;

        assert!(result.is_err());
        assert_eq!(recording.calls(), vec!["start app", "stop app 10s", "remove app"]);
        assert!(!recording.is_running("app").await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_wait_keeps_container_when_asked() {
        let recording = Arc::new(RecordingAccess::default());
        let access: Arc<dyn ContainerAccess> = recording.clone();
        let args = WaitArgs {
            keep: true,
            ..container_args(closed_port().await)
        };

        let result = wait_with_container(&args, &Config::default(), Some(access)).await;

        assert!(result.is_err());
        assert_eq!(recording.calls(), vec!["start app"]);
        assert!(recording.is_running("app").await.unwrap());
    }

    #[tokio::test]
    async fn test_keep_on_failure_setting_skips_teardown() {
        let recording = Arc::new(RecordingAccess::default());
        let access: Arc<dyn ContainerAccess> = recording.clone();
        let mut config = Config::default();
        config.docker.keep_on_failure = true;

        let args = container_args(closed_port().await);

        let result = wait_with_container(&args, &config, Some(access)).await;

        assert!(result.is_err());
        assert_eq!(recording.calls(), vec!["start app"]);
    }

    #[tokio::test]
    async fn test_ready_wait_leaves_container_running() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let recording = Arc::new(RecordingAccess::default());
        let access: Arc<dyn ContainerAccess> = recording.clone();

        let report = wait_with_container(&container_args(port), &Config::default(), Some(access))
            .await
            .unwrap();

        assert_eq!(report.status, "ready");
        assert_eq!(report.checks, vec![format!("tcp 127.0.0.1:[{port}]")]);
        assert_eq!(recording.calls(), vec!["start app"]);
        assert!(recording.is_running("app").await.unwrap());
    }
}
