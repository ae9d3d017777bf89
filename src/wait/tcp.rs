//! TCP port readiness probe.

use std::fmt;

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::error::ProbeError;
use crate::wait::{PROBE_TIMEOUT, Probe};

/// A host and port to connect to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TcpTarget {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for TcpTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Probe that is ready once every port has accepted a connection.
///
/// A port that accepted once is considered open for the rest of this
/// probe's life and is not tried again, so the pending set only shrinks.
/// Build a fresh probe for every wait.
#[derive(Debug)]
pub struct TcpProbe {
    host: String,
    ports: Vec<u16>,
    pending: Vec<TcpTarget>,
}

impl TcpProbe {
    pub fn new(host: impl Into<String>, ports: &[u16]) -> Self {
        let host = host.into();
        let pending = ports
            .iter()
            .map(|&port| TcpTarget {
                host: host.clone(),
                port,
            })
            .collect();
        Self {
            host,
            ports: ports.to_vec(),
            pending,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// All ports this probe was created with.
    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    /// Targets that have not accepted a connection yet, in input order.
    pub fn pending(&self) -> &[TcpTarget] {
        &self.pending
    }
}

/// One bounded connect attempt. The stream is closed before returning.
async fn try_connect(target: &TcpTarget) -> bool {
    let connect = TcpStream::connect((target.host.as_str(), target.port));
    match tokio::time::timeout(PROBE_TIMEOUT, connect).await {
        Ok(Ok(stream)) => {
            drop(stream);
            true
        }
        Ok(Err(e)) => {
            tracing::trace!("{} not open yet: {}", target, e);
            false
        }
        Err(_) => {
            tracing::trace!("{} timed out after {:?}", target, PROBE_TIMEOUT);
            false
        }
    }
}

#[async_trait]
impl Probe for TcpProbe {
    fn name(&self) -> String {
        let ports: Vec<String> = self.ports.iter().map(u16::to_string).collect();
        format!("tcp {}:[{}]", self.host, ports.join(","))
    }

    async fn evaluate(&mut self) -> Result<bool, ProbeError> {
        let mut still_pending = Vec::with_capacity(self.pending.len());
        for target in self.pending.drain(..) {
            if try_connect(&target).await {
                tracing::debug!("{} accepted a connection", target);
            } else {
                still_pending.push(target);
            }
        }
        self.pending = still_pending;
        Ok(self.pending.is_empty())
    }
}
