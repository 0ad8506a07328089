//! HTTP liveness probing of discovered hosts.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use forge_common::error::ForgeError;
use forge_common::record::ProbeResult;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error};

/// Answers "does this host respond, and with which status code".
#[async_trait]
pub trait HostProbe: Send + Sync {
    async fn status(&self, host: &str) -> Option<u16>;
}

/// Plain `GET http://<host>` with a hard timeout.
pub struct HttpProbe {
    http: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    pub fn url_for(host: &str) -> String {
        format!("http://{host}")
    }
}

#[async_trait]
impl HostProbe for HttpProbe {
    async fn status(&self, host: &str) -> Option<u16> {
        match self.http.get(Self::url_for(host)).send().await {
            Ok(response) => Some(response.status().as_u16()),
            Err(e) if e.is_timeout() => {
                debug!("{}", ForgeError::ProbeTimeout(host.to_string()));
                None
            }
            Err(e) => {
                let unreachable = ForgeError::ProbeUnreachable {
                    host: host.to_string(),
                    reason: e.to_string(),
                };
                debug!("{unreachable}");
                None
            }
        }
    }
}

/// How many probes may be in flight at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolSize {
    /// One task per host, all started immediately.
    Unbounded,
    Bounded(usize),
}

impl From<Option<usize>> for PoolSize {
    fn from(limit: Option<usize>) -> Self {
        match limit {
            Some(n) => Self::Bounded(n),
            None => Self::Unbounded,
        }
    }
}

pub struct LivenessProber {
    probe: Arc<dyn HostProbe>,
}

impl LivenessProber {
    pub fn new(probe: Arc<dyn HostProbe>) -> Self {
        Self { probe }
    }

    /// Probes every host exactly once.
    ///
    /// The result has an entry for every input host; hosts whose probe did not
    /// complete are recorded as unreachable.
    pub async fn probe(&self, hosts: &BTreeSet<String>, pool: PoolSize) -> ProbeResult {
        let limiter: Option<Arc<Semaphore>> = match pool {
            PoolSize::Bounded(n) => Some(Arc::new(Semaphore::new(n.max(1)))),
            PoolSize::Unbounded => None,
        };

        let mut tasks: JoinSet<(String, Option<u16>)> = JoinSet::new();
        for host in hosts {
            let probe: Arc<dyn HostProbe> = Arc::clone(&self.probe);
            let limiter: Option<Arc<Semaphore>> = limiter.clone();
            let host: String = host.clone();
            tasks.spawn(async move {
                let _permit = match limiter {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                let status = probe.status(&host).await;
                (host, status)
            });
        }

        let mut results: ProbeResult = hosts.iter().map(|host| (host.clone(), None)).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((host, status)) => {
                    results.insert(host, status);
                }
                Err(e) => error!("probe task aborted: {e}"),
            }
        }

        results
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
