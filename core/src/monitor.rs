//! # Monitor Scheduler
//!
//! Background task that periodically re-scans every active monitored domain
//! and records subdomains it has not seen before.
//!
//! One cycle walks the active domains one after another. Each domain step
//! holds that domain's store lock, so an interactive scan of the same domain
//! waits for it while scans of other domains proceed. A failing or slow
//! domain is logged and skipped; it never ends the cycle or the loop.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use forge_common::Domain;
use forge_common::config::MonitorConfig;
use forge_common::error::ForgeError;
use forge_common::record::{NewRecord, ProbeResult, ScanOrigin};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::engine::Engine;
use crate::prober::PoolSize;

/// What happened to a single domain during a cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainOutcome {
    /// First scan of a domain without history; stored without deltas.
    Baseline { subdomains: usize },
    Unchanged,
    NewSubdomains(BTreeSet<String>),
    /// Paused or removed after the cycle started.
    Skipped,
}

#[derive(Debug, Default)]
pub struct CycleReport {
    pub outcomes: BTreeMap<Domain, DomainOutcome>,
    pub timed_out: Vec<Domain>,
    pub failed: Vec<Domain>,
}

impl CycleReport {
    pub fn new_subdomains(&self, domain: &Domain) -> Option<&BTreeSet<String>> {
        match self.outcomes.get(domain)? {
            DomainOutcome::NewSubdomains(found) => Some(found),
            _ => None,
        }
    }

    pub fn total_new(&self) -> usize {
        self.outcomes
            .values()
            .map(|outcome| match outcome {
                DomainOutcome::NewSubdomains(found) => found.len(),
                _ => 0,
            })
            .sum()
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} domains checked, {} new subdomains, {} timed out, {} failed",
            self.outcomes.len(),
            self.total_new(),
            self.timed_out.len(),
            self.failed.len()
        )
    }
}

pub struct MonitorScheduler {
    engine: Arc<Engine>,
    config: MonitorConfig,
}

impl MonitorScheduler {
    pub fn new(engine: Arc<Engine>, config: MonitorConfig) -> Self {
        Self { engine, config }
    }

    /// Starts the loop on the current runtime. The first cycle runs at once.
    pub fn spawn(self) -> MonitorHandle {
        let token = CancellationToken::new();
        let task = tokio::spawn(self.run(token.clone()));
        MonitorHandle { token, task }
    }

    async fn run(self, shutdown: CancellationToken) {
        info!(interval = ?self.config.interval, "monitor started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                report = self.run_cycle() => {
                    info!("monitor cycle finished: {report}");
                }
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        info!("monitor stopped");
    }

    /// Re-scans every domain that is active right now.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();

        for domain in self.engine.store.active_domains() {
            match tokio::time::timeout(self.config.domain_deadline, self.refresh(&domain)).await {
                Ok(Ok(outcome)) => {
                    if let DomainOutcome::NewSubdomains(found) = &outcome {
                        info!(%domain, count = found.len(), "new subdomains discovered");
                    }
                    report.outcomes.insert(domain, outcome);
                }
                Ok(Err(e)) => {
                    warn!(%domain, "monitor step failed: {e}");
                    report.failed.push(domain);
                }
                Err(_) => {
                    error!(%domain, deadline = ?self.config.domain_deadline, "monitor step exceeded its deadline");
                    report.timed_out.push(domain);
                }
            }
        }

        report
    }

    async fn refresh(&self, domain: &Domain) -> Result<DomainOutcome, ForgeError> {
        let store = &self.engine.store;
        let _guard = store.lock_domain(domain).await;

        // Re-checked under the lock: the entry may have been paused or removed.
        let Some(settings) = store.monitor_settings(domain).filter(|_| store.is_active(domain)) else {
            debug!(%domain, "no longer active, skipping");
            return Ok(DomainOutcome::Skipped);
        };

        let found: BTreeSet<String> = self.engine.subdomains(domain, &settings.sources).await;
        let pool = PoolSize::Bounded(self.config.probe_pool);

        if !store.has_history(domain) {
            let statuses: ProbeResult = self.engine.prober.probe(&found, pool).await;
            let subdomains: usize = statuses.len();
            store.commit_monitor_delta(
                NewRecord::new(domain.clone(), ScanOrigin::Monitor, statuses),
                &BTreeSet::new(),
            )?;
            debug!(%domain, subdomains, "stored monitor baseline");
            return Ok(DomainOutcome::Baseline { subdomains });
        }

        let delta: BTreeSet<String> = store.diff(domain, &found);
        if delta.is_empty() {
            return Ok(DomainOutcome::Unchanged);
        }

        let mut statuses: ProbeResult = store.known_statuses(domain);
        statuses.extend(self.engine.prober.probe(&delta, pool).await);

        let mut record = NewRecord::new(domain.clone(), ScanOrigin::Monitor, statuses);
        if settings.capture_screenshots {
            let mut shots = store.known_screenshots(domain);
            shots.extend(self.engine.screenshots(domain, &delta).await);
            record = record.with_screenshots(shots);
        }

        store.commit_monitor_delta(record, &delta)?;
        Ok(DomainOutcome::NewSubdomains(delta))
    }
}

/// Owner of a running scheduler task.
pub struct MonitorHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Cancels the loop and waits for the task to end.
    pub async fn shutdown(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            error!("monitor task ended abnormally: {e}");
        }
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
