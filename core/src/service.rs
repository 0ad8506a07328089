//! # Recon Service
//!
//! The entry point used by front-ends. It validates input, runs interactive
//! scans, manages monitor entries and hands out the background scheduler.
//!
//! Every operation that takes a domain string parses it first, so an invalid
//! name is rejected with [`ForgeError::InvalidDomain`] before any request
//! leaves the process.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use forge_common::Domain;
use forge_common::config::{Config, MonitorConfig};
use forge_common::error::ForgeError;
use forge_common::monitor::{MonitorState, MonitorView};
use forge_common::record::{NewRecord, ProbeResult, RecordId, ScanOrigin, ScanRecord};
use forge_common::source::SourceSet;
use forge_sources::SourceClient;
use tracing::info;

use crate::aggregator::Aggregator;
use crate::engine::Engine;
use crate::export;
use crate::monitor::MonitorScheduler;
use crate::prober::{HostProbe, HttpProbe, LivenessProber, PoolSize};
use crate::snapshot::SnapshotPool;
use crate::store::{MonitorSettings, SnapshotStore};

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub sources: SourceSet,
    pub capture_screenshots: bool,
    pub export_csv: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            sources: SourceSet::all(),
            capture_screenshots: false,
            export_csv: false,
        }
    }
}

/// Overrides for a new monitor entry. Unset fields fall back to the monitor
/// config (sources) and the domain's latest record (screenshots).
#[derive(Debug, Clone, Default)]
pub struct MonitorOptions {
    pub sources: Option<SourceSet>,
    pub capture_screenshots: Option<bool>,
}

pub struct ReconService {
    engine: Arc<Engine>,
    config: Config,
}

impl ReconService {
    pub fn new(
        config: Config,
        clients: Vec<Arc<dyn SourceClient>>,
        probe: Arc<dyn HostProbe>,
        snapshots: Option<SnapshotPool>,
    ) -> Self {
        let engine = Engine::new(
            Aggregator::new(clients),
            LivenessProber::new(probe),
            SnapshotStore::new(config.artifacts.root.clone()),
            snapshots,
        );
        Self {
            engine: Arc::new(engine),
            config,
        }
    }

    /// Service wired to the real sources, HTTP probing and headless Chrome.
    pub fn with_http(config: Config) -> anyhow::Result<Self> {
        let clients = forge_sources::build_clients(&config.sources).context("building source clients")?;
        let probe = HttpProbe::new(config.probe.timeout).context("building probe client")?;
        let snapshots = SnapshotPool::chrome(config.artifacts.snapshot_handles);
        Ok(Self::new(config, clients, Arc::new(probe), Some(snapshots)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &SnapshotStore {
        self.engine.store()
    }

    /// Sources that have a client registered.
    pub fn available_sources(&self) -> SourceSet {
        self.engine.aggregator.available()
    }

    // ── scans ──────────────────────────────────────────────────────────

    /// Collects, probes, optionally screenshots and stores one scan.
    ///
    /// A scan that found nothing is still recorded.
    pub async fn scan(&self, domain: &str, options: &ScanOptions) -> Result<Arc<ScanRecord>, ForgeError> {
        let domain: Domain = Domain::parse(domain)?;
        info!(%domain, sources = %options.sources, "starting scan");

        let found = self.engine.subdomains(&domain, &options.sources).await;
        info!(%domain, count = found.len(), "subdomains collected");

        let pool = PoolSize::from(self.config.probe.interactive_pool);
        let statuses: ProbeResult = self.engine.prober.probe(&found, pool).await;

        let _guard = self.engine.store.lock_domain(&domain).await;
        let mut record = NewRecord::new(domain.clone(), ScanOrigin::Interactive, statuses);
        if options.capture_screenshots {
            let shots = self.engine.screenshots(&domain, &found).await;
            record = record.with_screenshots(shots);
        }

        let id: RecordId = self.engine.store.append(record);
        let stored: Arc<ScanRecord> = self.engine.store.get(id)?;
        info!(%domain, %id, live = stored.live_count(), total = stored.num_subdomains, "scan stored");

        if options.export_csv {
            let path = export::export_to(&self.config.artifacts.export_dir, &stored)?;
            info!(path = %path.display(), "exported scan");
        }

        Ok(stored)
    }

    pub fn csv_path(&self, domain: &Domain) -> PathBuf {
        self.config.artifacts.export_dir.join(export::csv_file_name(domain))
    }

    pub fn record(&self, id: RecordId) -> Result<Arc<ScanRecord>, ForgeError> {
        self.engine.store.get(id)
    }

    pub async fn delete_record(&self, id: RecordId) -> Result<Arc<ScanRecord>, ForgeError> {
        self.engine.store.delete(id).await
    }

    pub fn history(&self) -> Vec<Arc<ScanRecord>> {
        self.engine.store.history()
    }

    // ── monitoring ─────────────────────────────────────────────────────

    pub fn add_monitor(&self, domain: &str) -> Result<MonitorView, ForgeError> {
        self.add_monitor_with(domain, MonitorOptions::default())
    }

    pub fn add_monitor_with(&self, domain: &str, options: MonitorOptions) -> Result<MonitorView, ForgeError> {
        let domain: Domain = Domain::parse(domain)?;
        let store = &self.engine.store;

        let capture_screenshots: bool = options.capture_screenshots.unwrap_or_else(|| {
            store
                .latest_for(&domain)
                .is_some_and(|record| record.screenshots.is_some())
        });
        let settings = MonitorSettings {
            sources: options.sources.unwrap_or_else(|| self.config.monitor.sources.clone()),
            capture_screenshots,
        };

        let view = store.add_monitor(&domain, settings);
        info!(%domain, "monitoring enabled");
        Ok(view)
    }

    pub fn pause_monitor(&self, domain: &str) -> Result<(), ForgeError> {
        let domain: Domain = Domain::parse(domain)?;
        self.engine.store.set_monitor_state(&domain, MonitorState::Paused)?;
        info!(%domain, "monitoring paused");
        Ok(())
    }

    pub fn resume_monitor(&self, domain: &str) -> Result<(), ForgeError> {
        let domain: Domain = Domain::parse(domain)?;
        self.engine.store.set_monitor_state(&domain, MonitorState::Active)?;
        info!(%domain, "monitoring resumed");
        Ok(())
    }

    /// Stops monitoring and drops the domain's history and screenshots.
    pub async fn remove_monitor(&self, domain: &str) -> Result<usize, ForgeError> {
        let domain: Domain = Domain::parse(domain)?;
        self.engine.store.remove_monitor(&domain).await
    }

    pub fn monitors(&self) -> Vec<MonitorView> {
        self.engine.store.monitors()
    }

    /// Scheduler bound to this service's state. Call `spawn` to start it.
    pub fn scheduler(&self, config: MonitorConfig) -> MonitorScheduler {
        MonitorScheduler::new(Arc::clone(&self.engine), config)
    }
}
