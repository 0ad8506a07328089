//! # Snapshot Store
//!
//! The single owner of scan history and monitor state.
//!
//! Records are immutable once appended and addressed by a [`RecordId`] that
//! is never reused. A secondary `domain -> ids` index answers per-domain
//! questions (latest record, known subdomains) without scanning the history.
//!
//! Two kinds of locks are involved:
//! * a short-lived `RwLock` around the maps, never held across an `.await`;
//! * one async mutex per domain ([`SnapshotStore::lock_domain`]) that
//!   serializes read-modify-write sequences on the same domain, e.g. the
//!   monitor's diff -> probe -> append against an interactive rescan.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use forge_common::Domain;
use forge_common::error::ForgeError;
use forge_common::monitor::{MonitorState, MonitorView};
use forge_common::record::{NewRecord, ProbeResult, RecordId, ScanRecord};
use forge_common::source::SourceSet;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct MonitorEntry {
    state: MonitorState,
    new_subdomains: Vec<String>,
    sources: SourceSet,
    capture_screenshots: bool,
}

/// What the scheduler needs to know to re-scan a monitored domain.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    pub sources: SourceSet,
    pub capture_screenshots: bool,
}

#[derive(Default)]
struct Inner {
    records: BTreeMap<RecordId, Arc<ScanRecord>>,
    by_domain: HashMap<Domain, BTreeSet<RecordId>>,
    monitors: BTreeMap<Domain, MonitorEntry>,
}

impl Inner {
    fn domain_records<'a>(&'a self, domain: &Domain) -> impl Iterator<Item = &'a Arc<ScanRecord>> + 'a {
        self.by_domain
            .get(domain)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(|id| self.records.get(id))
    }

    fn insert(&mut self, record: ScanRecord) -> RecordId {
        let id: RecordId = record.id;
        self.by_domain.entry(record.domain.clone()).or_default().insert(id);
        self.records.insert(id, Arc::new(record));
        id
    }

    fn remove(&mut self, id: RecordId) -> Option<Arc<ScanRecord>> {
        let record: Arc<ScanRecord> = self.records.remove(&id)?;
        if let Some(ids) = self.by_domain.get_mut(&record.domain) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_domain.remove(&record.domain);
            }
        }
        Some(record)
    }
}

pub struct SnapshotStore {
    inner: RwLock<Inner>,
    next_id: AtomicU64,
    domain_locks: Mutex<HashMap<Domain, Arc<AsyncMutex<()>>>>,
    artifact_root: PathBuf,
}

impl SnapshotStore {
    pub fn new(artifact_root: impl Into<PathBuf>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            next_id: AtomicU64::new(1),
            domain_locks: Mutex::new(HashMap::new()),
            artifact_root: artifact_root.into(),
        }
    }

    pub fn artifact_root(&self) -> &Path {
        &self.artifact_root
    }

    /// Directory holding the screenshots of `domain`.
    pub fn artifact_dir(&self, domain: &Domain) -> PathBuf {
        self.artifact_root.join(domain.as_str())
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn allocate_id(&self) -> RecordId {
        RecordId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Serializes updates of one domain. Hold the guard for the whole
    /// read-modify-write sequence.
    pub async fn lock_domain(&self, domain: &Domain) -> OwnedMutexGuard<()> {
        let lock: Arc<AsyncMutex<()>> = {
            let mut locks = self.domain_locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(domain.clone()).or_default())
        };
        lock.lock_owned().await
    }

    // ── history ────────────────────────────────────────────────────────

    pub fn append(&self, record: NewRecord) -> RecordId {
        let record = ScanRecord::from_new(self.allocate_id(), record);
        debug!(domain = %record.domain, id = %record.id, count = record.num_subdomains, "appending scan record");
        self.write().insert(record)
    }

    pub fn get(&self, id: RecordId) -> Result<Arc<ScanRecord>, ForgeError> {
        self.read()
            .records
            .get(&id)
            .cloned()
            .ok_or(ForgeError::RecordNotFound(id))
    }

    /// All records, oldest first.
    pub fn history(&self) -> Vec<Arc<ScanRecord>> {
        self.read().records.values().cloned().collect()
    }

    pub fn latest_for(&self, domain: &Domain) -> Option<Arc<ScanRecord>> {
        self.read().domain_records(domain).last().cloned()
    }

    pub fn has_history(&self, domain: &Domain) -> bool {
        self.read().by_domain.contains_key(domain)
    }

    /// Removes a record and the artifact directory of its domain.
    pub async fn delete(&self, id: RecordId) -> Result<Arc<ScanRecord>, ForgeError> {
        let domain: Domain = self.get(id)?.domain.clone();
        let _guard = self.lock_domain(&domain).await;

        let removed: Arc<ScanRecord> = self.write().remove(id).ok_or(ForgeError::RecordNotFound(id))?;
        self.remove_artifacts(&domain).await?;

        info!(%domain, %id, "deleted scan record");
        Ok(removed)
    }

    /// Latest known status of every subdomain ever recorded for `domain`.
    pub fn known_statuses(&self, domain: &Domain) -> ProbeResult {
        let inner = self.read();
        let mut known: ProbeResult = ProbeResult::new();
        for record in inner.domain_records(domain) {
            known.extend(record.subdomain_statuses.iter().map(|(k, v)| (k.clone(), *v)));
        }
        known
    }

    pub fn known_set(&self, domain: &Domain) -> BTreeSet<String> {
        self.known_statuses(domain).into_keys().collect()
    }

    /// Every screenshot still referenced by a record of `domain`.
    pub fn known_screenshots(&self, domain: &Domain) -> BTreeMap<String, PathBuf> {
        let inner = self.read();
        let mut shots: BTreeMap<String, PathBuf> = BTreeMap::new();
        for record in inner.domain_records(domain) {
            if let Some(map) = &record.screenshots {
                shots.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        shots
    }

    /// Subdomains in `found` that no record of `domain` has seen yet.
    pub fn diff(&self, domain: &Domain, found: &BTreeSet<String>) -> BTreeSet<String> {
        let known: BTreeSet<String> = self.known_set(domain);
        found.difference(&known).cloned().collect()
    }

    async fn remove_artifacts(&self, domain: &Domain) -> Result<(), ForgeError> {
        let dir: PathBuf = self.artifact_dir(domain);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                debug!(path = %dir.display(), "removed artifact directory");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ForgeError::io(dir, e)),
        }
    }

    // ── monitoring ─────────────────────────────────────────────────────

    /// Starts monitoring `domain`. Re-adding an existing entry reactivates it
    /// and keeps its accumulated deltas.
    pub fn add_monitor(&self, domain: &Domain, settings: MonitorSettings) -> MonitorView {
        let mut inner = self.write();
        let entry = inner
            .monitors
            .entry(domain.clone())
            .and_modify(|entry| {
                entry.state = MonitorState::Active;
                entry.sources = settings.sources.clone();
                entry.capture_screenshots = settings.capture_screenshots;
            })
            .or_insert_with(|| MonitorEntry {
                state: MonitorState::Active,
                new_subdomains: Vec::new(),
                sources: settings.sources.clone(),
                capture_screenshots: settings.capture_screenshots,
            });
        view(domain, entry)
    }

    pub fn set_monitor_state(&self, domain: &Domain, state: MonitorState) -> Result<(), ForgeError> {
        let mut inner = self.write();
        let entry = inner
            .monitors
            .get_mut(domain)
            .ok_or_else(|| ForgeError::NotMonitored(domain.clone()))?;
        entry.state = state;
        Ok(())
    }

    /// Drops the monitor entry together with the domain's history and artifacts.
    pub async fn remove_monitor(&self, domain: &Domain) -> Result<usize, ForgeError> {
        let _guard = self.lock_domain(domain).await;

        let removed: usize = {
            let mut inner = self.write();
            inner
                .monitors
                .remove(domain)
                .ok_or_else(|| ForgeError::NotMonitored(domain.clone()))?;
            let ids: BTreeSet<RecordId> = inner.by_domain.remove(domain).unwrap_or_default();
            for id in &ids {
                inner.records.remove(id);
            }
            ids.len()
        };
        self.remove_artifacts(domain).await?;

        info!(%domain, records = removed, "stopped monitoring and dropped history");
        Ok(removed)
    }

    pub fn monitors(&self) -> Vec<MonitorView> {
        self.read()
            .monitors
            .iter()
            .map(|(domain, entry)| view(domain, entry))
            .collect()
    }

    pub fn monitor(&self, domain: &Domain) -> Option<MonitorView> {
        self.read().monitors.get(domain).map(|entry| view(domain, entry))
    }

    pub fn active_domains(&self) -> Vec<Domain> {
        self.read()
            .monitors
            .iter()
            .filter(|(_, entry)| entry.state == MonitorState::Active)
            .map(|(domain, _)| domain.clone())
            .collect()
    }

    pub fn is_active(&self, domain: &Domain) -> bool {
        self.read()
            .monitors
            .get(domain)
            .is_some_and(|entry| entry.state == MonitorState::Active)
    }

    pub fn monitor_settings(&self, domain: &Domain) -> Option<MonitorSettings> {
        self.read().monitors.get(domain).map(|entry| MonitorSettings {
            sources: entry.sources.clone(),
            capture_screenshots: entry.capture_screenshots,
        })
    }

    /// Appends a monitor record and its delta in one step.
    ///
    /// Fails without touching history if the entry vanished in the meantime.
    pub fn commit_monitor_delta(
        &self,
        record: NewRecord,
        delta: &BTreeSet<String>,
    ) -> Result<RecordId, ForgeError> {
        let domain: Domain = record.domain.clone();
        let mut inner = self.write();
        let Some(entry) = inner.monitors.get_mut(&domain) else {
            warn!(%domain, "monitor entry removed before results could be stored");
            return Err(ForgeError::NotMonitored(domain));
        };
        entry.new_subdomains.extend(delta.iter().cloned());

        let record = ScanRecord::from_new(self.allocate_id(), record);
        Ok(inner.insert(record))
    }
}

fn view(domain: &Domain, entry: &MonitorEntry) -> MonitorView {
    MonitorView {
        domain: domain.clone(),
        state: entry.state,
        new_subdomains: entry.new_subdomains.clone(),
        sources: entry.sources.clone(),
        capture_screenshots: entry.capture_screenshots,
    }
}
