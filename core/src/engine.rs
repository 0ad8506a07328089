//! Building blocks shared by interactive scans and the monitor loop.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use forge_common::Domain;
use forge_common::source::SourceSet;
use tracing::warn;

use crate::aggregator::Aggregator;
use crate::prober::LivenessProber;
use crate::snapshot::SnapshotPool;
use crate::store::SnapshotStore;

pub struct Engine {
    pub(crate) aggregator: Aggregator,
    pub(crate) prober: LivenessProber,
    pub(crate) store: SnapshotStore,
    pub(crate) snapshots: Option<SnapshotPool>,
}

impl Engine {
    pub fn new(
        aggregator: Aggregator,
        prober: LivenessProber,
        store: SnapshotStore,
        snapshots: Option<SnapshotPool>,
    ) -> Self {
        Self {
            aggregator,
            prober,
            store,
            snapshots,
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Fully qualified subdomains of `domain` reported by the enabled sources.
    pub(crate) async fn subdomains(&self, domain: &Domain, sources: &SourceSet) -> BTreeSet<String> {
        self.aggregator
            .collect(domain, sources)
            .await
            .iter()
            .map(|label| domain.subdomain(label))
            .collect()
    }

    /// Screenshots of `hosts`, stored under the domain's artifact directory.
    ///
    /// Capture problems are logged and never fail the caller.
    pub(crate) async fn screenshots(&self, domain: &Domain, hosts: &BTreeSet<String>) -> BTreeMap<String, PathBuf> {
        match &self.snapshots {
            Some(pool) => pool.capture_hosts(&self.store.artifact_dir(domain), hosts).await,
            None => {
                warn!(%domain, "screenshots requested but no snapshot pool is configured");
                BTreeMap::new()
            }
        }
    }
}
