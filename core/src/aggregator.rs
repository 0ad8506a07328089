//! Fan-out over the enabled passive sources.
//!
//! Every enabled source runs in its own task. Results are folded into one set
//! in whatever order the tasks finish; set union makes that order irrelevant.

use std::collections::BTreeSet;
use std::sync::Arc;

use forge_common::Domain;
use forge_common::source::{SourceKind, SourceSet};
use forge_sources::SourceClient;
use tokio::task::JoinSet;
use tracing::{debug, error};

pub struct Aggregator {
    clients: Vec<Arc<dyn SourceClient>>,
}

impl Aggregator {
    pub fn new(clients: Vec<Arc<dyn SourceClient>>) -> Self {
        Self { clients }
    }

    /// Kinds for which a client is registered.
    pub fn available(&self) -> SourceSet {
        self.clients.iter().map(|client| client.kind()).collect()
    }

    /// Collects the deduplicated labels of `domain` from every enabled source.
    ///
    /// Never fails: a source that errors or panics contributes nothing.
    pub async fn collect(&self, domain: &Domain, enabled: &SourceSet) -> BTreeSet<String> {
        let mut tasks: JoinSet<(SourceKind, Vec<String>)> = JoinSet::new();

        for client in self.clients.iter().filter(|c| enabled.contains(c.kind())) {
            let client: Arc<dyn SourceClient> = Arc::clone(client);
            let domain: Domain = domain.clone();
            tasks.spawn(async move {
                let labels = client.fetch(&domain).await;
                (client.kind(), labels)
            });
        }

        let mut labels: BTreeSet<String> = BTreeSet::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((kind, found)) => {
                    debug!(%domain, source = %kind, count = found.len(), "merging source result");
                    labels.extend(found);
                }
                Err(e) => error!(%domain, "source task aborted: {e}"),
            }
        }

        labels
    }
}
