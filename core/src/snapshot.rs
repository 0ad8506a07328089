//! # Visual Snapshots
//!
//! Screenshots of live hosts are taken through the [`VisualSnapshotter`] port.
//! Browser handles are expensive, so a [`SnapshotPool`] owns a fixed number of
//! them and lends one out per capture. The lent handle goes back to the pool
//! when its guard is dropped, whether the capture succeeded or not.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use forge_common::error::ForgeError;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::prober::HttpProbe;

mod chrome;

pub use chrome::ChromeSnapshotter;

#[async_trait]
pub trait VisualSnapshotter: Send + Sync {
    /// Renders `url` and writes a thumbnail to `output`.
    async fn capture(&self, url: &str, output: &Path) -> Result<(), ForgeError>;
}

type Slots = Arc<Mutex<Vec<Arc<dyn VisualSnapshotter>>>>;

#[derive(Clone)]
pub struct SnapshotPool {
    slots: Slots,
    permits: Arc<Semaphore>,
    size: usize,
}

impl SnapshotPool {
    pub fn new(handles: Vec<Arc<dyn VisualSnapshotter>>) -> Self {
        let size: usize = handles.len();
        Self {
            slots: Arc::new(Mutex::new(handles)),
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Pool of `size` headless Chrome handles. Browsers start on first use.
    pub fn chrome(size: usize) -> Self {
        let handles: Vec<Arc<dyn VisualSnapshotter>> = (0..size)
            .map(|_| Arc::new(ChromeSnapshotter::new()) as Arc<dyn VisualSnapshotter>)
            .collect();
        Self::new(handles)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Waits for a free handle. `None` for a pool without handles.
    pub async fn acquire(&self) -> Option<PooledSnapshotter> {
        if self.size == 0 {
            return None;
        }
        let permit: OwnedSemaphorePermit = Arc::clone(&self.permits).acquire_owned().await.ok()?;
        let handle = self.slots.lock().unwrap_or_else(PoisonError::into_inner).pop()?;
        Some(PooledSnapshotter {
            handle,
            slots: Arc::clone(&self.slots),
            _permit: permit,
        })
    }

    /// Captures `http://{host}` into `{dir}/{host}.png` for every host.
    ///
    /// Hosts whose capture failed, or whose name would leave `dir`, are left
    /// out of the returned map. An unusable `dir` yields an empty map.
    pub async fn capture_hosts(&self, dir: &Path, hosts: &BTreeSet<String>) -> BTreeMap<String, PathBuf> {
        if hosts.is_empty() {
            return BTreeMap::new();
        }
        if self.size == 0 {
            warn!("snapshot pool has no handles, skipping {} captures", hosts.len());
            return BTreeMap::new();
        }

        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            let reason = format!("cannot create {}: {e}", dir.display());
            for host in hosts {
                warn!("{}", ForgeError::capture(host, reason.as_str()));
            }
            return BTreeMap::new();
        }

        let mut tasks: JoinSet<(String, Result<PathBuf, ForgeError>)> = JoinSet::new();
        for host in hosts {
            let Some(output) = output_path(dir, host) else {
                warn!("{}", ForgeError::capture(host, "host name is not a plain file name"));
                continue;
            };
            let pool: SnapshotPool = self.clone();
            let host: String = host.clone();
            tasks.spawn(async move {
                let Some(snapshotter) = pool.acquire().await else {
                    return (host.clone(), Err(ForgeError::capture(host, "no snapshot handle available")));
                };
                let result = snapshotter
                    .capture(&HttpProbe::url_for(&host), &output)
                    .await
                    .map(|()| output);
                (host, result)
            });
        }

        let mut shots: BTreeMap<String, PathBuf> = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((host, Ok(path))) => {
                    debug!(%host, path = %path.display(), "screenshot stored");
                    shots.insert(host, path);
                }
                Ok((_, Err(e))) => warn!("{e}"),
                Err(e) => error!("capture task aborted: {e}"),
            }
        }

        shots
    }
}

/// `{dir}/{host}.png`, or `None` when `host` could name anything but a file
/// directly inside `dir`.
fn output_path(dir: &Path, host: &str) -> Option<PathBuf> {
    let plain: bool = !host.is_empty()
        && !host.contains(['/', '\\'])
        && !host.split('.').any(|part| part.is_empty());
    plain.then(|| dir.join(format!("{host}.png")))
}

/// A handle on loan from a [`SnapshotPool`].
pub struct PooledSnapshotter {
    handle: Arc<dyn VisualSnapshotter>,
    slots: Slots,
    _permit: OwnedSemaphorePermit,
}

impl Deref for PooledSnapshotter {
    type Target = dyn VisualSnapshotter;

    fn deref(&self) -> &Self::Target {
        self.handle.as_ref()
    }
}

impl Drop for PooledSnapshotter {
    fn drop(&mut self) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::clone(&self.handle));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct FakeCamera {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl VisualSnapshotter for FakeCamera {
        async fn capture(&self, url: &str, output: &Path) -> Result<(), ForgeError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if url.contains("broken") {
                return Err(ForgeError::capture(url, "page crashed"));
            }
            tokio::fs::write(output, b"png").await.map_err(|e| ForgeError::io(output, e))
        }
    }

    fn hosts(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn failed_captures_are_left_out() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("example.com");
        let pool = SnapshotPool::new(vec![Arc::new(FakeCamera::default())]);

        let shots = pool
            .capture_hosts(&target, &hosts(&["www.example.com", "broken.example.com"]))
            .await;

        assert_eq!(shots.len(), 1);
        assert_eq!(shots["www.example.com"], target.join("www.example.com.png"));
        assert!(target.join("www.example.com.png").exists());
    }

    #[tokio::test]
    async fn handle_returns_to_pool_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let pool = SnapshotPool::new(vec![Arc::new(FakeCamera::default())]);

        {
            let camera = pool.acquire().await.unwrap();
            assert!(camera.capture("http://broken.example.com", &dir.path().join("x.png")).await.is_err());
        }

        let again = tokio::time::timeout(Duration::from_millis(100), pool.acquire()).await;
        assert!(matches!(again, Ok(Some(_))));
    }

    #[tokio::test]
    async fn captures_never_exceed_pool_size() {
        let dir = tempfile::tempdir().unwrap();
        let camera = Arc::new(FakeCamera::default());
        let pool = SnapshotPool::new(vec![camera.clone(), camera.clone()]);

        let many: BTreeSet<String> = (0..8).map(|i| format!("h{i}.example.com")).collect();
        let shots = pool.capture_hosts(dir.path(), &many).await;

        assert_eq!(shots.len(), 8);
        assert!(camera.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn empty_pool_captures_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let pool = SnapshotPool::new(Vec::new());

        assert!(pool.acquire().await.is_none());
        let shots = pool.capture_hosts(dir.path(), &hosts(&["www.example.com"])).await;
        assert!(shots.is_empty());
    }

    #[tokio::test]
    async fn unusable_directory_captures_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let pool = SnapshotPool::new(vec![Arc::new(FakeCamera::default())]);

        let shots = pool
            .capture_hosts(&blocker.join("example.com"), &hosts(&["www.example.com"]))
            .await;

        assert!(shots.is_empty());
    }

    #[tokio::test]
    async fn hosts_cannot_write_outside_their_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("screens").join("example.com");
        let pool = SnapshotPool::new(vec![Arc::new(FakeCamera::default())]);

        let shots = pool
            .capture_hosts(
                &target,
                &hosts(&["../../escaped.example.com", "a\\b.example.com", "www.example.com"]),
            )
            .await;

        assert_eq!(shots.keys().collect::<Vec<_>>(), vec!["www.example.com"]);
        assert!(!dir.path().join("escaped.example.com.png").exists());
        assert!(!dir.path().join("screens").join("escaped.example.com.png").exists());
    }
}
