use async_trait::async_trait;
use errors::RemoteError;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use storage::{KvSnapshotCache, MemoryStorage};
use tn_core::remote::{FetchOutcome, RemoteObject, VersionToken, WriteOutcome, WriteRequest};
use tn_core::traits::RemoteObjectStore;
use tokio::sync::{Mutex, RwLock};

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

pub fn unique_id(prefix: &str) -> String {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}", prefix, id)
}

pub fn memory_cache() -> Arc<KvSnapshotCache<MemoryStorage>> {
    Arc::new(KvSnapshotCache::new(Arc::new(MemoryStorage::new())))
}

/// Versioned object store held in memory.
///
/// Versions are `v1`, `v2`, ... in write order. Writes are compare-and-swap
/// on the stored version, like the real contents API.
#[derive(Default)]
pub struct MemoryRemote {
    objects: RwLock<HashMap<String, RemoteObject>>,
    next_version: AtomicU32,
    fetches: AtomicUsize,
    writes: AtomicUsize,
    race: Mutex<VecDeque<String>>,
    fetch_failures: Mutex<VecDeque<RemoteError>>,
    write_failures: Mutex<VecDeque<RemoteError>>,
    last_write: Mutex<Option<WriteRequest>>
}

impl MemoryRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn mint(&self) -> VersionToken {
        let n = self.next_version.fetch_add(1, Ordering::SeqCst) + 1;
        VersionToken::new(format!("v{n}"))
    }

    /// Stores `content` as if another device pushed it.
    pub async fn seed(&self, path: &str, content: &str) -> VersionToken {
        let version = self.mint();
        self.objects.write().await.insert(
            path.to_string(),
            RemoteObject {
                content: content.to_string(),
                version: version.clone()
            }
        );
        version
    }

    pub async fn content(&self, path: &str) -> Option<String> {
        self.objects
            .read()
            .await
            .get(path)
            .map(|o| o.content.clone())
    }

    pub async fn version(&self, path: &str) -> Option<VersionToken> {
        self.objects
            .read()
            .await
            .get(path)
            .map(|o| o.version.clone())
    }

    /// Another writer stores `content` between the next write's token fetch
    /// and its compare-and-swap, so that write conflicts.
    pub async fn race_next_write(&self, content: &str) {
        self.race.lock().await.push_back(content.to_string());
    }

    pub async fn fail_next_fetch(&self, error: RemoteError) {
        self.fetch_failures.lock().await.push_back(error);
    }

    pub async fn fail_next_write(&self, error: RemoteError) {
        self.write_failures.lock().await.push_back(error);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Successful writes only.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn last_write(&self) -> Option<WriteRequest> {
        self.last_write.lock().await.clone()
    }
}

#[async_trait]
impl RemoteObjectStore for MemoryRemote {
    async fn fetch_object(&self, path: &str, _git_ref: &str) -> Result<FetchOutcome, RemoteError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.fetch_failures.lock().await.pop_front() {
            return Err(error);
        }
        Ok(match self.objects.read().await.get(path) {
            Some(object) => FetchOutcome::Found(object.clone()),
            None => FetchOutcome::NotFound
        })
    }

    async fn write_object(&self, request: WriteRequest) -> Result<WriteOutcome, RemoteError> {
        if let Some(error) = self.write_failures.lock().await.pop_front() {
            return Err(error);
        }
        let raced = self.race.lock().await.pop_front();
        if let Some(content) = raced {
            tracing::debug!(path = %request.path, "Injecting concurrent write");
            self.seed(&request.path, &content).await;
        }

        let mut objects = self.objects.write().await;
        let current = objects.get(&request.path).map(|o| o.version.clone());
        if current != request.expected_version {
            return Ok(WriteOutcome::Conflict);
        }

        let version = self.mint();
        objects.insert(
            request.path.clone(),
            RemoteObject {
                content: request.content.clone(),
                version: version.clone()
            }
        );
        drop(objects);

        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.last_write.lock().await = Some(request);
        Ok(WriteOutcome::Written(version))
    }
}
