//! Sync orchestrator.
//!
//! `SyncManager` owns the authoritative snapshot. Mutations go through it,
//! are persisted to the cache immediately and schedule a debounced push.
//! Pull, merge and push run under one async mutex so two sync sequences
//! never overlap.

use crate::debounce::Debouncer;
use crate::error::{Result, SyncError};
use crate::events::SyncEvent;
use crate::merge::merge;
use crate::mutation::{self, Mutation};
use crate::state::SyncPhase;
use chrono::{DateTime, SecondsFormat, Utc};
use errors::RemoteError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;
use tn_core::document::ExportDocument;
use tn_core::remote::{FetchOutcome, VersionToken, WriteOutcome, WriteRequest};
use tn_core::traits::{RemoteObjectStore, SnapshotCache};
use tn_core::types::Snapshot;
use tokio::sync::{Mutex, RwLock, broadcast, watch};
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct SyncOptions {
    pub path: String,
    pub branch: String,
    pub debounce: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from_config(
            &config::RemoteConfig::default(),
            &config::SyncConfig::default()
        )
    }
}

impl SyncOptions {
    pub fn from_config(remote: &config::RemoteConfig, sync: &config::SyncConfig) -> Self {
        Self {
            path: remote.path.clone(),
            branch: remote.branch.clone(),
            debounce: Duration::from_millis(sync.debounce_ms),
            max_retries: sync.max_retries,
            initial_backoff: Duration::from_millis(sync.initial_backoff_ms),
            max_backoff: Duration::from_millis(sync.max_backoff_ms)
        }
    }

    /// Delays grow as `initial * 2^n`, capped at `max_backoff`.
    fn backoff(&self) -> impl Iterator<Item = Duration> + use<> {
        let factor = (self.initial_backoff.as_millis() / 2).max(1) as u64;
        let max = self.max_backoff;
        ExponentialBackoff::from_millis(2)
            .factor(factor)
            .max_delay(max)
            .map(jitter)
            .take(self.max_retries as usize)
    }
}

/// Result of a completed full sync.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub pulled: Option<VersionToken>,
    pub pushed: VersionToken,
    pub attempts: u32,
    pub snapshot: Snapshot
}

struct Inner {
    cache: Arc<dyn SnapshotCache>,
    remote: Option<Arc<dyn RemoteObjectStore>>,
    options: SyncOptions,
    snapshot: RwLock<Snapshot>,
    /// Version of the last remote content folded into `snapshot`.
    merged_version: RwLock<Option<VersionToken>>,
    sequence: Mutex<()>,
    full_sync_running: AtomicBool,
    phase: watch::Sender<SyncPhase>,
    events: broadcast::Sender<SyncEvent>,
    debouncer: Debouncer
}

#[derive(Clone)]
pub struct SyncManager {
    inner: Arc<Inner>
}

/// Clears the full-sync flag on every exit path.
struct FullSyncGuard<'a>(&'a AtomicBool);

impl Drop for FullSyncGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SyncManager {
    /// `remote` is `None` when running without a configured remote; local
    /// edits still work and sync operations return `NoRemote`.
    pub fn new(
        cache: Arc<dyn SnapshotCache>,
        remote: Option<Arc<dyn RemoteObjectStore>>,
        options: SyncOptions
    ) -> Self {
        let (phase, _) = watch::channel(SyncPhase::Idle);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let debouncer = Debouncer::new(options.debounce);
        Self {
            inner: Arc::new(Inner {
                cache,
                remote,
                options,
                snapshot: RwLock::new(Snapshot::default()),
                merged_version: RwLock::new(None),
                sequence: Mutex::new(()),
                full_sync_running: AtomicBool::new(false),
                phase,
                events,
                debouncer
            })
        }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.inner.options
    }

    pub fn has_remote(&self) -> bool {
        self.inner.remote.is_some()
    }

    /// Loads the cached snapshot into memory, or starts empty.
    #[tracing::instrument(skip(self))]
    pub async fn open(&self) -> Result<Snapshot> {
        let loaded = self.inner.cache.load().await?;
        let snapshot = match loaded {
            Some(snapshot) => {
                tracing::info!(
                    videos = snapshot.videos.len(),
                    history = snapshot.watch_history.len(),
                    "Loaded snapshot from local cache"
                );
                snapshot
            }
            None => {
                tracing::info!("No cached snapshot; starting empty");
                Snapshot::default()
            }
        };
        *self.inner.snapshot.write().await = snapshot.clone();
        Ok(snapshot)
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.inner.snapshot.read().await.clone()
    }

    pub fn phase(&self) -> SyncPhase {
        self.inner.phase.borrow().clone()
    }

    pub fn watch_phase(&self) -> watch::Receiver<SyncPhase> {
        self.inner.phase.subscribe()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.inner.events.subscribe()
    }

    pub async fn last_sync(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.inner.cache.last_sync().await?)
    }

    pub async fn has_pending_push(&self) -> bool {
        self.inner.debouncer.is_pending().await
    }

    fn emit(&self, event: SyncEvent) {
        // no subscribers is fine
        let _ = self.inner.events.send(event);
    }

    fn transition(&self, next: SyncPhase) -> Result<()> {
        let current = self.inner.phase.borrow().clone();
        if !current.can_transition_to(&next) {
            return Err(SyncError::InvalidTransition {
                from: current,
                to: next
            });
        }
        tracing::debug!(from = %current, to = %next, "Sync phase change");
        self.inner.phase.send_replace(next.clone());
        self.emit(SyncEvent::PhaseChanged { phase: next });
        Ok(())
    }

    /// Enters the first busy phase of a sequence, recovering from a previous
    /// failure first.
    fn begin(&self, first: SyncPhase) -> Result<()> {
        if matches!(self.phase(), SyncPhase::Error(_)) {
            self.transition(SyncPhase::Idle)?;
        }
        self.transition(first)
    }

    fn fail(&self, error: &SyncError) {
        let message = error.to_string();
        if self.phase().is_busy() {
            // busy phases always accept Error
            let _ = self.transition(SyncPhase::Error(message.clone()));
        }
        metrics::counter!("tubenotes_sync_failures_total").increment(1);
        self.emit(SyncEvent::SyncFailed {
            message,
            retryable: error.is_retryable()
        });
    }

    fn remote(&self) -> Result<&Arc<dyn RemoteObjectStore>> {
        self.inner.remote.as_ref().ok_or(SyncError::NoRemote)
    }

    async fn with_retry<T, F, Fut>(&self, operation: &str, attempt: F) -> Result<(T, u32)>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>
    {
        let attempts = AtomicU32::new(0);
        let result = RetryIf::spawn(
            self.inner.options.backoff(),
            || {
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                if n > 1 {
                    tracing::info!(operation, attempt = n, "Retrying");
                }
                attempt()
            },
            |e: &SyncError| {
                let retry = e.is_retryable();
                if retry {
                    tracing::warn!(operation, error = %e, "Retryable sync failure");
                }
                retry
            }
        )
        .await;
        result.map(|value| (value, attempts.load(Ordering::SeqCst)))
    }

    fn decode(content: &str) -> Result<Snapshot> {
        ExportDocument::from_json(content)
            .map(ExportDocument::into_snapshot)
            .map_err(|e| {
                SyncError::Remote(RemoteError::Decode {
                    reason: e.to_string()
                })
            })
    }

    /// Folds `remote` into the local snapshot and writes the cache while the
    /// snapshot lock is held, so concurrent mutations are never lost.
    async fn merge_into_local(
        &self,
        remote: &Snapshot,
        version: Option<VersionToken>
    ) -> Result<Snapshot> {
        let mut local = self.inner.snapshot.write().await;
        let merged = merge(&local, remote);
        self.inner.cache.save(&merged).await?;
        *local = merged.clone();
        *self.inner.merged_version.write().await = version;
        Ok(merged)
    }

    async fn pull_step(&self) -> Result<(Snapshot, Option<VersionToken>)> {
        let remote = self.remote()?;
        self.begin(SyncPhase::Pulling)?;
        let outcome = remote
            .fetch_object(&self.inner.options.path, &self.inner.options.branch)
            .await?;
        metrics::counter!("tubenotes_sync_pulls_total").increment(1);

        let (remote_snapshot, version) = match outcome {
            FetchOutcome::Found(object) => (Self::decode(&object.content)?, Some(object.version)),
            FetchOutcome::NotFound => {
                tracing::info!(
                    path = %self.inner.options.path,
                    "Remote snapshot absent; treating as empty"
                );
                (Snapshot::default(), None)
            }
        };
        self.emit(SyncEvent::Pulled {
            version: version.clone(),
            found: version.is_some()
        });

        self.transition(SyncPhase::Merging)?;
        let merged = self.merge_into_local(&remote_snapshot, version.clone()).await?;
        Ok((merged, version))
    }

    async fn push_step(&self) -> Result<VersionToken> {
        let remote = self.remote()?;
        if self.phase() != SyncPhase::Merging {
            self.begin(SyncPhase::Pushing)?;
        } else {
            self.transition(SyncPhase::Pushing)?;
        }
        let options = &self.inner.options;

        // latest token, read immediately before writing
        let current = remote.fetch_object(&options.path, &options.branch).await?;
        let expected = current.version().cloned();
        let merged_version = self.inner.merged_version.read().await.clone();
        if expected != merged_version {
            match &current {
                FetchOutcome::Found(object) => {
                    tracing::info!(
                        version = %object.version,
                        "Remote changed since last merge; merging before write"
                    );
                    let remote_snapshot = Self::decode(&object.content)?;
                    self.merge_into_local(&remote_snapshot, expected.clone()).await?;
                }
                FetchOutcome::NotFound => {
                    *self.inner.merged_version.write().await = None;
                }
            }
        }

        let now = Utc::now();
        let snapshot = self.snapshot().await;
        let content = ExportDocument::new(snapshot, now).to_pretty_json()?;
        let request = WriteRequest {
            path: options.path.clone(),
            content,
            expected_version: expected,
            branch: options.branch.clone(),
            message: format!(
                "Sync YouTube data - {}",
                now.to_rfc3339_opts(SecondsFormat::Millis, true)
            )
        };

        match remote.write_object(request).await? {
            WriteOutcome::Written(version) => {
                metrics::counter!("tubenotes_sync_pushes_total").increment(1);
                *self.inner.merged_version.write().await = Some(version.clone());
                self.inner.cache.record_sync(now).await?;
                tracing::info!(version = %version, "Pushed snapshot");
                self.emit(SyncEvent::Pushed {
                    version: version.clone()
                });
                Ok(version)
            }
            WriteOutcome::Conflict => {
                metrics::counter!("tubenotes_sync_conflicts_total").increment(1);
                tracing::warn!(path = %options.path, "Write rejected: remote changed concurrently");
                Err(SyncError::Conflict {
                    path: options.path.clone()
                })
            }
        }
    }

    async fn pull_attempt(&self) -> Result<(Snapshot, Option<VersionToken>)> {
        match self.pull_step().await {
            Ok(pulled) => {
                self.transition(SyncPhase::Idle)?;
                Ok(pulled)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    async fn push_attempt(&self) -> Result<VersionToken> {
        match self.push_step().await {
            Ok(version) => {
                self.transition(SyncPhase::Idle)?;
                Ok(version)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    async fn sync_attempt(&self) -> Result<(Option<VersionToken>, VersionToken, Snapshot)> {
        let pulled = self.pull_step().await;
        let result = match pulled {
            Ok((_, pulled_version)) => self
                .push_step()
                .await
                .map(|pushed| (pulled_version, pushed)),
            Err(e) => Err(e)
        };
        match result {
            Ok((pulled, pushed)) => {
                self.transition(SyncPhase::Idle)?;
                Ok((pulled, pushed, self.snapshot().await))
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Fetches the remote snapshot and merges it into the local one.
    #[tracing::instrument(skip(self))]
    pub async fn pull(&self) -> Result<Snapshot> {
        self.remote()?;
        let _sequence = self.inner.sequence.lock().await;
        let ((snapshot, _), _) = self.with_retry("pull", || self.pull_attempt()).await?;
        Ok(snapshot)
    }

    /// Writes the local snapshot, merging first if the remote moved.
    #[tracing::instrument(skip(self))]
    pub async fn push(&self) -> Result<VersionToken> {
        self.remote()?;
        let _sequence = self.inner.sequence.lock().await;
        let (version, _) = self.with_retry("push", || self.push_attempt()).await?;
        Ok(version)
    }

    /// Pull, merge, push. A second call while one is running is rejected.
    #[tracing::instrument(skip(self))]
    pub async fn sync(&self) -> Result<SyncReport> {
        self.remote()?;
        if self
            .inner
            .full_sync_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::info!("Sync request rejected: already in progress");
            return Err(SyncError::SyncInProgress);
        }
        let _guard = FullSyncGuard(&self.inner.full_sync_running);

        // a pending debounced push is subsumed by this sync
        self.inner.debouncer.cancel().await;
        let _sequence = self.inner.sequence.lock().await;
        let ((pulled, pushed, snapshot), attempts) =
            self.with_retry("sync", || self.sync_attempt()).await?;
        tracing::info!(version = %pushed, attempts, "Sync complete");
        Ok(SyncReport {
            pulled,
            pushed,
            attempts,
            snapshot
        })
    }

    async fn debounced_push(&self) {
        let _sequence = self.inner.sequence.lock().await;
        match self.with_retry("debounced push", || self.push_attempt()).await {
            Ok((version, _)) => tracing::debug!(version = %version, "Debounced push complete"),
            Err(e) => tracing::warn!(error = %e, "Debounced push failed; local state kept")
        }
    }

    async fn schedule_push(&self) {
        if !self.has_remote() {
            return;
        }
        let manager = self.clone();
        self.inner
            .debouncer
            .schedule(async move { manager.debounced_push().await })
            .await;
    }

    /// Cancels a pending debounced push and runs it now. Returns `None` when
    /// nothing was pending.
    #[tracing::instrument(skip(self))]
    pub async fn flush(&self) -> Result<Option<VersionToken>> {
        if self.inner.debouncer.cancel().await {
            return self.push().await.map(Some);
        }
        self.inner.debouncer.wait_started().await;
        Ok(None)
    }

    /// Drops a pending debounced push. Local state is already cached.
    #[tracing::instrument(skip(self))]
    pub async fn shutdown(&self) {
        if self.inner.debouncer.cancel().await {
            tracing::info!("Cancelled pending push on shutdown");
        }
        self.inner.debouncer.wait_started().await;
    }

    /// Applies a mutation, persists the result and schedules a push.
    #[tracing::instrument(skip(self), fields(video_id = %mutation.video_id()))]
    pub async fn apply(&self, mutation: Mutation) -> Result<Snapshot> {
        let next = {
            let mut snapshot = self.inner.snapshot.write().await;
            let next = mutation::apply(&snapshot, &mutation, Utc::now())?;
            self.inner.cache.save(&next).await?;
            *snapshot = next.clone();
            next
        };

        metrics::counter!("tubenotes_mutations_total", "kind" => mutation.kind()).increment(1);
        self.emit(SyncEvent::LocalChanged {
            video_id: mutation.video_id().to_string(),
            stats: next.stats()
        });
        self.schedule_push().await;
        Ok(next)
    }

    pub async fn add_history_entry(
        &self,
        video_id: &str,
        title: Option<&str>,
        channel: Option<&str>,
        note: Option<&str>
    ) -> Result<Snapshot> {
        self.apply(Mutation::AddHistoryEntry {
            video_id: video_id.to_string(),
            title: title.map(str::to_string),
            channel: channel.map(str::to_string),
            note: note.map(str::to_string)
        })
        .await
    }

    pub async fn set_read(&self, video_id: &str, read: bool) -> Result<Snapshot> {
        self.apply(Mutation::SetRead {
            video_id: video_id.to_string(),
            read
        })
        .await
    }

    pub async fn toggle_read(&self, video_id: &str) -> Result<Snapshot> {
        self.apply(Mutation::ToggleRead {
            video_id: video_id.to_string()
        })
        .await
    }

    pub async fn add_note(&self, video_id: &str, text: &str) -> Result<Snapshot> {
        self.add_note_at(video_id, text, 0.0).await
    }

    pub async fn add_note_at(&self, video_id: &str, text: &str, seconds: f64) -> Result<Snapshot> {
        self.apply(Mutation::AddNote {
            video_id: video_id.to_string(),
            text: text.to_string(),
            time: seconds
        })
        .await
    }

    pub async fn delete_note(&self, video_id: &str, index: usize) -> Result<Snapshot> {
        self.apply(Mutation::DeleteNote {
            video_id: video_id.to_string(),
            index
        })
        .await
    }

    pub async fn delete_video(&self, video_id: &str) -> Result<Snapshot> {
        self.apply(Mutation::DeleteVideo {
            video_id: video_id.to_string()
        })
        .await
    }
}
