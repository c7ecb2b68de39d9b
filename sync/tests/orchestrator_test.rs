use async_trait::async_trait;
use errors::RemoteError;
use std::sync::Arc;
use std::time::Duration;
use sync::{SyncError, SyncEvent, SyncManager, SyncOptions, SyncPhase};
use testing::{MemoryRemote, SnapshotBuilder, decode_export, memory_cache};
use tn_core::remote::{FetchOutcome, WriteOutcome, WriteRequest};
use tn_core::traits::{RemoteObjectStore, SnapshotCache};

const PATH: &str = "youtube/data.json";

fn options(max_retries: u32) -> SyncOptions {
    SyncOptions {
        max_retries,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
        debounce: Duration::from_secs(2),
        ..SyncOptions::default()
    }
}

async fn manager_with(
    remote: &Arc<MemoryRemote>,
    local: Option<tn_core::Snapshot>,
    max_retries: u32
) -> (SyncManager, Arc<dyn SnapshotCache>) {
    let cache: Arc<dyn SnapshotCache> = memory_cache();
    if let Some(local) = local {
        cache.save(&local).await.unwrap();
    }
    let manager = SyncManager::new(
        cache.clone(),
        Some(remote.clone() as Arc<dyn RemoteObjectStore>),
        options(max_retries)
    );
    manager.open().await.unwrap();
    (manager, cache)
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<SyncEvent>) -> Vec<SyncEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_pull_not_found_bootstraps_empty_remote() {
    let local = SnapshotBuilder::new()
        .video("b", "2024-02-01T00:00:00.000Z")
        .video("a", "2024-01-01T00:00:00.000Z")
        .note("a", 0.0, "intro")
        .build();
    let remote = MemoryRemote::new();
    let (manager, cache) = manager_with(&remote, Some(local.clone()), 0).await;

    let pulled = manager.pull().await.unwrap();
    assert_eq!(pulled, local);
    assert_eq!(cache.load().await.unwrap(), Some(local.clone()));
    assert_eq!(manager.phase(), SyncPhase::Idle);

    let report = manager.sync().await.unwrap();
    assert_eq!(report.pulled, None);
    let written = remote.last_write().await.unwrap();
    assert_eq!(written.expected_version, None);
    assert!(written.message.starts_with("Sync YouTube data - "));
    assert_eq!(decode_export(&remote.content(PATH).await.unwrap()), local);
}

#[tokio::test]
async fn test_sync_merges_remote_and_pushes_union() {
    let local = SnapshotBuilder::new()
        .video("a", "2024-01-01T00:00:00.000Z")
        .note("a", 0.0, "intro")
        .build();
    let remote_doc = SnapshotBuilder::new()
        .video("r", "2024-03-01T00:00:00.000Z")
        .video("a", "2024-05-01T00:00:00.000Z")
        .note("a", 30.0, "key point")
        .read("a")
        .export_json();

    let remote = MemoryRemote::new();
    let v1 = remote.seed(PATH, &remote_doc).await;
    let (manager, cache) = manager_with(&remote, Some(local), 0).await;

    let report = manager.sync().await.unwrap();
    assert_eq!(report.pulled, Some(v1.clone()));
    assert_eq!(remote.last_write().await.unwrap().expected_version, Some(v1));

    let merged = report.snapshot;
    let ids: Vec<_> = merged.watch_history.iter().map(|h| h.video_id.as_str()).collect();
    assert_eq!(ids, vec!["r", "a"]);
    assert_eq!(merged.watch_history[1].timestamp, "2024-01-01T00:00:00.000Z");
    let texts: Vec<_> = merged.videos["a"].notes.iter().map(|n| n.text.as_str()).collect();
    assert_eq!(texts, vec!["intro", "key point"]);
    assert!(merged.videos["a"].read);

    assert_eq!(cache.load().await.unwrap(), Some(merged.clone()));
    assert_eq!(decode_export(&remote.content(PATH).await.unwrap()), merged);
    assert!(manager.last_sync().await.unwrap().is_some());
}

#[tokio::test]
async fn test_stale_token_conflict_leaves_cache_and_remote_intact() {
    let shared = SnapshotBuilder::new()
        .video("a", "2024-01-01T00:00:00.000Z")
        .export_json();
    let remote = MemoryRemote::new();
    remote.seed(PATH, &shared).await;
    let (manager, cache) = manager_with(&remote, None, 0).await;
    manager.pull().await.unwrap();
    let before = cache.load().await.unwrap();

    let other_device = SnapshotBuilder::new()
        .video("z", "2024-06-01T00:00:00.000Z")
        .video("a", "2024-01-01T00:00:00.000Z")
        .export_json();
    remote.race_next_write(&other_device).await;

    let result = manager.push().await;
    assert!(matches!(result, Err(SyncError::Conflict { .. })));
    assert!(matches!(manager.phase(), SyncPhase::Error(_)));
    assert_eq!(cache.load().await.unwrap(), before);
    assert_eq!(remote.content(PATH).await.unwrap(), other_device);
    assert_eq!(remote.write_count(), 0);
}

#[tokio::test]
async fn test_sync_retry_recovers_from_conflict() {
    let remote = MemoryRemote::new();
    remote
        .seed(
            PATH,
            &SnapshotBuilder::new().video("a", "2024-01-01T00:00:00.000Z").export_json()
        )
        .await;
    let (manager, _) = manager_with(&remote, None, 3).await;
    manager.add_note("a", "mine").await.unwrap();

    remote
        .race_next_write(
            &SnapshotBuilder::new()
                .video("z", "2024-06-01T00:00:00.000Z")
                .video("a", "2024-01-01T00:00:00.000Z")
                .export_json()
        )
        .await;

    let report = manager.sync().await.unwrap();
    assert_eq!(report.attempts, 2);
    assert_eq!(remote.write_count(), 1);

    let stored = decode_export(&remote.content(PATH).await.unwrap());
    assert!(stored.video("z").is_some());
    assert_eq!(stored.videos["a"].notes[0].text, "mine");
    assert_eq!(manager.phase(), SyncPhase::Idle);
}

#[tokio::test]
async fn test_push_merges_unseen_remote_change_before_write() {
    let remote = MemoryRemote::new();
    remote
        .seed(
            PATH,
            &SnapshotBuilder::new().video("a", "2024-01-01T00:00:00.000Z").export_json()
        )
        .await;
    let (manager, _) = manager_with(&remote, None, 0).await;
    manager.pull().await.unwrap();

    let v2 = remote
        .seed(
            PATH,
            &SnapshotBuilder::new()
                .video("b", "2024-02-01T00:00:00.000Z")
                .video("a", "2024-01-01T00:00:00.000Z")
                .export_json()
        )
        .await;
    manager.set_read("a", true).await.unwrap();
    manager.push().await.unwrap();

    assert_eq!(remote.last_write().await.unwrap().expected_version, Some(v2));
    let stored = decode_export(&remote.content(PATH).await.unwrap());
    assert!(stored.video("b").is_some());
    assert!(stored.videos["a"].read);
    assert!(manager.snapshot().await.video("b").is_some());
    manager.shutdown().await;
}

#[tokio::test]
async fn test_auth_failure_keeps_local_state_and_recovers() {
    let remote = MemoryRemote::new();
    let local = SnapshotBuilder::new().video("a", "2024-01-01T00:00:00.000Z").build();
    let (manager, _) = manager_with(&remote, Some(local.clone()), 3).await;
    let mut events = manager.subscribe();

    remote
        .fail_next_fetch(RemoteError::AuthFailure {
            reason: "bad credentials".to_string()
        })
        .await;
    let result = manager.sync().await;
    assert!(matches!(
        result,
        Err(SyncError::Remote(RemoteError::AuthFailure { .. }))
    ));
    assert_eq!(remote.fetch_count(), 1);
    assert!(matches!(manager.phase(), SyncPhase::Error(_)));
    assert_eq!(manager.snapshot().await, local);
    assert!(drain(&mut events).iter().any(|e| matches!(
        e,
        SyncEvent::SyncFailed {
            retryable: false,
            ..
        }
    )));

    manager.sync().await.unwrap();
    assert_eq!(manager.phase(), SyncPhase::Idle);
}

#[tokio::test]
async fn test_transient_fetch_failure_is_retried() {
    let remote = MemoryRemote::new();
    let (manager, _) = manager_with(&remote, None, 2).await;
    remote
        .fail_next_fetch(RemoteError::Transient {
            reason: "connection reset".to_string()
        })
        .await;

    let report = manager.sync().await.unwrap();
    assert_eq!(report.attempts, 2);
}

#[tokio::test]
async fn test_sync_event_sequence() {
    let remote = MemoryRemote::new();
    let (manager, _) = manager_with(&remote, None, 0).await;
    let mut events = manager.subscribe();

    manager.sync().await.unwrap();

    let phases: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            SyncEvent::PhaseChanged { phase } => Some(phase),
            _ => None
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            SyncPhase::Pulling,
            SyncPhase::Merging,
            SyncPhase::Pushing,
            SyncPhase::Idle
        ]
    );
}

#[tokio::test]
async fn test_mutation_rejected_without_touching_state() {
    let remote = MemoryRemote::new();
    let (manager, cache) = manager_with(&remote, None, 0).await;
    manager.add_history_entry("a", None, None, None).await.unwrap();
    let before = cache.load().await.unwrap();

    let result = manager.delete_note("a", 3).await;
    assert!(matches!(result, Err(SyncError::Mutation(_))));
    assert_eq!(cache.load().await.unwrap(), before);
    assert_eq!(Some(manager.snapshot().await), before);
    manager.shutdown().await;
}

#[tokio::test]
async fn test_local_edits_without_remote() {
    let cache: Arc<dyn SnapshotCache> = memory_cache();
    let manager = SyncManager::new(cache.clone(), None, options(0));
    manager.open().await.unwrap();

    manager
        .add_history_entry("dQw4w9WgXcQ", Some("Song"), None, Some("classic"))
        .await
        .unwrap();
    manager.toggle_read("dQw4w9WgXcQ").await.unwrap();

    let cached = cache.load().await.unwrap().unwrap();
    assert!(cached.videos["dQw4w9WgXcQ"].read);
    assert!(!manager.has_pending_push().await);
    assert!(matches!(manager.sync().await, Err(SyncError::NoRemote)));
}

#[tokio::test(start_paused = true)]
async fn test_debounced_burst_produces_one_write() {
    let remote = MemoryRemote::new();
    let (manager, _) = manager_with(&remote, None, 0).await;

    for id in ["a", "b", "c"] {
        manager.add_history_entry(id, None, None, None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
    }
    assert_eq!(remote.write_count(), 0);
    assert!(manager.has_pending_push().await);

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(remote.write_count(), 1);
    assert!(!manager.has_pending_push().await);

    let stored = decode_export(&remote.content(PATH).await.unwrap());
    assert_eq!(stored.watch_history.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_flush_pushes_pending_changes_now() {
    let remote = MemoryRemote::new();
    let (manager, _) = manager_with(&remote, None, 0).await;

    assert_eq!(manager.flush().await.unwrap(), None);
    manager.add_note_at("a", "chapter two", 125.0).await.unwrap();
    let version = manager.flush().await.unwrap();
    assert!(version.is_some());
    assert_eq!(remote.write_count(), 1);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(remote.write_count(), 1);
    let stored = decode_export(&remote.content(PATH).await.unwrap());
    assert_eq!(stored.videos["a"].notes[0].time_str, "2:05");
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_pending_push() {
    let remote = MemoryRemote::new();
    let (manager, cache) = manager_with(&remote, None, 0).await;

    manager.add_history_entry("a", None, None, None).await.unwrap();
    manager.shutdown().await;
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(remote.write_count(), 0);
    assert!(cache.load().await.unwrap().unwrap().video("a").is_some());
}

/// Delays every fetch so a sync stays in flight.
struct SlowRemote {
    inner: Arc<MemoryRemote>,
    delay: Duration
}

#[async_trait]
impl RemoteObjectStore for SlowRemote {
    async fn fetch_object(&self, path: &str, git_ref: &str) -> Result<FetchOutcome, RemoteError> {
        tokio::time::sleep(self.delay).await;
        self.inner.fetch_object(path, git_ref).await
    }

    async fn write_object(&self, request: WriteRequest) -> Result<WriteOutcome, RemoteError> {
        self.inner.write_object(request).await
    }
}

#[tokio::test(start_paused = true)]
async fn test_second_sync_rejected_while_in_flight() {
    let inner = MemoryRemote::new();
    let slow = Arc::new(SlowRemote {
        inner: inner.clone(),
        delay: Duration::from_secs(1)
    });
    let manager = SyncManager::new(
        memory_cache(),
        Some(slow as Arc<dyn RemoteObjectStore>),
        options(0)
    );
    manager.open().await.unwrap();

    let (first, second) = tokio::join!(manager.sync(), manager.sync());
    assert!(first.is_ok());
    assert!(matches!(second, Err(SyncError::SyncInProgress)));
    assert_eq!(inner.write_count(), 1);

    // the flag is released once the first sync completes
    manager.sync().await.unwrap();
    assert_eq!(inner.write_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_debounced_push_waits_for_running_sync() {
    let inner = MemoryRemote::new();
    let slow = Arc::new(SlowRemote {
        inner: inner.clone(),
        delay: Duration::from_secs(3)
    });
    let manager = SyncManager::new(
        memory_cache(),
        Some(slow as Arc<dyn RemoteObjectStore>),
        options(0)
    );
    manager.open().await.unwrap();

    let syncing = {
        let manager = manager.clone();
        tokio::spawn(async move { manager.sync().await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    manager.add_history_entry("a", None, None, None).await.unwrap();

    syncing.await.unwrap().unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(inner.write_count(), 2);
    let stored = decode_export(&inner.content(PATH).await.unwrap());
    assert!(stored.video("a").is_some());
}
