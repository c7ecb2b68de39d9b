use async_trait::async_trait;
use chrono::{DateTime, Utc};
use errors::StorageError;
use std::sync::Arc;
use tn_core::traits::{SnapshotCache, StorageBackend};
use tn_core::types::Snapshot;

/// Cache key holding the serialized snapshot.
pub const DATA_KEY: &str = "yt-notes-data";

/// Cache key holding the RFC 3339 time of the last successful push.
pub const LAST_SYNC_KEY: &str = "yt-notes-last-sync";

/// [`SnapshotCache`] over any key-value [`StorageBackend`].
pub struct KvSnapshotCache<S: StorageBackend> {
    storage: Arc<S>
}

impl<S: StorageBackend> KvSnapshotCache<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}

fn backend_error(key: &str, e: impl std::fmt::Display) -> StorageError {
    StorageError::Io {
        key: key.to_string(),
        reason: e.to_string()
    }
}

#[async_trait]
impl<S: StorageBackend> SnapshotCache for KvSnapshotCache<S>
where
    S::Error: std::fmt::Display + Send
{
    async fn load(&self) -> Result<Option<Snapshot>, StorageError> {
        let Some(data) = self
            .storage
            .retrieve(DATA_KEY)
            .await
            .map_err(|e| backend_error(DATA_KEY, e))?
        else {
            return Ok(None);
        };

        let snapshot = serde_json::from_slice(&data).map_err(|e| StorageError::Corrupted {
            key: DATA_KEY.to_string(),
            reason: e.to_string()
        })?;
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let data = serde_json::to_vec(snapshot).map_err(|e| StorageError::Serialization {
            reason: e.to_string()
        })?;
        self.storage
            .store(DATA_KEY, &data)
            .await
            .map_err(|e| backend_error(DATA_KEY, e))
    }

    async fn last_sync(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        let Some(data) = self
            .storage
            .retrieve(LAST_SYNC_KEY)
            .await
            .map_err(|e| backend_error(LAST_SYNC_KEY, e))?
        else {
            return Ok(None);
        };

        let raw = String::from_utf8_lossy(&data);
        match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(at) => Ok(Some(at.with_timezone(&Utc))),
            Err(e) => {
                tracing::warn!(
                    key = LAST_SYNC_KEY,
                    error = %e,
                    "Ignoring unreadable last-sync marker"
                );
                Ok(None)
            }
        }
    }

    async fn record_sync(&self, at: DateTime<Utc>) -> Result<(), StorageError> {
        self.storage
            .store(LAST_SYNC_KEY, at.to_rfc3339().as_bytes())
            .await
            .map_err(|e| backend_error(LAST_SYNC_KEY, e))
    }
}
