//! Core traits for the replica engine

use crate::remote::{FetchOutcome, WriteOutcome, WriteRequest};
use crate::types::Snapshot;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use errors::{RemoteError, StorageError};

/// Durable key-value storage for the local cache
#[async_trait]
pub trait StorageBackend: Send + Sync {
    type Error;

    async fn store(&self, key: &str, value: &[u8]) -> Result<(), Self::Error>;

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error>;

    async fn delete(&self, key: &str) -> Result<(), Self::Error>;

    async fn exists(&self, key: &str) -> Result<bool, Self::Error>;
}

/// Versioned blob store holding the canonical snapshot.
///
/// Implementations own authentication and transport. The engine only sees
/// the outcomes below.
#[async_trait]
pub trait RemoteObjectStore: Send + Sync {
    async fn fetch_object(&self, path: &str, git_ref: &str) -> Result<FetchOutcome, RemoteError>;

    async fn write_object(&self, request: WriteRequest) -> Result<WriteOutcome, RemoteError>;
}

/// Last-known snapshot plus the last successful sync time.
#[async_trait]
pub trait SnapshotCache: Send + Sync {
    async fn load(&self) -> Result<Option<Snapshot>, StorageError>;

    async fn save(&self, snapshot: &Snapshot) -> Result<(), StorageError>;

    async fn last_sync(&self) -> Result<Option<DateTime<Utc>>, StorageError>;

    async fn record_sync(&self, at: DateTime<Utc>) -> Result<(), StorageError>;
}
