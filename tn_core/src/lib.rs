//! # tubenotes Core
//!
//! Shared types and traits for the replica engine.
//!
//! This crate provides:
//! - The snapshot data model (watch history, video records, notes)
//! - The export document written to the remote store
//! - Seams for the remote object store and the local snapshot cache
//! - Video id extraction and note time formatting

pub mod document;
pub mod note_time;
pub mod remote;
pub mod traits;
pub mod types;
pub mod video_id;

pub use document::{EXPORT_SCHEMA_VERSION, ExportDocument};
pub use note_time::{format_note_time, parse_note_time};
pub use remote::{FetchOutcome, RemoteObject, VersionToken, WriteOutcome, WriteRequest};
pub use traits::{RemoteObjectStore, SnapshotCache, StorageBackend};
pub use types::{HistoryEntry, Note, NoteKey, Snapshot, SnapshotStats, VideoRecord, watch_url};
pub use video_id::{extract_video_id, is_valid_video_id};
