//! # tubenotes Errors
//!
//! Shared error definitions for the replica engine.
//!
//! - Uses `thiserror` for structured error definitions
//! - Named fields carry the context needed to report the failure
//! - Every enum answers `is_retryable()` so callers can apply one retry policy

use thiserror::Error;

/// Failures reported by a remote object store connector.
///
/// A missing object and a stale version token are not errors: connectors
/// report them as `FetchOutcome::NotFound` and `WriteOutcome::Conflict`.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Authentication failed: {reason}")]
    AuthFailure { reason: String },

    #[error("Access denied to {resource}: {reason}")]
    AccessFailure { resource: String, reason: String },

    #[error("Rate limited: retry after {retry_after}s")]
    RateLimited { retry_after: u64 },

    #[error("Transient network error: {reason}")]
    Transient { reason: String },

    #[error("Remote rejected request with status {status}: {reason}")]
    Rejected { status: u16, reason: String },

    #[error("Malformed remote response: {reason}")]
    Decode { reason: String }
}

impl RemoteError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::RateLimited { .. })
    }

    pub fn retry_after(&self) -> Option<u64> {
        if let Self::RateLimited { retry_after } = self {
            Some(*retry_after)
        } else {
            None
        }
    }

    /// Credential or repository misconfiguration. Fatal to a sync attempt,
    /// never to local editing.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::AuthFailure { .. } | Self::AccessFailure { .. })
    }
}

/// Local snapshot cache errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O failed for key {key}: {reason}")]
    Io { key: String, reason: String },

    #[error("Corrupted cache entry {key}: {reason}")]
    Corrupted { key: String, reason: String },

    #[error("Serialization failed: {reason}")]
    Serialization { reason: String }
}

impl StorageError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

/// Rejected mutation input. Raised before the snapshot is touched.
#[derive(Debug, Error, PartialEq)]
pub enum MutationError {
    #[error("Video id must not be empty")]
    EmptyVideoId,

    #[error("Invalid video id: {video_id}")]
    InvalidVideoId { video_id: String },

    #[error("Note text must not be empty")]
    EmptyNote,

    #[error("Note time must be a non-negative number of seconds, got {time}")]
    InvalidNoteTime { time: f64 },

    #[error("Video not found: {video_id}")]
    UnknownVideo { video_id: String },

    #[error("Note index {index} out of range for video {video_id} ({len} notes)")]
    NoteIndexOutOfRange {
        video_id: String,
        index: usize,
        len: usize
    },

    #[error("Duplicate note at {time_str} for video {video_id}")]
    DuplicateNote { video_id: String, time_str: String }
}

impl MutationError {
    pub fn is_retryable(&self) -> bool {
        false
    }
}
