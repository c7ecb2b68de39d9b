use crate::state::SyncPhase;
use errors::{MutationError, RemoteError, StorageError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Rejected mutation: {0}")]
    Mutation(#[from] MutationError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Remote object {path} changed since it was last read")]
    Conflict { path: String },
    #[error("A sync is already in progress")]
    SyncInProgress,
    #[error("Invalid sync transition from {from} to {to}")]
    InvalidTransition { from: SyncPhase, to: SyncPhase },
    #[error("No remote store configured")]
    NoRemote
}

impl SyncError {
    /// Conflicts and transient remote failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Conflict { .. } => true,
            Self::Remote(e) => e.is_retryable(),
            _ => false
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
