//! # Replica Sync
//!
//! Reconciles the local snapshot with the remote copy: the merge engine,
//! the mutation API, the debounced push scheduler and the orchestrator that
//! sequences pull, merge and push.

pub mod debounce;
pub mod error;
pub mod events;
pub mod manager;
pub mod merge;
pub mod mutation;
pub mod state;

pub use error::{Result, SyncError};
pub use events::SyncEvent;
pub use manager::{SyncManager, SyncOptions, SyncReport};
pub use merge::merge;
pub use mutation::Mutation;
pub use state::SyncPhase;

#[cfg(test)]
mod proptests;
