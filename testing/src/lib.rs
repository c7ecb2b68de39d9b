//! Shared test fixtures for the tubenotes workspace.
//!
//! - [`MemoryRemote`]: in-memory compare-and-swap object store with hooks to
//!   inject concurrent writes and failures
//! - [`SnapshotBuilder`]: terse construction of snapshots
//! - [`memory_cache`]: snapshot cache over in-memory storage

mod builders;
mod fixtures;

pub use builders::*;
pub use fixtures::*;
