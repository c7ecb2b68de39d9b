//! # Storage Layer
//!
//! Key-value backends for the local cache (file, in-memory) and the
//! snapshot cache built on top of them.

pub mod file;
pub mod memory;
pub mod snapshot_cache;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use snapshot_cache::{DATA_KEY, KvSnapshotCache, LAST_SYNC_KEY};
