use crate::state::SyncPhase;
use serde::Serialize;
use tn_core::remote::VersionToken;
use tn_core::types::SnapshotStats;

/// Status notifications broadcast by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "event")]
pub enum SyncEvent {
    PhaseChanged {
        phase: SyncPhase
    },
    Pulled {
        version: Option<VersionToken>,
        found: bool
    },
    Pushed {
        version: VersionToken
    },
    SyncFailed {
        message: String,
        retryable: bool
    },
    LocalChanged {
        video_id: String,
        stats: SnapshotStats
    }
}

impl SyncEvent {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::SyncFailed { .. })
    }
}
