use serde::{Deserialize, Serialize};

/// Progress of the orchestrator through one sync sequence.
///
/// `Idle -> Pulling -> Merging -> Pushing -> Idle` for a full sync,
/// `Merging -> Idle` for a pull, `Idle -> Pushing` for a push. Any busy
/// phase may fall into `Error`, which only leaves back to `Idle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", tag = "phase", content = "message")]
pub enum SyncPhase {
    #[default]
    Idle,
    Pulling,
    Merging,
    Pushing,
    Error(String)
}

impl SyncPhase {
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Pulling | Self::Merging | Self::Pushing)
    }

    pub fn can_transition_to(&self, next: &SyncPhase) -> bool {
        match (self, next) {
            (Self::Idle, Self::Pulling | Self::Pushing) => true,
            (Self::Pulling, Self::Merging) => true,
            (Self::Merging, Self::Pushing | Self::Idle) => true,
            (Self::Pushing, Self::Idle) => true,
            (Self::Pulling | Self::Merging | Self::Pushing, Self::Error(_)) => true,
            (Self::Error(_), Self::Idle) => true,
            _ => false
        }
    }
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Pulling => write!(f, "pulling"),
            Self::Merging => write!(f, "merging"),
            Self::Pushing => write!(f, "pushing"),
            Self::Error(message) => write!(f, "error: {message}")
        }
    }
}
