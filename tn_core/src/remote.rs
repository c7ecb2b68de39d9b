use serde::{Deserialize, Serialize};

/// Optimistic-concurrency token of a remote object (a blob sha for git
/// backed stores).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VersionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    pub content: String,
    pub version: VersionToken
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Found(RemoteObject),
    /// The object does not exist yet. Bootstrap case, not a failure.
    NotFound
}

impl FetchOutcome {
    pub fn version(&self) -> Option<&VersionToken> {
        match self {
            Self::Found(object) => Some(&object.version),
            Self::NotFound => None
        }
    }
}

/// Compare-and-swap write. `expected_version` is `None` only when creating
/// the object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    pub path: String,
    pub content: String,
    pub expected_version: Option<VersionToken>,
    pub branch: String,
    pub message: String
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(VersionToken),
    /// `expected_version` no longer matches the stored object.
    Conflict
}
