//! # Configuration Structures
//!
//! All configuration structures use `serde` for loading and `validator` for
//! range checks. Every field has a default so partial files are accepted.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Top-level configuration.
///
/// ## Fields
/// - `remote`: where the canonical snapshot lives and how to reach it
/// - `sync`: debounce and retry behaviour of the orchestrator
/// - `cache`: location of the local snapshot cache
/// - `observability`: log filter
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    #[validate(nested)]
    pub remote: RemoteConfig,

    #[serde(default)]
    #[validate(nested)]
    pub sync: SyncConfig,

    #[serde(default)]
    #[validate(nested)]
    pub cache: CacheConfig,

    #[serde(default)]
    #[validate(nested)]
    pub observability: ObservabilityConfig
}

impl Config {
    /// True when enough is configured to talk to the remote store.
    pub fn has_remote(&self) -> bool {
        !self.remote.owner.is_empty() && self.remote.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Remote object store location.
///
/// The snapshot is stored at `{owner}/{repo}:{branch}/{path}` behind a
/// contents API rooted at `api_url`.
#[derive(Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct RemoteConfig {
    #[serde(default = "default_api_url")]
    #[validate(length(min = 1, max = 2048))]
    pub api_url: String,

    /// Repository owner. Empty until the user configures it.
    #[serde(default)]
    #[validate(length(max = 100))]
    pub owner: String,

    #[serde(default = "default_repo")]
    #[validate(length(min = 1, max = 100))]
    pub repo: String,

    #[serde(default = "default_branch")]
    #[validate(length(min = 1, max = 255))]
    pub branch: String,

    #[serde(default = "default_path")]
    #[validate(length(min = 1, max = 1024))]
    pub path: String,

    /// Bearer credential passed to the connector.
    #[serde(default)]
    pub token: Option<String>
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_repo() -> String {
    "clodcode".to_string()
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_path() -> String {
    "youtube/data.json".to_string()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            owner: String::new(),
            repo: default_repo(),
            branch: default_branch(),
            path: default_path(),
            token: None
        }
    }
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("api_url", &self.api_url)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("path", &self.path)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Orchestrator timing.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct SyncConfig {
    /// Quiet period after the last local edit before pushing
    #[serde(default = "default_debounce_ms")]
    #[validate(range(max = 600_000))]
    pub debounce_ms: u64,

    /// Retries after the first attempt for retryable failures
    #[serde(default = "default_max_retries")]
    #[validate(range(max = 10))]
    pub max_retries: u32,

    #[serde(default = "default_initial_backoff_ms")]
    #[validate(range(min = 1, max = 60_000))]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    #[validate(range(min = 1, max = 600_000))]
    pub max_backoff_ms: u64,

    #[serde(default = "default_request_timeout_secs")]
    #[validate(range(min = 1, max = 300))]
    pub request_timeout_secs: u64
}

fn default_debounce_ms() -> u64 {
    2000
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    10_000
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            request_timeout_secs: default_request_timeout_secs()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct CacheConfig {
    /// Directory holding the cache keys
    #[serde(default = "default_cache_dir")]
    #[validate(length(min = 1, max = 4096))]
    pub dir: String
}

fn default_cache_dir() -> String {
    ".tubenotes".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    #[validate(custom(function = "validate_log_level"))]
    pub log_level: String
}

fn default_log_level() -> String {
    "info".to_string()
}

fn validate_log_level(value: &str) -> Result<(), validator::ValidationError> {
    match value {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(validator::ValidationError::new("Invalid log level"))
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level()
        }
    }
}
