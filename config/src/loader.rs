//! # Environment Variable Loader
//!
//! Loads configuration from `TN_*` environment variables. Unset or
//! unparsable variables fall back to the defaults.
//!
//! - `TN_API_URL`, `TN_OWNER`, `TN_REPO`, `TN_BRANCH`, `TN_PATH`, `TN_TOKEN`
//! - `TN_DEBOUNCE_MS`, `TN_MAX_RETRIES`, `TN_INITIAL_BACKOFF_MS`,
//!   `TN_MAX_BACKOFF_MS`, `TN_REQUEST_TIMEOUT_SECS`
//! - `TN_CACHE_DIR`
//! - `TN_LOG_LEVEL`

use crate::config::{CacheConfig, Config, ObservabilityConfig, RemoteConfig, SyncConfig};
use std::env;

pub fn load_from_env() -> Config {
    Config {
        remote: load_remote_from_env(),
        sync: load_sync_from_env(),
        cache: load_cache_from_env(),
        observability: load_observability_from_env()
    }
}

fn load_remote_from_env() -> RemoteConfig {
    let defaults = RemoteConfig::default();
    RemoteConfig {
        api_url: env::var("TN_API_URL").unwrap_or(defaults.api_url),
        owner: env::var("TN_OWNER").unwrap_or(defaults.owner),
        repo: env::var("TN_REPO").unwrap_or(defaults.repo),
        branch: env::var("TN_BRANCH").unwrap_or(defaults.branch),
        path: env::var("TN_PATH").unwrap_or(defaults.path),
        token: env::var("TN_TOKEN").ok().filter(|t| !t.is_empty())
    }
}

fn load_sync_from_env() -> SyncConfig {
    let defaults = SyncConfig::default();
    SyncConfig {
        debounce_ms: parse_env("TN_DEBOUNCE_MS").unwrap_or(defaults.debounce_ms),
        max_retries: parse_env("TN_MAX_RETRIES").unwrap_or(defaults.max_retries),
        initial_backoff_ms: parse_env("TN_INITIAL_BACKOFF_MS")
            .unwrap_or(defaults.initial_backoff_ms),
        max_backoff_ms: parse_env("TN_MAX_BACKOFF_MS").unwrap_or(defaults.max_backoff_ms),
        request_timeout_secs: parse_env("TN_REQUEST_TIMEOUT_SECS")
            .unwrap_or(defaults.request_timeout_secs)
    }
}

fn load_cache_from_env() -> CacheConfig {
    CacheConfig {
        dir: env::var("TN_CACHE_DIR").unwrap_or_else(|_| CacheConfig::default().dir)
    }
}

fn load_observability_from_env() -> ObservabilityConfig {
    ObservabilityConfig {
        log_level: env::var("TN_LOG_LEVEL")
            .unwrap_or_else(|_| ObservabilityConfig::default().log_level)
    }
}

fn parse_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr
{
    let raw = env::var(key).ok()?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparsable environment variable");
            None
        }
    }
}
