//! # Configuration Precedence
//!
//! Merges configuration from multiple sources. A field from a higher source
//! wins only when it differs from the built-in default.
//!
//! # Precedence Order
//! 1. Environment variables (highest priority)
//! 2. Configuration file
//! 3. Default values (lowest priority)

use crate::config::{CacheConfig, Config, ObservabilityConfig, RemoteConfig, SyncConfig};

pub fn merge_configs(defaults: Config, file_config: Option<Config>, env_config: Config) -> Config {
    let mut config = defaults;

    if let Some(file) = file_config {
        config = merge_with_logging(config, &file, "file");
    }
    merge_with_logging(config, &env_config, "env")
}

fn merge_with_logging(mut base: Config, override_config: &Config, source_name: &str) -> Config {
    let mut changes = Vec::new();

    merge_remote(&mut base.remote, &override_config.remote, &mut changes);
    merge_sync(&mut base.sync, &override_config.sync, &mut changes);
    merge_cache(&mut base.cache, &override_config.cache, &mut changes);
    merge_observability(
        &mut base.observability,
        &override_config.observability,
        &mut changes
    );

    if !changes.is_empty() {
        tracing::info!("Configuration from {}: {:?}", source_name, changes);
    }

    base
}

fn merge_string(
    field: &str,
    base: &mut String,
    candidate: &str,
    default: &str,
    changes: &mut Vec<String>
) {
    if candidate != default && candidate != base.as_str() {
        changes.push(format!("{field} = {candidate}"));
        candidate.clone_into(base);
    }
}

fn merge_number<T>(field: &str, base: &mut T, candidate: T, default: T, changes: &mut Vec<String>)
where
    T: PartialEq + Copy + std::fmt::Display
{
    if candidate != default && candidate != *base {
        changes.push(format!("{field} = {candidate}"));
        *base = candidate;
    }
}

fn merge_remote(
    base: &mut RemoteConfig,
    override_config: &RemoteConfig,
    changes: &mut Vec<String>
) {
    let defaults = RemoteConfig::default();
    merge_string(
        "remote.api_url",
        &mut base.api_url,
        &override_config.api_url,
        &defaults.api_url,
        changes
    );
    merge_string(
        "remote.owner",
        &mut base.owner,
        &override_config.owner,
        &defaults.owner,
        changes
    );
    merge_string(
        "remote.repo",
        &mut base.repo,
        &override_config.repo,
        &defaults.repo,
        changes
    );
    merge_string(
        "remote.branch",
        &mut base.branch,
        &override_config.branch,
        &defaults.branch,
        changes
    );
    merge_string(
        "remote.path",
        &mut base.path,
        &override_config.path,
        &defaults.path,
        changes
    );
    if override_config.token.is_some() && override_config.token != base.token {
        changes.push("remote.token = ***".to_string());
        base.token.clone_from(&override_config.token);
    }
}

fn merge_sync(base: &mut SyncConfig, override_config: &SyncConfig, changes: &mut Vec<String>) {
    let defaults = SyncConfig::default();
    merge_number(
        "sync.debounce_ms",
        &mut base.debounce_ms,
        override_config.debounce_ms,
        defaults.debounce_ms,
        changes
    );
    merge_number(
        "sync.max_retries",
        &mut base.max_retries,
        override_config.max_retries,
        defaults.max_retries,
        changes
    );
    merge_number(
        "sync.initial_backoff_ms",
        &mut base.initial_backoff_ms,
        override_config.initial_backoff_ms,
        defaults.initial_backoff_ms,
        changes
    );
    merge_number(
        "sync.max_backoff_ms",
        &mut base.max_backoff_ms,
        override_config.max_backoff_ms,
        defaults.max_backoff_ms,
        changes
    );
    merge_number(
        "sync.request_timeout_secs",
        &mut base.request_timeout_secs,
        override_config.request_timeout_secs,
        defaults.request_timeout_secs,
        changes
    );
}

fn merge_cache(base: &mut CacheConfig, override_config: &CacheConfig, changes: &mut Vec<String>) {
    merge_string(
        "cache.dir",
        &mut base.dir,
        &override_config.dir,
        &CacheConfig::default().dir,
        changes
    );
}

fn merge_observability(
    base: &mut ObservabilityConfig,
    override_config: &ObservabilityConfig,
    changes: &mut Vec<String>
) {
    merge_string(
        "observability.log_level",
        &mut base.log_level,
        &override_config.log_level,
        &ObservabilityConfig::default().log_level,
        changes
    );
}
