//! Wires configuration, the local cache and the GitHub connector into a
//! `SyncManager` for one command invocation.

use adapters::GithubContentStore;
use anyhow::{Context, Result};
use config::Config;
use std::path::Path;
use std::sync::Arc;
use storage::{FileStorage, KvSnapshotCache};
use sync::{SyncManager, SyncOptions};
use tn_core::traits::RemoteObjectStore;

/// Defaults, then the config file, then `TN_*` variables.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let file = path
        .map(config::load_from_file)
        .transpose()
        .context("Failed to load config file")?;
    let merged = config::merge_configs(Config::default(), file, config::load_from_env());
    config::validate_config(&merged)?;
    Ok(merged)
}

pub struct Runtime {
    pub config: Config,
    pub manager: SyncManager,
    pub github: Option<Arc<GithubContentStore>>,
    pub offline: bool
}

impl Runtime {
    pub async fn open(config: Config, offline: bool) -> Result<Self> {
        let storage = FileStorage::open(&config.cache.dir)
            .await
            .with_context(|| format!("Failed to open cache directory {}", config.cache.dir))?;
        let cache = Arc::new(KvSnapshotCache::new(Arc::new(storage)));

        let github = if offline {
            None
        } else if let Err(e) = config.require_remote() {
            tracing::debug!(reason = %e, "Remote not configured; running local only");
            None
        } else {
            Some(Arc::new(GithubContentStore::from_config(
                &config.remote,
                &config.sync
            )?))
        };

        let remote = github
            .clone()
            .map(|g| g as Arc<dyn RemoteObjectStore>);
        let manager = SyncManager::new(
            cache,
            remote,
            SyncOptions::from_config(&config.remote, &config.sync)
        );
        manager.open().await?;

        Ok(Self {
            config,
            manager,
            github,
            offline
        })
    }

    pub fn remote_label(&self) -> String {
        let remote = &self.config.remote;
        format!(
            "{}/{}@{}:{}",
            remote.owner, remote.repo, remote.branch, remote.path
        )
    }
}
