//! # Configuration System
//!
//! Centralized configuration management for the tubenotes replica engine.
//!
//! This crate provides:
//! - Configuration structures for the remote store, sync engine, local cache
//!   and logging
//! - Environment variable loading (`TN_*`)
//! - Configuration file loading (TOML/YAML)
//! - Configuration precedence (env > file > defaults)
//! - Configuration validation

pub mod config;
pub mod file_loader;
pub mod loader;
pub mod precedence;
pub mod validation;

pub use config::{CacheConfig, Config, ObservabilityConfig, RemoteConfig, SyncConfig};
pub use file_loader::{ConfigFileError, load_from_file, load_from_toml, load_from_yaml};
pub use loader::load_from_env;
pub use precedence::merge_configs;
pub use validation::{ConfigError, validate_config};
pub use validator::Validate;
