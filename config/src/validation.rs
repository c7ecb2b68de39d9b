//! # Configuration Validation
//!
//! Range checks come from the `validator` derives on each section. Remote
//! operations additionally need an owner and a token.

use crate::config::Config;
use validator::Validate;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),

    #[error("Missing remote setting {field}: set it in the config file or TN_{}", .field.to_uppercase())]
    MissingRemote { field: &'static str },

    #[error("Invalid configuration: {reason}")]
    Inconsistent { reason: String }
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    config.validate()?;
    if config.sync.initial_backoff_ms > config.sync.max_backoff_ms {
        return Err(ConfigError::Inconsistent {
            reason: format!(
                "sync.initial_backoff_ms ({}) exceeds sync.max_backoff_ms ({})",
                config.sync.initial_backoff_ms, config.sync.max_backoff_ms
            )
        });
    }
    Ok(())
}

impl Config {
    /// Fails unless the remote owner and token are both present.
    pub fn require_remote(&self) -> Result<(), ConfigError> {
        if self.remote.owner.is_empty() {
            return Err(ConfigError::MissingRemote { field: "owner" });
        }
        if self.remote.token.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::MissingRemote { field: "token" });
        }
        Ok(())
    }
}
