//! Export wrapper written to the remote store.
//!
//! `version` is informational. Readers accept any value (older, newer or
//! missing) and merge decisions never look at it.

use crate::types::Snapshot;
use serde::{Deserialize, Serialize};

/// Schema label written by this client.
pub const EXPORT_SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    #[serde(default, deserialize_with = "lenient_version")]
    pub version: u32,
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_updated: String,
    #[serde(flatten)]
    pub snapshot: Snapshot
}

impl ExportDocument {
    pub fn new(snapshot: Snapshot, last_updated: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            version: EXPORT_SCHEMA_VERSION,
            last_updated: last_updated.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            snapshot
        }
    }

    /// Two-space indented JSON, the layout stored in the repository.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn into_snapshot(self) -> Snapshot {
        self.snapshot
    }
}

fn lenient_version<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or_default())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_string).unwrap_or_default())
}
