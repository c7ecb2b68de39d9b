use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Root aggregate: everything one user has watched and noted.
///
/// Decoding never fails on a single bad field. Missing or wrongly-typed
/// fields fall back to their defaults, non-object history entries and video
/// records are dropped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default, deserialize_with = "lenient::history")]
    pub watch_history: Vec<HistoryEntry>,
    #[serde(default, deserialize_with = "lenient::videos")]
    pub videos: BTreeMap<String, VideoRecord>
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(default, deserialize_with = "lenient::field")]
    pub video_id: String,
    #[serde(default, deserialize_with = "lenient::field")]
    pub timestamp: String
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    #[serde(default, deserialize_with = "lenient::field")]
    pub video_id: String,
    #[serde(default, deserialize_with = "lenient::field")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::field")]
    pub channel: String,
    #[serde(default, deserialize_with = "lenient::field")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient::field")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "lenient::field")]
    pub read: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::field"
    )]
    pub duration: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::field"
    )]
    pub duration_str: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub notes: Vec<Note>,
    /// Fields written by other clients that this version does not know.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(default, deserialize_with = "lenient::field")]
    pub time: f64,
    #[serde(default, deserialize_with = "lenient::field")]
    pub time_str: String,
    #[serde(default, deserialize_with = "lenient::field")]
    pub text: String,
    #[serde(default, deserialize_with = "lenient::field")]
    pub created: String
}

/// Identity of a note within one video: `(time, text)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteKey {
    time_bits: u64,
    text: String
}

impl Note {
    pub fn key(&self) -> NoteKey {
        // -0.0 and 0.0 are the same position in the video
        let time = if self.time == 0.0 { 0.0 } else { self.time };
        NoteKey {
            time_bits: time.to_bits(),
            text: self.text.clone()
        }
    }
}

/// Canonical watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://youtube.com/watch?v={video_id}")
}

impl VideoRecord {
    pub fn new(video_id: &str, title: &str, channel: &str, timestamp: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            title: title.to_string(),
            channel: channel.to_string(),
            url: watch_url(video_id),
            timestamp: timestamp.to_string(),
            ..Self::default()
        }
    }

    /// Bare record created when a note or read flag targets an unknown video.
    pub fn placeholder(video_id: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            ..Self::default()
        }
    }

    pub fn has_duration(&self) -> bool {
        self.duration.is_some_and(|d| d > 0.0)
    }

    pub fn has_note(&self, key: &NoteKey) -> bool {
        self.notes.iter().any(|n| &n.key() == key)
    }
}

/// Counters shown by status displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStats {
    pub watched: usize,
    pub unread: usize,
    pub with_notes: usize,
    pub total_notes: usize
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.watch_history.is_empty() && self.videos.is_empty()
    }

    pub fn history_entry(&self, video_id: &str) -> Option<&HistoryEntry> {
        self.watch_history.iter().find(|h| h.video_id == video_id)
    }

    pub fn video(&self, video_id: &str) -> Option<&VideoRecord> {
        self.videos.get(video_id)
    }

    pub fn stats(&self) -> SnapshotStats {
        let mut stats = SnapshotStats {
            watched: self.watch_history.len(),
            ..SnapshotStats::default()
        };

        for entry in &self.watch_history {
            match self.videos.get(&entry.video_id) {
                Some(video) => {
                    if !video.notes.is_empty() {
                        stats.with_notes += 1;
                    }
                    if !video.read {
                        stats.unread += 1;
                    }
                }
                None => stats.unread += 1
            }
        }

        stats.total_notes = self.videos.values().map(|v| v.notes.len()).sum();
        stats
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

mod lenient {
    use super::*;

    pub fn field<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default
    {
        let value = Value::deserialize(deserializer)?;
        Ok(serde_json::from_value(value).unwrap_or_default())
    }

    pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned
    {
        let Value::Array(items) = Value::deserialize(deserializer)? else {
            return Ok(Vec::new());
        };
        Ok(items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect())
    }

    pub fn history<'de, D>(deserializer: D) -> Result<Vec<HistoryEntry>, D::Error>
    where
        D: Deserializer<'de>
    {
        let entries: Vec<HistoryEntry> = list(deserializer)?;
        Ok(entries
            .into_iter()
            .filter(|h| !h.video_id.is_empty())
            .collect())
    }

    pub fn videos<'de, D>(deserializer: D) -> Result<BTreeMap<String, VideoRecord>, D::Error>
    where
        D: Deserializer<'de>
    {
        let Value::Object(map) = Value::deserialize(deserializer)? else {
            return Ok(BTreeMap::new());
        };
        Ok(map
            .into_iter()
            .filter(|(_, value)| value.is_object())
            .filter_map(|(key, value)| {
                let mut record: VideoRecord = serde_json::from_value(value).ok()?;
                if record.video_id.is_empty() {
                    record.video_id = key.clone();
                }
                Some((key, record))
            })
            .collect())
    }
}
