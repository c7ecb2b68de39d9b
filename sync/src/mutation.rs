//! Record-level edits of a snapshot.
//!
//! `apply` validates first and works on a copy, so a rejected mutation
//! leaves the caller's snapshot untouched.

use chrono::{DateTime, SecondsFormat, Utc};
use errors::MutationError;
use serde::{Deserialize, Serialize};
use tn_core::note_time::format_note_time;
use tn_core::types::{HistoryEntry, Note, Snapshot, VideoRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum Mutation {
    AddHistoryEntry {
        video_id: String,
        title: Option<String>,
        channel: Option<String>,
        note: Option<String>
    },
    SetRead {
        video_id: String,
        read: bool
    },
    ToggleRead {
        video_id: String
    },
    AddNote {
        video_id: String,
        text: String,
        time: f64
    },
    DeleteNote {
        video_id: String,
        index: usize
    },
    DeleteVideo {
        video_id: String
    }
}

impl Mutation {
    pub fn video_id(&self) -> &str {
        match self {
            Self::AddHistoryEntry { video_id, .. }
            | Self::SetRead { video_id, .. }
            | Self::ToggleRead { video_id }
            | Self::AddNote { video_id, .. }
            | Self::DeleteNote { video_id, .. }
            | Self::DeleteVideo { video_id } => video_id
        }
    }

    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddHistoryEntry { .. } => "add_history_entry",
            Self::SetRead { .. } => "set_read",
            Self::ToggleRead { .. } => "toggle_read",
            Self::AddNote { .. } => "add_note",
            Self::DeleteNote { .. } => "delete_note",
            Self::DeleteVideo { .. } => "delete_video"
        }
    }
}

fn iso(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn validate_video_id(video_id: &str) -> Result<(), MutationError> {
    if video_id.trim().is_empty() {
        return Err(MutationError::EmptyVideoId);
    }
    if video_id.chars().any(|c| c.is_whitespace() || c.is_control() || c == '/') {
        return Err(MutationError::InvalidVideoId {
            video_id: video_id.to_string()
        });
    }
    Ok(())
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

pub fn apply(
    snapshot: &Snapshot,
    mutation: &Mutation,
    now: DateTime<Utc>
) -> Result<Snapshot, MutationError> {
    let video_id = mutation.video_id();
    validate_video_id(video_id)?;

    let mut next = snapshot.clone();
    match mutation {
        Mutation::AddHistoryEntry {
            title,
            channel,
            note,
            ..
        } => {
            let at = iso(now);
            if next.history_entry(video_id).is_none() {
                next.watch_history.insert(
                    0,
                    HistoryEntry {
                        video_id: video_id.to_string(),
                        timestamp: at.clone()
                    }
                );
            }
            let record = next.videos.entry(video_id.to_string()).or_insert_with(|| {
                VideoRecord::new(
                    video_id,
                    non_empty(title.as_ref()).unwrap_or(video_id),
                    non_empty(channel.as_ref()).unwrap_or_default(),
                    &at
                )
            });
            if let Some(text) = non_empty(note.as_ref()) {
                let note = Note {
                    time: 0.0,
                    time_str: format_note_time(0.0),
                    text: text.to_string(),
                    created: at
                };
                // re-sharing the same note is idempotent
                if !record.has_note(&note.key()) {
                    insert_sorted(&mut record.notes, note);
                }
            }
        }
        Mutation::SetRead { read, .. } => {
            record_mut(&mut next, video_id).read = *read;
        }
        Mutation::ToggleRead { .. } => {
            let record = record_mut(&mut next, video_id);
            record.read = !record.read;
        }
        Mutation::AddNote { text, time, .. } => {
            let text = text.trim();
            if text.is_empty() {
                return Err(MutationError::EmptyNote);
            }
            if !time.is_finite() || *time < 0.0 {
                return Err(MutationError::InvalidNoteTime { time: *time });
            }
            let note = Note {
                time: *time,
                time_str: format_note_time(*time),
                text: text.to_string(),
                created: iso(now)
            };
            let record = record_mut(&mut next, video_id);
            if record.has_note(&note.key()) {
                return Err(MutationError::DuplicateNote {
                    video_id: video_id.to_string(),
                    time_str: note.time_str
                });
            }
            insert_sorted(&mut record.notes, note);
        }
        Mutation::DeleteNote { index, .. } => {
            let record = next
                .videos
                .get_mut(video_id)
                .ok_or_else(|| MutationError::UnknownVideo {
                    video_id: video_id.to_string()
                })?;
            if *index >= record.notes.len() {
                return Err(MutationError::NoteIndexOutOfRange {
                    video_id: video_id.to_string(),
                    index: *index,
                    len: record.notes.len()
                });
            }
            record.notes.remove(*index);
        }
        Mutation::DeleteVideo { .. } => {
            let had_record = next.videos.remove(video_id).is_some();
            let before = next.watch_history.len();
            next.watch_history.retain(|h| h.video_id != video_id);
            if !had_record && before == next.watch_history.len() {
                return Err(MutationError::UnknownVideo {
                    video_id: video_id.to_string()
                });
            }
        }
    }

    Ok(next)
}

fn record_mut<'a>(snapshot: &'a mut Snapshot, video_id: &str) -> &'a mut VideoRecord {
    snapshot
        .videos
        .entry(video_id.to_string())
        .or_insert_with(|| VideoRecord::placeholder(video_id))
}

/// Keeps notes ordered by time; equal times keep insertion order.
fn insert_sorted(notes: &mut Vec<Note>, note: Note) {
    let at = notes.partition_point(|n| n.time <= note.time);
    notes.insert(at, note);
}
