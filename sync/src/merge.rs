//! Local-biased snapshot merge.
//!
//! `merge` never drops anything the local replica holds. Remote data only
//! fills gaps: unseen history entries, unseen records, missing metadata,
//! read flags and notes. There is no last-write-wins anywhere.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::cmp::Reverse;
use std::collections::HashSet;
use tn_core::types::{HistoryEntry, Note, Snapshot, VideoRecord};

pub fn merge(local: &Snapshot, remote: &Snapshot) -> Snapshot {
    Snapshot {
        watch_history: merge_history(&local.watch_history, &remote.watch_history),
        videos: {
            let mut videos = local.videos.clone();
            for (id, remote_video) in &remote.videos {
                match videos.get_mut(id) {
                    Some(local_video) => enrich(local_video, remote_video),
                    None => {
                        videos.insert(id.clone(), remote_video.clone());
                    }
                }
            }
            videos
        }
    }
}

fn merge_history(local: &[HistoryEntry], remote: &[HistoryEntry]) -> Vec<HistoryEntry> {
    let mut seen = HashSet::new();
    let mut combined: Vec<(DateTime<Utc>, HistoryEntry)> = local
        .iter()
        .chain(remote)
        .filter(|entry| seen.insert(entry.video_id.clone()))
        .map(|entry| (parse_timestamp(&entry.timestamp), entry.clone()))
        .collect();

    combined.sort_by_key(|(at, _)| Reverse(*at));
    combined.into_iter().map(|(_, entry)| entry).collect()
}

fn enrich(local: &mut VideoRecord, remote: &VideoRecord) {
    if remote.has_duration() && !local.has_duration() {
        local.duration = remote.duration;
    }
    if local.duration_str.as_deref().is_none_or(str::is_empty)
        && remote.duration_str.as_deref().is_some_and(|s| !s.is_empty())
    {
        local.duration_str.clone_from(&remote.duration_str);
    }
    if local.title.is_empty() && !remote.title.is_empty() {
        local.title.clone_from(&remote.title);
    }
    if local.channel.is_empty() && !remote.channel.is_empty() {
        local.channel.clone_from(&remote.channel);
    }
    local.read = local.read || remote.read;

    local.notes.extend(remote.notes.iter().cloned());
    normalize_notes(&mut local.notes);
}

/// Dedupes by `(time, text)` keeping the first copy, then orders by time.
fn normalize_notes(notes: &mut Vec<Note>) {
    let mut seen = HashSet::new();
    notes.retain(|note| seen.insert(note.key()));
    notes.sort_by(|a, b| a.time.total_cmp(&b.time));
}

/// Unparsable timestamps sort as the epoch.
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return at.with_timezone(&Utc);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return naive.and_utc();
        }
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_time(chrono::NaiveTime::MIN).and_utc();
    }
    DateTime::UNIX_EPOCH
}
