use tn_core::document::ExportDocument;
use tn_core::note_time::format_note_time;
use tn_core::types::{HistoryEntry, Note, Snapshot, VideoRecord};

/// Fluent snapshot construction for tests.
///
/// Videos are appended to the history in call order, so add the most
/// recent one first to keep the history sorted.
#[derive(Debug, Default, Clone)]
pub struct SnapshotBuilder {
    snapshot: Snapshot
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn video(mut self, video_id: &str, timestamp: &str) -> Self {
        self.snapshot.watch_history.push(HistoryEntry {
            video_id: video_id.to_string(),
            timestamp: timestamp.to_string()
        });
        self.snapshot.videos.insert(
            video_id.to_string(),
            VideoRecord::new(video_id, video_id, "", timestamp)
        );
        self
    }

    pub fn titled(mut self, video_id: &str, title: &str) -> Self {
        self.record(video_id).title = title.to_string();
        self
    }

    pub fn read(mut self, video_id: &str) -> Self {
        self.record(video_id).read = true;
        self
    }

    pub fn note(mut self, video_id: &str, time: f64, text: &str) -> Self {
        let notes = &mut self.record(video_id).notes;
        notes.push(Note {
            time,
            time_str: format_note_time(time),
            text: text.to_string(),
            created: "2024-01-01T00:00:00.000Z".to_string()
        });
        notes.sort_by(|a, b| a.time.total_cmp(&b.time));
        self
    }

    fn record(&mut self, video_id: &str) -> &mut VideoRecord {
        self.snapshot
            .videos
            .entry(video_id.to_string())
            .or_insert_with(|| VideoRecord::placeholder(video_id))
    }

    pub fn build(self) -> Snapshot {
        self.snapshot
    }

    /// Export document JSON as stored remotely.
    pub fn export_json(self) -> String {
        let doc = ExportDocument {
            version: tn_core::EXPORT_SCHEMA_VERSION,
            last_updated: "2024-01-01T00:00:00.000Z".to_string(),
            snapshot: self.snapshot
        };
        doc.to_pretty_json().unwrap_or_default()
    }
}

/// Decodes an export document, panicking on malformed input.
pub fn decode_export(raw: &str) -> Snapshot {
    match ExportDocument::from_json(raw) {
        Ok(doc) => doc.into_snapshot(),
        Err(e) => panic!("invalid export document: {e}")
    }
}
