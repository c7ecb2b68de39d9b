use crate::merge::{merge, parse_timestamp};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tn_core::types::{HistoryEntry, Note, Snapshot, VideoRecord};

const IDS: [&str; 6] = ["aaa", "bbb", "ccc", "ddd", "eee", "fff"];

fn timestamp() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u32..28, 0u32..24).prop_map(|(d, h)| format!("2024-02-{:02}T{:02}:00:00.000Z", d + 1, h)),
        Just("garbage".to_string()),
    ]
}

fn note() -> impl Strategy<Value = Note> {
    (0u32..5, prop::sample::select(vec!["intro", "key point", "recap"])).prop_map(|(t, text)| {
        let time = f64::from(t * 30);
        Note {
            time,
            time_str: tn_core::format_note_time(time),
            text: text.to_string(),
            created: "2024-01-01T00:00:00.000Z".to_string()
        }
    })
}

fn record(id: &'static str) -> impl Strategy<Value = VideoRecord> {
    (
        any::<bool>(),
        prop::option::of(1u32..4000),
        prop::sample::select(vec!["", "Title"]),
        prop::collection::vec(note(), 0..4)
    )
        .prop_map(move |(read, duration, title, notes)| VideoRecord {
            read,
            duration: duration.map(f64::from),
            title: title.to_string(),
            notes,
            ..VideoRecord::placeholder(id)
        })
}

fn snapshot() -> impl Strategy<Value = Snapshot> {
    let history = prop::collection::vec((prop::sample::select(IDS.to_vec()), timestamp()), 0..6);
    let videos = prop::collection::vec(
        prop::sample::select(IDS.to_vec())
            .prop_flat_map(|id| record(id).prop_map(move |r| (id, r))),
        0..6
    );
    (history, videos).prop_map(|(history, videos)| Snapshot {
        watch_history: history
            .into_iter()
            .map(|(id, timestamp)| HistoryEntry {
                video_id: id.to_string(),
                timestamp
            })
            .collect(),
        videos: videos
            .into_iter()
            .map(|(id, r)| (id.to_string(), r))
            .collect::<BTreeMap<_, _>>()
    })
}

/// The shape a snapshot has after any merge.
fn normalized(s: &Snapshot) -> Snapshot {
    merge(s, s)
}

proptest! {
    #[test]
    fn test_merge_idempotent(s in snapshot()) {
        let n = normalized(&s);
        prop_assert_eq!(merge(&n, &n), n);
    }

    #[test]
    fn test_merge_with_itself_keeps_the_same_content(s in snapshot()) {
        let merged = merge(&s, &s);

        let ids = |snap: &Snapshot| -> BTreeSet<String> {
            snap.watch_history.iter().map(|h| h.video_id.clone()).collect()
        };
        prop_assert_eq!(ids(&merged), ids(&s));
        prop_assert_eq!(
            merged.videos.keys().collect::<BTreeSet<_>>(),
            s.videos.keys().collect::<BTreeSet<_>>()
        );
        for (id, video) in &s.videos {
            let expected: BTreeSet<_> = video.notes.iter().map(Note::key).collect();
            let actual: BTreeSet<_> = merged.videos[id].notes.iter().map(Note::key).collect();
            prop_assert_eq!(actual, expected);
            prop_assert_eq!(merged.videos[id].read, video.read);
        }
    }

    #[test]
    fn test_merge_keeps_local_history_and_notes(local in snapshot(), remote in snapshot()) {
        let merged = merge(&local, &remote);
        for entry in &local.watch_history {
            prop_assert!(merged.history_entry(&entry.video_id).is_some());
        }
        for (id, video) in &local.videos {
            let merged_video = &merged.videos[id];
            for note in &video.notes {
                prop_assert!(merged_video.has_note(&note.key()));
            }
        }
    }

    #[test]
    fn test_merge_read_monotonic(local in snapshot(), remote in snapshot()) {
        let merged = merge(&local, &remote);
        for (id, video) in local.videos.iter().chain(remote.videos.iter()) {
            if video.read {
                prop_assert!(merged.videos[id].read);
            }
        }
    }

    #[test]
    fn test_merge_history_sorted_and_unique(local in snapshot(), remote in snapshot()) {
        let merged = merge(&local, &remote);
        let times: Vec<_> = merged
            .watch_history
            .iter()
            .map(|h| parse_timestamp(&h.timestamp))
            .collect();
        prop_assert!(times.windows(2).all(|w| w[0] >= w[1]));

        let mut ids: Vec<_> = merged.watch_history.iter().map(|h| h.video_id.clone()).collect();
        let len = ids.len();
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), len);
    }

    #[test]
    fn test_merge_shared_notes_unique(local in snapshot(), remote in snapshot()) {
        let merged = merge(&local, &remote);
        for id in local.videos.keys().filter(|id| remote.videos.contains_key(*id)) {
            let notes = &merged.videos[id].notes;
            let mut keys: Vec<_> = notes.iter().map(Note::key).collect();
            keys.sort();
            keys.dedup();
            prop_assert_eq!(keys.len(), notes.len());
        }
    }
}
