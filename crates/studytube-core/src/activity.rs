//! Activity log and continue-watching ring
//!
//! Both are bounded recency windows persisted with the rest of the state.
//! The activity log evicts from the head (oldest first); the
//! continue-watching ring inserts at the head and evicts from the tail.

use std::collections::VecDeque;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::models::{now_millis, Subject, Timestamp, VideoRecord};

/// Maximum number of retained activity entries
pub const ACTIVITY_LOG_CAPACITY: usize = 50;

/// Maximum number of continue-watching entries
pub const CONTINUE_WATCHING_CAPACITY: usize = 10;

/// What happened
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    VideoAdded,
    VideoCompleted,
    VideoWatched,
    SubjectChanged,
    SettingsUpdated,
}

/// Free-form context attached to an activity
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ActivityData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ActivityData {
    /// Context naming a subject and a video title
    pub fn video(subject: Subject, title: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.to_string()),
            title: Some(title.into()),
            extra: Map::new(),
        }
    }

    /// Context naming only a subject
    pub fn subject(subject: Subject) -> Self {
        Self {
            subject: Some(subject.to_string()),
            ..Self::default()
        }
    }
}

/// A single activity log entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityEntry {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    #[serde(default)]
    pub data: ActivityData,
    pub timestamp: Timestamp,
}

impl ActivityEntry {
    pub fn new(kind: ActivityKind, data: ActivityData) -> Self {
        Self {
            kind,
            data,
            timestamp: now_millis(),
        }
    }

    /// Human-readable description
    pub fn message(&self) -> String {
        let title = self.data.title.as_deref().unwrap_or("");
        let subject = self.data.subject.as_deref().unwrap_or("");
        match self.kind {
            ActivityKind::VideoAdded => format!("Added \"{}\" to {}", title, subject),
            ActivityKind::VideoCompleted => format!("Completed \"{}\" in {}", title, subject),
            ActivityKind::VideoWatched => format!("Watched \"{}\" in {}", title, subject),
            ActivityKind::SubjectChanged => format!("Opened {}", subject),
            ActivityKind::SettingsUpdated => "Settings updated".to_string(),
        }
    }
}

/// Format the distance between `timestamp` and `now` as "N units ago"
pub fn time_ago(timestamp: Timestamp, now: Timestamp) -> String {
    const UNITS: [(&str, i64); 7] = [
        ("year", 31_536_000),
        ("month", 2_592_000),
        ("week", 604_800),
        ("day", 86_400),
        ("hour", 3_600),
        ("minute", 60),
        ("second", 1),
    ];

    let seconds = (now - timestamp) / 1000;
    for (unit, size) in UNITS {
        let count = seconds / size;
        if count >= 1 {
            let plural = if count == 1 { "" } else { "s" };
            return format!("{} {}{} ago", count, unit, plural);
        }
    }
    "just now".to_string()
}

/// Bounded activity log, oldest first
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "Vec<ActivityEntry>")]
pub struct ActivityLog(VecDeque<ActivityEntry>);

impl ActivityLog {
    /// Append an entry, evicting the oldest beyond capacity
    pub fn push(&mut self, entry: ActivityEntry) {
        self.0.push_back(entry);
        self.truncate();
    }

    /// Drop the oldest entries until within capacity
    pub fn truncate(&mut self) {
        while self.0.len() > ACTIVITY_LOG_CAPACITY {
            self.0.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ActivityEntry> {
        self.0.iter()
    }

    /// The `limit` newest entries, newest first
    pub fn recent(&self, limit: usize) -> Vec<&ActivityEntry> {
        let mut entries: Vec<&ActivityEntry> = self.0.iter().rev().collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(limit);
        entries
    }
}

impl From<Vec<ActivityEntry>> for ActivityLog {
    fn from(entries: Vec<ActivityEntry>) -> Self {
        let mut log = Self(entries.into());
        log.truncate();
        log
    }
}

/// A video the user started playing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContinueWatchingEntry {
    #[serde(rename = "id")]
    pub video_id: String,
    pub subject: Subject,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub thumbnail: String,
    /// A NaN progress is stored as `null`
    #[serde(default, deserialize_with = "null_as_default")]
    pub progress: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_watched: Timestamp,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl ContinueWatchingEntry {
    pub fn from_video(video: &VideoRecord, subject: Subject) -> Self {
        Self {
            video_id: video.id.clone(),
            subject,
            title: video.title.clone(),
            thumbnail: video.thumbnail.clone(),
            progress: video.progress,
            last_watched: now_millis(),
        }
    }
}

/// Bounded recency ring of started videos, newest first
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "Vec<ContinueWatchingEntry>")]
pub struct ContinueWatching(VecDeque<ContinueWatchingEntry>);

impl ContinueWatching {
    /// Insert at the head, replacing any entry for the same video and subject
    pub fn record(&mut self, entry: ContinueWatchingEntry) {
        self.0
            .retain(|e| !(e.video_id == entry.video_id && e.subject == entry.subject));
        self.0.push_front(entry);
        self.truncate();
    }

    /// Drop entries from the tail until within capacity
    pub fn truncate(&mut self) {
        while self.0.len() > CONTINUE_WATCHING_CAPACITY {
            self.0.pop_back();
        }
    }

    /// Forget a video in a subject
    pub fn remove(&mut self, video_id: &str, subject: Subject) {
        self.0
            .retain(|e| !(e.video_id == video_id && e.subject == subject));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries newest first
    pub fn iter(&self) -> impl Iterator<Item = &ContinueWatchingEntry> {
        self.0.iter()
    }
}

impl From<Vec<ContinueWatchingEntry>> for ContinueWatching {
    fn from(entries: Vec<ContinueWatchingEntry>) -> Self {
        let mut ring = Self(entries.into());
        ring.truncate();
        ring
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_at(kind: ActivityKind, title: &str, timestamp: Timestamp) -> ActivityEntry {
        ActivityEntry {
            kind,
            data: ActivityData::video(Subject::Physics, title),
            timestamp,
        }
    }

    fn ring_entry(id: &str, subject: Subject) -> ContinueWatchingEntry {
        let video = VideoRecord::new(id, format!("Video {}", id), "Author");
        ContinueWatchingEntry::from_video(&video, subject)
    }

    #[test]
    fn test_activity_log_evicts_oldest() {
        let mut log = ActivityLog::default();
        for i in 0..=ACTIVITY_LOG_CAPACITY {
            log.push(entry_at(ActivityKind::VideoAdded, &format!("v{}", i), i as i64));
        }

        assert_eq!(log.len(), ACTIVITY_LOG_CAPACITY);
        let titles: Vec<_> = log
            .iter()
            .filter_map(|e| e.data.title.clone())
            .collect();
        assert!(!titles.contains(&"v0".to_string()));
        assert!(titles.contains(&"v50".to_string()));
    }

    #[test]
    fn test_activity_log_from_oversized_vec() {
        let entries = (0..60)
            .map(|i| entry_at(ActivityKind::VideoAdded, "x", i))
            .collect::<Vec<_>>();
        let log = ActivityLog::from(entries);
        assert_eq!(log.len(), ACTIVITY_LOG_CAPACITY);
        assert_eq!(log.iter().next().unwrap().timestamp, 10);
    }

    #[test]
    fn test_activity_log_deserialize_enforces_capacity() {
        let entries = (0..60)
            .map(|i| entry_at(ActivityKind::VideoAdded, "x", i))
            .collect::<Vec<_>>();
        let json = serde_json::to_string(&entries).unwrap();

        let log: ActivityLog = serde_json::from_str(&json).unwrap();

        assert_eq!(log.len(), ACTIVITY_LOG_CAPACITY);
        assert_eq!(log.iter().next().unwrap().timestamp, 10);
        // still written as a plain array
        assert!(serde_json::to_value(&log).unwrap().is_array());
    }

    #[test]
    fn test_recent_is_newest_first() {
        let mut log = ActivityLog::default();
        log.push(entry_at(ActivityKind::VideoAdded, "old", 100));
        log.push(entry_at(ActivityKind::VideoCompleted, "new", 300));
        log.push(entry_at(ActivityKind::VideoAdded, "mid", 200));

        let recent = log.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].data.title.as_deref(), Some("new"));
        assert_eq!(recent[1].data.title.as_deref(), Some("mid"));
    }

    #[test]
    fn test_activity_serialization_shape() {
        let entry = entry_at(ActivityKind::VideoCompleted, "Optics", 5);
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "video_completed");
        assert_eq!(value["data"]["subject"], "physics");
        assert_eq!(value["data"]["title"], "Optics");
    }

    #[test]
    fn test_activity_message() {
        let entry = entry_at(ActivityKind::VideoAdded, "Optics", 0);
        assert_eq!(entry.message(), "Added \"Optics\" to physics");
    }

    #[test]
    fn test_time_ago() {
        assert_eq!(time_ago(0, 500), "just now");
        assert_eq!(time_ago(0, 1_000), "1 second ago");
        assert_eq!(time_ago(0, 180_000), "3 minutes ago");
        assert_eq!(time_ago(0, 86_400_000), "1 day ago");
    }

    #[test]
    fn test_continue_watching_dedup_moves_to_head() {
        let mut ring = ContinueWatching::default();
        ring.record(ring_entry("aaaaaaaaaaa", Subject::Physics));
        ring.record(ring_entry("bbbbbbbbbbb", Subject::Physics));
        ring.record(ring_entry("aaaaaaaaaaa", Subject::Physics));

        assert_eq!(ring.len(), 2);
        assert_eq!(ring.iter().next().unwrap().video_id, "aaaaaaaaaaa");
    }

    #[test]
    fn test_continue_watching_same_id_other_subject() {
        let mut ring = ContinueWatching::default();
        ring.record(ring_entry("aaaaaaaaaaa", Subject::Physics));
        ring.record(ring_entry("aaaaaaaaaaa", Subject::Biology));
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn test_continue_watching_capacity() {
        let mut ring = ContinueWatching::default();
        for i in 0..12 {
            ring.record(ring_entry(&format!("video{:06}", i), Subject::Chemistry));
        }

        assert_eq!(ring.len(), CONTINUE_WATCHING_CAPACITY);
        let ids: Vec<_> = ring.iter().map(|e| e.video_id.clone()).collect();
        assert_eq!(ids[0], "video000011");
        assert!(!ids.contains(&"video000000".to_string()));
        assert!(!ids.contains(&"video000001".to_string()));
    }

    #[test]
    fn test_continue_watching_deserialize_enforces_capacity() {
        let entries = (0..12)
            .map(|i| ring_entry(&format!("video{:06}", i), Subject::Physics))
            .collect::<Vec<_>>();
        let json = serde_json::to_string(&entries).unwrap();

        let ring: ContinueWatching = serde_json::from_str(&json).unwrap();

        assert_eq!(ring.len(), CONTINUE_WATCHING_CAPACITY);
        assert_eq!(ring.iter().next().unwrap().video_id, "video000000");
    }

    #[test]
    fn test_continue_watching_entry_null_numbers() {
        let entry: ContinueWatchingEntry = serde_json::from_value(serde_json::json!({
            "id": "aaaaaaaaaaa",
            "subject": "physics",
            "title": "Optics",
            "thumbnail": "https://img.youtube.com/vi/aaaaaaaaaaa/mqdefault.jpg",
            "progress": null,
            "lastWatched": null
        }))
        .unwrap();

        assert_eq!(entry.progress, 0.0);
        assert_eq!(entry.last_watched, 0);
        assert_eq!(entry.title, "Optics");
    }

    #[test]
    fn test_continue_watching_serializes_id_key() {
        let entry = ring_entry("aaaaaaaaaaa", Subject::Physics);
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["id"], "aaaaaaaaaaa");
        assert!(value.get("lastWatched").is_some());
    }
}
