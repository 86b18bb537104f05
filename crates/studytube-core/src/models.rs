//! Data models for studytube
//!
//! Defines the core data structures: subjects, video records, settings and
//! the aggregate `AppState`. Field names serialize in camelCase so the JSON
//! stays compatible with backups produced by the browser version of the
//! tracker.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::activity::{ActivityLog, ContinueWatching};

/// Milliseconds since the Unix epoch
pub type Timestamp = i64;

/// Current time as a [`Timestamp`]
pub fn now_millis() -> Timestamp {
    Utc::now().timestamp_millis()
}

/// Title used when metadata is unavailable
pub const UNKNOWN_TITLE: &str = "Unknown Video";

/// Author used when metadata is unavailable
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Build the thumbnail URL for a video id
pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{}/mqdefault.jpg", video_id)
}

/// One of the three fixed study subjects
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Physics,
    Chemistry,
    Biology,
}

impl Subject {
    /// All subjects in display order
    pub const ALL: [Subject; 3] = [Subject::Physics, Subject::Chemistry, Subject::Biology];

    /// Lowercase key used in storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::Physics => "physics",
            Subject::Chemistry => "chemistry",
            Subject::Biology => "biology",
        }
    }

    /// Capitalized name for display
    pub fn label(&self) -> &'static str {
        match self {
            Subject::Physics => "Physics",
            Subject::Chemistry => "Chemistry",
            Subject::Biology => "Biology",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returned when a string does not name a subject
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown subject '{0}' (expected physics, chemistry or biology)")]
pub struct UnknownSubject(pub String);

impl FromStr for Subject {
    type Err = UnknownSubject;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "physics" => Ok(Subject::Physics),
            "chemistry" => Ok(Subject::Chemistry),
            "biology" => Ok(Subject::Biology),
            other => Err(UnknownSubject(other.to_string())),
        }
    }
}

/// A tracked video
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    /// 11-character YouTube video id
    pub id: String,
    /// Title from oEmbed metadata
    pub title: String,
    /// Channel name from oEmbed metadata
    pub author: String,
    /// Thumbnail image URL
    pub thumbnail: String,
    /// When the video was added
    pub added_date: Timestamp,
    /// Whether the video has been completed
    pub watched: bool,
    /// Percentage watched, 0 to 100
    pub progress: f64,
    /// Last playback update, if any
    pub last_watched: Option<Timestamp>,
    /// Duration in seconds (0 when unknown)
    pub duration: f64,
    /// Fields this version does not know about, kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VideoRecord {
    /// Create a fresh, unwatched record
    pub fn new(id: impl Into<String>, title: impl Into<String>, author: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            thumbnail: thumbnail_url(&id),
            id,
            title: title.into(),
            author: author.into(),
            added_date: now_millis(),
            watched: false,
            progress: 0.0,
            last_watched: None,
            duration: 0.0,
            extra: Map::new(),
        }
    }

    /// Placeholder used when metadata could not be fetched
    pub fn placeholder(id: impl Into<String>) -> Self {
        Self::new(id, UNKNOWN_TITLE, UNKNOWN_AUTHOR)
    }

    /// Complete a possibly-partial record from an older schema
    ///
    /// Returns `None` when the record has no id. Migrating a complete record
    /// returns it unchanged.
    pub fn migrate(raw: RawVideo) -> Option<Self> {
        let id = raw.id?;
        Some(Self {
            thumbnail: raw.thumbnail.unwrap_or_else(|| thumbnail_url(&id)),
            title: raw.title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            author: raw.author.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            added_date: raw.added_date.unwrap_or_else(now_millis),
            watched: raw.watched.unwrap_or(false),
            progress: raw.progress.unwrap_or(0.0),
            last_watched: raw.last_watched,
            duration: raw.duration.unwrap_or(0.0),
            extra: raw.extra,
            id,
        })
    }

    /// Migrate a list of records, dropping the ones without an id
    pub fn migrate_all(raw: Vec<RawVideo>) -> Vec<Self> {
        raw.into_iter()
            .filter_map(|video| {
                let migrated = Self::migrate(video);
                if migrated.is_none() {
                    warn!("Dropping stored video without an id");
                }
                migrated
            })
            .collect()
    }

    /// Watched far enough to count as started
    pub fn is_started(&self) -> bool {
        self.progress > 5.0
    }

    /// Started but neither finished nor marked watched
    pub fn is_in_progress(&self) -> bool {
        !self.watched && self.progress > 5.0 && self.progress < 95.0
    }

    /// Short human status line
    pub fn status(&self) -> String {
        if self.watched {
            "Completed".to_string()
        } else if self.is_started() {
            format!("{}% watched", self.progress.round() as i64)
        } else {
            "Not started".to_string()
        }
    }
}

/// A stored video as it may appear in older saves or backups
///
/// Every field is optional; [`VideoRecord::migrate`] fills the gaps.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RawVideo {
    pub id: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub thumbnail: Option<String>,
    pub added_date: Option<Timestamp>,
    pub watched: Option<bool>,
    pub progress: Option<f64>,
    pub last_watched: Option<Timestamp>,
    pub duration: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<VideoRecord> for RawVideo {
    fn from(video: VideoRecord) -> Self {
        Self {
            id: Some(video.id),
            title: Some(video.title),
            author: Some(video.author),
            thumbnail: Some(video.thumbnail),
            added_date: Some(video.added_date),
            watched: Some(video.watched),
            progress: Some(video.progress),
            last_watched: video.last_watched,
            duration: Some(video.duration),
            extra: video.extra,
        }
    }
}

/// Per-subject video collections, in stored order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Subjects {
    pub physics: Vec<VideoRecord>,
    pub chemistry: Vec<VideoRecord>,
    pub biology: Vec<VideoRecord>,
}

impl Subjects {
    /// Videos for a subject
    pub fn get(&self, subject: Subject) -> &[VideoRecord] {
        match subject {
            Subject::Physics => &self.physics,
            Subject::Chemistry => &self.chemistry,
            Subject::Biology => &self.biology,
        }
    }

    /// Mutable videos for a subject
    pub fn get_mut(&mut self, subject: Subject) -> &mut Vec<VideoRecord> {
        match subject {
            Subject::Physics => &mut self.physics,
            Subject::Chemistry => &mut self.chemistry,
            Subject::Biology => &mut self.biology,
        }
    }

    /// Iterate over every subject with its videos
    pub fn iter(&self) -> impl Iterator<Item = (Subject, &[VideoRecord])> {
        Subject::ALL.into_iter().map(move |s| (s, self.get(s)))
    }

    /// Total number of tracked videos
    pub fn total(&self) -> usize {
        self.iter().map(|(_, videos)| videos.len()).sum()
    }
}

/// Color theme preference
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// The other theme
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

/// Returned when a string does not name a theme
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown theme '{0}' (expected light or dark)")]
pub struct UnknownTheme(pub String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(UnknownTheme(other.to_string())),
        }
    }
}

/// User settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub theme: Theme,
    /// Save periodically and on exit
    pub auto_save: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            auto_save: true,
        }
    }
}

/// The whole application state
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub subjects: Subjects,
    pub settings: Settings,
    pub recent_activity: ActivityLog,
    pub continue_watching: ContinueWatching,
    /// Unrecognized top-level fields from a save or backup
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawVideo {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_subject_from_str() {
        assert_eq!("physics".parse::<Subject>().unwrap(), Subject::Physics);
        assert_eq!(" Biology ".parse::<Subject>().unwrap(), Subject::Biology);
        assert!("home".parse::<Subject>().is_err());
    }

    #[test]
    fn test_theme_from_str() {
        assert_eq!("Dark".parse::<Theme>(), Ok(Theme::Dark));
        assert_eq!(" light ".parse::<Theme>(), Ok(Theme::Light));

        let err = "blue".parse::<Theme>().unwrap_err();
        assert_eq!(err, UnknownTheme("blue".to_string()));
        assert_eq!(err.to_string(), "Unknown theme 'blue' (expected light or dark)");
    }

    #[test]
    fn test_video_new_defaults() {
        let video = VideoRecord::new("dQw4w9WgXcQ", "Title", "Author");
        assert_eq!(
            video.thumbnail,
            "https://img.youtube.com/vi/dQw4w9WgXcQ/mqdefault.jpg"
        );
        assert!(!video.watched);
        assert_eq!(video.progress, 0.0);
        assert!(video.last_watched.is_none());
        assert_eq!(video.status(), "Not started");
    }

    #[test]
    fn test_placeholder() {
        let video = VideoRecord::placeholder("dQw4w9WgXcQ");
        assert_eq!(video.title, UNKNOWN_TITLE);
        assert_eq!(video.author, UNKNOWN_AUTHOR);
    }

    #[test]
    fn test_migrate_fills_missing_fields() {
        let video = VideoRecord::migrate(raw(json!({
            "id": "dQw4w9WgXcQ",
            "title": "Old save"
        })))
        .unwrap();

        assert_eq!(video.title, "Old save");
        assert_eq!(video.author, UNKNOWN_AUTHOR);
        assert!(!video.watched);
        assert_eq!(video.progress, 0.0);
        assert_eq!(video.duration, 0.0);
        assert!(video.last_watched.is_none());
        assert!(video.added_date > 0);
        assert_eq!(video.thumbnail, thumbnail_url("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_migrate_treats_null_as_missing() {
        let video = VideoRecord::migrate(raw(json!({
            "id": "dQw4w9WgXcQ",
            "progress": null,
            "lastWatched": null
        })))
        .unwrap();
        assert_eq!(video.progress, 0.0);
        assert!(video.last_watched.is_none());
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let once = VideoRecord::migrate(raw(json!({
            "id": "abcdefghijk",
            "progress": 42.5,
            "customField": "kept"
        })))
        .unwrap();
        let twice = VideoRecord::migrate(RawVideo::from(once.clone())).unwrap();
        assert_eq!(once, twice);
        assert_eq!(twice.extra.get("customField"), Some(&json!("kept")));
    }

    #[test]
    fn test_migrate_without_id() {
        assert!(VideoRecord::migrate(raw(json!({ "title": "orphan" }))).is_none());

        let videos = VideoRecord::migrate_all(vec![
            raw(json!({ "title": "orphan" })),
            raw(json!({ "id": "abcdefghijk" })),
        ]);
        assert_eq!(videos.len(), 1);
    }

    #[test]
    fn test_status_line() {
        let mut video = VideoRecord::placeholder("abcdefghijk");
        video.progress = 42.4;
        assert_eq!(video.status(), "42% watched");
        assert!(video.is_in_progress());

        video.watched = true;
        video.progress = 100.0;
        assert_eq!(video.status(), "Completed");
        assert!(!video.is_in_progress());
    }

    #[test]
    fn test_settings_partial_deserialize() {
        let settings: Settings = serde_json::from_value(json!({ "theme": "dark" })).unwrap();
        assert_eq!(settings.theme, Theme::Dark);
        assert!(settings.auto_save);
    }

    #[test]
    fn test_video_serializes_camel_case() {
        let video = VideoRecord::new("abcdefghijk", "T", "A");
        let value = serde_json::to_value(&video).unwrap();
        assert!(value.get("addedDate").is_some());
        assert!(value.get("lastWatched").is_some());
        assert!(value.get("added_date").is_none());
    }
}
