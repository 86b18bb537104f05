//! Loading, saving, exporting and importing the state blob
//!
//! Saved state and backups share one JSON shape. Reading either goes
//! through [`PersistedState`], where every top-level field is optional, and
//! is then shallow-merged onto a base state: defaults on load, the current
//! state on import. Videos are migrated on the way in so saves written by
//! older versions keep working.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::activity::{ActivityEntry, ActivityLog, ContinueWatching, ContinueWatchingEntry};
use crate::models::{AppState, RawVideo, Settings, Subject, Subjects, VideoRecord};
use crate::storage::error::{ImportError, StorageResult};
use crate::storage::persistence::StateStore;

/// Format version written into backups
pub const EXPORT_VERSION: &str = "1.0";

/// Keys that describe a backup rather than the state
const EXPORT_METADATA_KEYS: [&str; 2] = ["exportDate", "version"];

/// Subjects as stored, before migration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSubjects {
    pub physics: Option<Vec<RawVideo>>,
    pub chemistry: Option<Vec<RawVideo>>,
    pub biology: Option<Vec<RawVideo>>,
}

impl RawSubjects {
    fn get(&self, subject: Subject) -> Option<&Vec<RawVideo>> {
        match subject {
            Subject::Physics => self.physics.as_ref(),
            Subject::Chemistry => self.chemistry.as_ref(),
            Subject::Biology => self.biology.as_ref(),
        }
    }

    /// Migrate every subject; absent subjects become empty
    pub fn migrate(self) -> Subjects {
        Subjects {
            physics: VideoRecord::migrate_all(self.physics.unwrap_or_default()),
            chemistry: VideoRecord::migrate_all(self.chemistry.unwrap_or_default()),
            biology: VideoRecord::migrate_all(self.biology.unwrap_or_default()),
        }
    }
}

/// A saved state or backup with every top-level field optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersistedState {
    pub subjects: Option<RawSubjects>,
    pub settings: Option<Settings>,
    /// Kept raw so one unreadable entry does not fail the whole blob
    pub recent_activity: Option<Vec<Value>>,
    pub continue_watching: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PersistedState {
    /// Shallow-merge onto `base`
    ///
    /// Subjects are always replaced (migrated, missing ones empty); other
    /// fields replace the base only when present.
    pub fn merge_onto(self, mut base: AppState) -> AppState {
        base.subjects = self.subjects.unwrap_or_default().migrate();
        if let Some(settings) = self.settings {
            base.settings = settings;
        }
        if let Some(activity) = self.recent_activity {
            let entries: Vec<ActivityEntry> = readable_entries(activity, "activity");
            base.recent_activity = ActivityLog::from(entries);
        }
        if let Some(entries) = self.continue_watching {
            let entries: Vec<ContinueWatchingEntry> = readable_entries(entries, "continue-watching");
            base.continue_watching = ContinueWatching::from(entries);
        }
        for (key, value) in self.extra {
            if !EXPORT_METADATA_KEYS.contains(&key.as_str()) {
                base.extra.insert(key, value);
            }
        }
        base
    }
}

/// Decode each entry on its own, dropping the ones that don't parse
fn readable_entries<T: DeserializeOwned>(values: Vec<Value>, kind: &str) -> Vec<T> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Dropping unreadable {} entry: {}", kind, e);
                None
            }
        })
        .collect()
}

/// Parse a blob, requiring a JSON object at the top level
fn parse_object(text: &str) -> Result<Map<String, Value>, ImportError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        _ => Err(ImportError::NotAnObject),
    }
}

/// Parse a blob read from storage
pub fn parse_state(text: &str) -> Result<PersistedState, ImportError> {
    let map = parse_object(text)?;
    Ok(serde_json::from_value(Value::Object(map))?)
}

/// Parse a backup, requiring both `subjects` and `settings`
pub fn parse_backup(text: &str) -> Result<PersistedState, ImportError> {
    let map = parse_object(text)?;
    for key in ["subjects", "settings"] {
        if map.get(key).map_or(true, Value::is_null) {
            return Err(ImportError::MissingKey(key));
        }
    }
    Ok(serde_json::from_value(Value::Object(map))?)
}

/// Load state from a store
///
/// Missing, unreadable or malformed data leaves the defaults in place;
/// corrupt data is never partially applied.
pub fn load_state<S: StateStore>(store: &S) -> AppState {
    let text = match store.read() {
        Ok(Some(text)) => text,
        Ok(None) => {
            debug!("No saved state, starting with defaults");
            return AppState::default();
        }
        Err(e) => {
            warn!("Failed to read saved state: {}", e);
            return AppState::default();
        }
    };

    match parse_state(&text) {
        Ok(persisted) => {
            let state = persisted.merge_onto(AppState::default());
            info!("Loaded state with {} videos", state.subjects.total());
            state
        }
        Err(e) => {
            warn!("Failed to load state: {}", e);
            AppState::default()
        }
    }
}

/// Serialize the state into a store
pub fn save_state<S: StateStore>(store: &mut S, state: &AppState) -> StorageResult<()> {
    let text = serde_json::to_string(state)?;
    store.write(&text)?;
    debug!("Saved state ({} bytes)", text.len());
    Ok(())
}

/// A backup: the state plus export metadata
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument<'a> {
    #[serde(flatten)]
    pub state: &'a AppState,
    pub export_date: String,
    pub version: &'static str,
}

impl<'a> ExportDocument<'a> {
    pub fn new(state: &'a AppState, now: DateTime<Utc>) -> Self {
        Self {
            state,
            export_date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            version: EXPORT_VERSION,
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// File name for a backup taken on `date`
pub fn export_file_name(date: NaiveDate) -> String {
    format!(
        "youtube-learning-tracker-backup-{}.json",
        date.format("%Y-%m-%d")
    )
}

/// Replace the state with a backup's contents
///
/// On error the state is left exactly as it was.
pub fn apply_backup(state: &mut AppState, text: &str) -> Result<(), ImportError> {
    let persisted = parse_backup(text)?;
    let current = std::mem::take(state);
    *state = persisted.merge_onto(current);
    info!("Imported backup with {} videos", state.subjects.total());
    Ok(())
}

/// Summary of a backup, for confirming before import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPreview {
    pub export_date: Option<String>,
    pub counts: Vec<(Subject, usize)>,
}

impl BackupPreview {
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }
}

/// Validate a backup and summarize it without applying it
pub fn preview_backup(text: &str) -> Result<BackupPreview, ImportError> {
    let persisted = parse_backup(text)?;
    let export_date = persisted
        .extra
        .get("exportDate")
        .and_then(Value::as_str)
        .map(str::to_string);
    let subjects = persisted.subjects.unwrap_or_default();
    let counts = Subject::ALL
        .into_iter()
        .map(|s| (s, subjects.get(s).map_or(0, Vec::len)))
        .collect();
    Ok(BackupPreview {
        export_date,
        counts,
    })
}
