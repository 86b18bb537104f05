//! The video library
//!
//! `Library` owns the application state and the store it is persisted to.
//! Every mutating operation updates the in-memory state, appends activity
//! where appropriate, and writes the state back. A failed write never rolls
//! the mutation back; the error is kept for the front end to report via
//! [`Library::take_save_error`].
//!
//! ## Usage
//!
//! ```ignore
//! let mut library = Library::open(FileStore::from_config(&config));
//!
//! let summary = library
//!     .add_videos(&links, Subject::Physics, &lookup, |_| {})
//!     .await;
//!
//! library.update_progress(Subject::Physics, "dQw4w9WgXcQ", 42.0, 84.0);
//! let view = library.sorted_videos(Subject::Physics);
//! ```

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::activity::{ActivityData, ActivityEntry, ActivityKind, ContinueWatchingEntry};
use crate::metadata::{fetch_video_record, VideoLookup};
use crate::models::{now_millis, AppState, Subject, Theme, VideoRecord};
use crate::progress::{self, ContinueCandidate, ProgressOutcome, SubjectStats};
use crate::storage::{
    apply_backup, load_state, save_state, ExportDocument, ImportError, StateStore, StorageError,
    StorageResult, STORAGE_BUDGET_BYTES,
};
use crate::video_id::extract_video_id;

/// Number of entries in the recent activity view
pub const RECENT_ACTIVITY_LIMIT: usize = 10;

/// Outcome of a bulk add
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddSummary {
    pub added: usize,
    pub duplicates: usize,
    pub invalid: usize,
    /// One message per link that could not be parsed
    pub errors: Vec<String>,
}

impl AddSummary {
    /// One-line summary for display
    pub fn message(&self, subject: Subject) -> String {
        let mut message = format!("Added {} new videos to {}.", self.added, subject);
        if self.duplicates > 0 {
            message.push_str(&format!(" Skipped {} duplicates.", self.duplicates));
        }
        if self.invalid > 0 {
            message.push_str(&format!(" {} invalid links.", self.invalid));
        }
        message
    }
}

/// Progress through a bulk add
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddProgress {
    pub processed: usize,
    pub total: usize,
}

impl AddProgress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.processed as f64 / self.total as f64 * 100.0
        }
    }
}

/// How much of the storage budget the saved state uses
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageUsage {
    pub bytes: usize,
    pub budget: usize,
}

impl StorageUsage {
    pub fn percent(&self) -> f64 {
        (self.bytes as f64 / self.budget as f64 * 100.0).min(100.0)
    }
}

/// Application state plus the store it lives in
pub struct Library<S: StateStore> {
    state: AppState,
    store: S,
    last_save_error: Option<StorageError>,
}

impl<S: StateStore> Library<S> {
    /// Open a library, loading whatever the store holds
    ///
    /// Missing or corrupt data yields an empty library.
    pub fn open(store: S) -> Self {
        let state = load_state(&store);
        Self {
            state,
            store,
            last_save_error: None,
        }
    }

    /// Current state
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Videos of a subject in stored order
    pub fn videos(&self, subject: Subject) -> &[VideoRecord] {
        self.state.subjects.get(subject)
    }

    /// Find a video by id within a subject
    pub fn find(&self, subject: Subject, video_id: &str) -> Option<&VideoRecord> {
        self.videos(subject).iter().find(|v| v.id == video_id)
    }

    // ==================== Video Operations ====================

    /// Add videos from a batch of links
    ///
    /// Links are trimmed and processed one at a time in input order.
    /// Unparseable links count as invalid; repeated links and ids already
    /// in the subject count as duplicates. New videos are inserted at the
    /// head of the subject. `on_progress` is called after every link.
    pub async fn add_videos<L, F>(
        &mut self,
        links: &[String],
        subject: Subject,
        lookup: &L,
        mut on_progress: F,
    ) -> AddSummary
    where
        L: VideoLookup,
        F: FnMut(AddProgress),
    {
        let mut summary = AddSummary::default();

        let mut unique: Vec<&str> = Vec::new();
        for link in links.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
            if unique.contains(&link) {
                summary.duplicates += 1;
            } else {
                unique.push(link);
            }
        }

        let total = unique.len();
        for (index, link) in unique.into_iter().enumerate() {
            match extract_video_id(link) {
                None => {
                    summary.invalid += 1;
                    summary.errors.push(format!("Invalid link: {}", link));
                }
                Some(video_id) if self.find(subject, &video_id).is_some() => {
                    debug!("Skipping duplicate {} in {}", video_id, subject);
                    summary.duplicates += 1;
                }
                Some(video_id) => {
                    let video = fetch_video_record(lookup, &video_id).await;
                    let title = video.title.clone();
                    self.state.subjects.get_mut(subject).insert(0, video);
                    self.state.recent_activity.push(ActivityEntry::new(
                        ActivityKind::VideoAdded,
                        ActivityData::video(subject, title),
                    ));
                    summary.added += 1;
                }
            }

            on_progress(AddProgress {
                processed: index + 1,
                total,
            });
            tokio::task::yield_now().await;
        }

        info!(
            "Added {} videos to {} ({} duplicates, {} invalid)",
            summary.added, subject, summary.duplicates, summary.invalid
        );
        self.persist();
        summary
    }

    /// Remove a video from a subject
    ///
    /// Returns `false` if it was not there.
    pub fn remove_video(&mut self, subject: Subject, video_id: &str) -> bool {
        let videos = self.state.subjects.get_mut(subject);
        let before = videos.len();
        videos.retain(|v| v.id != video_id);
        if videos.len() == before {
            return false;
        }
        self.state.continue_watching.remove(video_id, subject);
        self.persist();
        true
    }

    // ==================== Playback ====================

    /// Record that playback of a video started
    ///
    /// Puts the video at the head of the continue-watching ring. Returns
    /// `None` if the video is not in the subject.
    pub fn start_playback(&mut self, subject: Subject, video_id: &str) -> Option<VideoRecord> {
        let video = self.find(subject, video_id)?.clone();
        self.state
            .continue_watching
            .record(ContinueWatchingEntry::from_video(&video, subject));
        self.persist();
        Some(video)
    }

    /// Apply a playback telemetry sample
    ///
    /// Unknown videos are a silent no-op; the sample may arrive after the
    /// video was removed.
    pub fn update_progress(
        &mut self,
        subject: Subject,
        video_id: &str,
        raw_percent: f64,
        current_time: f64,
    ) -> ProgressOutcome {
        let outcome = progress::apply_progress(
            &mut self.state,
            subject,
            video_id,
            raw_percent,
            current_time,
            now_millis(),
        );
        match outcome {
            ProgressOutcome::Updated { completed, .. } => {
                if completed {
                    info!("Completed {} in {}", video_id, subject);
                }
                self.persist();
            }
            ProgressOutcome::NotFound => {
                debug!("Ignoring progress for unknown video {} in {}", video_id, subject);
            }
            ProgressOutcome::Ignored => {
                debug!("Ignoring unusable progress sample for {}", video_id);
            }
        }
        outcome
    }

    /// Mark a video as completed and move it to the end of its subject
    ///
    /// Returns `false` if the video is not in the subject.
    pub fn mark_as_watched(&mut self, subject: Subject, video_id: &str) -> bool {
        let found = progress::mark_watched(&mut self.state, subject, video_id, now_millis());
        if found {
            self.persist();
        }
        found
    }

    // ==================== Navigation & Settings ====================

    /// Record that the user opened a subject
    pub fn navigate(&mut self, subject: Subject) {
        self.state.recent_activity.push(ActivityEntry::new(
            ActivityKind::SubjectChanged,
            ActivityData::subject(subject),
        ));
        self.persist();
    }

    /// Change the theme
    pub fn set_theme(&mut self, theme: Theme) {
        self.state.settings.theme = theme;
        self.record_settings_change();
    }

    /// Switch between light and dark, returning the new theme
    pub fn toggle_theme(&mut self) -> Theme {
        let theme = self.state.settings.theme.toggled();
        self.set_theme(theme);
        theme
    }

    /// Turn periodic saving on or off
    pub fn set_auto_save(&mut self, enabled: bool) {
        self.state.settings.auto_save = enabled;
        self.record_settings_change();
    }

    fn record_settings_change(&mut self) {
        self.state.recent_activity.push(ActivityEntry::new(
            ActivityKind::SettingsUpdated,
            ActivityData::default(),
        ));
        self.persist();
    }

    // ==================== Views ====================

    /// A subject's videos in display order
    pub fn sorted_videos(&self, subject: Subject) -> Vec<&VideoRecord> {
        progress::sort_for_display(self.videos(subject))
    }

    /// In-progress videos across subjects, most recent first
    pub fn continue_watching(&self) -> Vec<ContinueCandidate<'_>> {
        progress::continue_watching(&self.state)
    }

    /// Newest activity entries, newest first
    pub fn recent_activity(&self) -> Vec<&ActivityEntry> {
        self.state.recent_activity.recent(RECENT_ACTIVITY_LIMIT)
    }

    /// Number of videos still to watch in a subject
    pub fn unwatched_count(&self, subject: Subject) -> usize {
        self.videos(subject).iter().filter(|v| !v.watched).count()
    }

    /// Completion figures per subject
    pub fn stats(&self) -> Vec<SubjectStats> {
        progress::subject_stats(&self.state)
    }

    /// Size of the saved state against the storage budget
    pub fn storage_usage(&self) -> StorageUsage {
        StorageUsage {
            bytes: self.store.size(),
            budget: STORAGE_BUDGET_BYTES,
        }
    }

    // ==================== Persistence ====================

    /// Save now, reporting failure to the caller
    pub fn save(&mut self) -> StorageResult<()> {
        save_state(&mut self.store, &self.state)
    }

    /// Save if autosave is on; `None` when it is off
    ///
    /// Used by the periodic timer and on shutdown.
    pub fn autosave(&mut self) -> Option<StorageResult<()>> {
        if !self.state.settings.auto_save {
            return None;
        }
        Some(self.save())
    }

    /// The most recent failed write, if any, clearing it
    pub fn take_save_error(&mut self) -> Option<StorageError> {
        self.last_save_error.take()
    }

    /// Build a backup of the current state
    pub fn export(&self) -> ExportDocument<'_> {
        ExportDocument::new(&self.state, Utc::now())
    }

    /// Replace the state with a backup
    ///
    /// A rejected backup leaves the state and the store untouched.
    pub fn import(&mut self, text: &str) -> Result<(), ImportError> {
        apply_backup(&mut self.state, text)?;
        self.persist();
        Ok(())
    }

    fn persist(&mut self) {
        match save_state(&mut self.store, &self.state) {
            Ok(()) => self.last_save_error = None,
            Err(e) => {
                warn!("Failed to save state: {}", e);
                self.last_save_error = Some(e);
            }
        }
    }
}
