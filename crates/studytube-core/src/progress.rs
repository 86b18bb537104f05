//! Progress engine
//!
//! Turns playback telemetry into per-video progress, decides completion and
//! reordering, and derives the display views. Everything here operates on
//! an `AppState` passed in by the caller; persistence is the caller's job.

use std::cmp::Ordering;

use crate::activity::{ActivityData, ActivityEntry, ActivityKind};
use crate::models::{AppState, Subject, Timestamp, VideoRecord};

/// Progress above which a video counts as started
pub const STARTED_THRESHOLD: f64 = 5.0;

/// Progress at which a video is completed automatically
pub const COMPLETION_THRESHOLD: f64 = 95.0;

/// Number of entries in the continue-watching view
pub const CONTINUE_WATCHING_LIMIT: usize = 6;

/// Result of applying one telemetry sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressOutcome {
    /// The video is not in the subject (removed, or a stale tick)
    NotFound,
    /// The sample carried no usable percentage
    Ignored,
    Updated {
        /// Stored progress after the update
        progress: f64,
        /// This sample completed the video
        completed: bool,
        /// The video moved to the head of its subject
        moved_to_front: bool,
    },
}

impl ProgressOutcome {
    pub fn is_update(&self) -> bool {
        matches!(self, ProgressOutcome::Updated { .. })
    }

    pub fn completed(&self) -> bool {
        matches!(self, ProgressOutcome::Updated { completed: true, .. })
    }
}

/// Apply a telemetry sample to a video
///
/// `raw_percent` is `current_time / duration * 100` as reported by the
/// player; it may exceed 100. Progress never decreases and a watched video
/// stays at 100.
pub fn apply_progress(
    state: &mut AppState,
    subject: Subject,
    video_id: &str,
    raw_percent: f64,
    current_time: f64,
    now: Timestamp,
) -> ProgressOutcome {
    let videos = state.subjects.get_mut(subject);
    let Some(index) = videos.iter().position(|v| v.id == video_id) else {
        return ProgressOutcome::NotFound;
    };

    if !raw_percent.is_finite() {
        return ProgressOutcome::Ignored;
    }

    let sample = raw_percent.clamp(0.0, 100.0);
    let video = &mut videos[index];
    if !video.watched {
        video.progress = video.progress.max(sample);
    }
    video.last_watched = Some(now);
    if raw_percent > 0.0 && current_time.is_finite() && current_time > 0.0 {
        video.duration = current_time * 100.0 / raw_percent;
    }

    let mut completed = false;
    if raw_percent >= COMPLETION_THRESHOLD && !video.watched {
        video.watched = true;
        video.progress = 100.0;
        completed = true;
    }
    let progress = video.progress;
    let title = video.title.clone();

    let moved_to_front = raw_percent > STARTED_THRESHOLD && raw_percent < COMPLETION_THRESHOLD;
    if moved_to_front {
        let video = videos.remove(index);
        videos.insert(0, video);
    }

    if completed {
        state.recent_activity.push(ActivityEntry::new(
            ActivityKind::VideoCompleted,
            ActivityData::video(subject, title),
        ));
    }

    ProgressOutcome::Updated {
        progress,
        completed,
        moved_to_front,
    }
}

/// Mark a video as completed and sink it to the end of its subject
///
/// Returns `false` when the video is not in the subject.
pub fn mark_watched(state: &mut AppState, subject: Subject, video_id: &str, now: Timestamp) -> bool {
    let videos = state.subjects.get_mut(subject);
    let Some(index) = videos.iter().position(|v| v.id == video_id) else {
        return false;
    };

    let mut video = videos.remove(index);
    video.watched = true;
    video.progress = 100.0;
    video.last_watched = Some(now);
    let title = video.title.clone();
    videos.push(video);

    state.recent_activity.push(ActivityEntry::new(
        ActivityKind::VideoCompleted,
        ActivityData::video(subject, title),
    ));
    true
}

/// Order a subject's videos for display
///
/// Unwatched before watched; started before not started; then most
/// recently watched first. Watched videos keep their stored order.
pub fn sort_for_display(videos: &[VideoRecord]) -> Vec<&VideoRecord> {
    let mut sorted: Vec<&VideoRecord> = videos.iter().collect();
    sorted.sort_by(|a, b| display_order(a, b));
    sorted
}

fn display_order(a: &VideoRecord, b: &VideoRecord) -> Ordering {
    match (a.watched, b.watched) {
        (false, true) => return Ordering::Less,
        (true, false) => return Ordering::Greater,
        (true, true) => return Ordering::Equal,
        (false, false) => {}
    }

    b.is_started()
        .cmp(&a.is_started())
        .then_with(|| b.last_watched.unwrap_or(0).cmp(&a.last_watched.unwrap_or(0)))
}

/// A video surfaced in the continue-watching view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContinueCandidate<'a> {
    pub subject: Subject,
    pub video: &'a VideoRecord,
}

/// In-progress videos across all subjects, most recently watched first
pub fn continue_watching(state: &AppState) -> Vec<ContinueCandidate<'_>> {
    let mut candidates: Vec<ContinueCandidate<'_>> = state
        .subjects
        .iter()
        .flat_map(|(subject, videos)| {
            videos
                .iter()
                .filter(|v| v.is_in_progress())
                .map(move |video| ContinueCandidate { subject, video })
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.video
            .last_watched
            .unwrap_or(0)
            .cmp(&a.video.last_watched.unwrap_or(0))
    });
    candidates.truncate(CONTINUE_WATCHING_LIMIT);
    candidates
}

/// Completion figures for one subject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubjectStats {
    pub subject: Subject,
    pub total: usize,
    pub watched: usize,
    /// Rounded percentage of videos watched
    pub percent: u32,
}

impl SubjectStats {
    pub fn unwatched(&self) -> usize {
        self.total - self.watched
    }
}

/// Per-subject completion figures, in subject order
pub fn subject_stats(state: &AppState) -> Vec<SubjectStats> {
    state
        .subjects
        .iter()
        .map(|(subject, videos)| {
            let total = videos.len();
            let watched = videos.iter().filter(|v| v.watched).count();
            let percent = if total > 0 {
                ((watched as f64 / total as f64) * 100.0).round() as u32
            } else {
                0
            };
            SubjectStats {
                subject,
                total,
                watched,
                percent,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str) -> VideoRecord {
        VideoRecord::new(id, format!("Video {}", id), "Author")
    }

    fn state_with(subject: Subject, ids: &[&str]) -> AppState {
        let mut state = AppState::default();
        *state.subjects.get_mut(subject) = ids.iter().map(|id| video(id)).collect();
        state
    }

    fn ids(state: &AppState, subject: Subject) -> Vec<String> {
        state.subjects.get(subject).iter().map(|v| v.id.clone()).collect()
    }

    #[test]
    fn test_in_progress_moves_to_front() {
        let mut state = state_with(Subject::Physics, &["A", "B", "C"]);

        let outcome = apply_progress(&mut state, Subject::Physics, "B", 50.0, 30.0, 1_000);

        assert_eq!(ids(&state, Subject::Physics), vec!["B", "A", "C"]);
        assert_eq!(
            outcome,
            ProgressOutcome::Updated {
                progress: 50.0,
                completed: false,
                moved_to_front: true
            }
        );
        let b = &state.subjects.physics[0];
        assert_eq!(b.last_watched, Some(1_000));
        assert_eq!(b.duration, 60.0);
    }

    #[test]
    fn test_mark_watched_sinks_to_end() {
        let mut state = state_with(Subject::Physics, &["A", "B", "C"]);

        assert!(mark_watched(&mut state, Subject::Physics, "A", 2_000));

        assert_eq!(ids(&state, Subject::Physics), vec!["B", "C", "A"]);
        let a = &state.subjects.physics[2];
        assert!(a.watched);
        assert_eq!(a.progress, 100.0);
        assert_eq!(a.last_watched, Some(2_000));
        assert_eq!(state.recent_activity.len(), 1);
    }

    #[test]
    fn test_small_progress_keeps_position() {
        let mut state = state_with(Subject::Physics, &["A", "B", "C"]);
        let outcome = apply_progress(&mut state, Subject::Physics, "C", 3.0, 3.0, 1);
        assert_eq!(ids(&state, Subject::Physics), vec!["A", "B", "C"]);
        assert!(outcome.is_update());
        assert_eq!(state.subjects.physics[2].progress, 3.0);
    }

    #[test]
    fn test_completion_threshold() {
        let mut state = state_with(Subject::Chemistry, &["A", "B"]);

        let outcome = apply_progress(&mut state, Subject::Chemistry, "B", 95.0, 95.0, 1);

        assert!(outcome.completed());
        let b = &state.subjects.chemistry[1];
        assert!(b.watched);
        assert_eq!(b.progress, 100.0);
        // completion does not reorder
        assert_eq!(ids(&state, Subject::Chemistry), vec!["A", "B"]);
        let entry = state.recent_activity.iter().next().unwrap();
        assert_eq!(entry.kind, ActivityKind::VideoCompleted);
        assert_eq!(entry.data.subject.as_deref(), Some("chemistry"));
    }

    #[test]
    fn test_completion_is_one_way() {
        let mut state = state_with(Subject::Biology, &["A"]);
        apply_progress(&mut state, Subject::Biology, "A", 99.0, 99.0, 1);

        let outcome = apply_progress(&mut state, Subject::Biology, "A", 10.0, 10.0, 2);

        let a = &state.subjects.biology[0];
        assert!(a.watched);
        assert_eq!(a.progress, 100.0);
        assert!(!outcome.completed());
        // only one completion entry
        assert_eq!(state.recent_activity.len(), 1);
    }

    #[test]
    fn test_progress_never_decreases() {
        let mut state = state_with(Subject::Physics, &["A"]);
        apply_progress(&mut state, Subject::Physics, "A", 60.0, 60.0, 1);
        apply_progress(&mut state, Subject::Physics, "A", 20.0, 20.0, 2);
        assert_eq!(state.subjects.physics[0].progress, 60.0);
        assert_eq!(state.subjects.physics[0].last_watched, Some(2));
    }

    #[test]
    fn test_progress_clamped() {
        let mut state = state_with(Subject::Physics, &["A"]);
        apply_progress(&mut state, Subject::Physics, "A", 140.0, 140.0, 1);
        assert_eq!(state.subjects.physics[0].progress, 100.0);
    }

    #[test]
    fn test_unknown_video_is_noop() {
        let mut state = state_with(Subject::Physics, &["A"]);
        let before = state.clone();

        let outcome = apply_progress(&mut state, Subject::Physics, "Z", 50.0, 5.0, 1);
        assert_eq!(outcome, ProgressOutcome::NotFound);
        assert!(!mark_watched(&mut state, Subject::Physics, "Z", 1));
        // same id lives only in physics
        assert_eq!(
            apply_progress(&mut state, Subject::Biology, "A", 50.0, 5.0, 1),
            ProgressOutcome::NotFound
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_non_finite_sample_ignored() {
        let mut state = state_with(Subject::Physics, &["A"]);
        let before = state.clone();
        let outcome = apply_progress(&mut state, Subject::Physics, "A", f64::NAN, 0.0, 1);
        assert_eq!(outcome, ProgressOutcome::Ignored);
        assert_eq!(state, before);
    }

    #[test]
    fn test_sort_for_display() {
        let mut videos = vec![video("done1"), video("fresh"), video("started"), video("done2")];
        videos[0].watched = true;
        videos[0].progress = 100.0;
        videos[3].watched = true;
        videos[3].progress = 100.0;
        videos[3].last_watched = Some(99);
        videos[2].progress = 30.0;

        let sorted: Vec<_> = sort_for_display(&videos).iter().map(|v| v.id.as_str()).collect();
        assert_eq!(sorted, vec!["started", "fresh", "done1", "done2"]);
    }

    #[test]
    fn test_sort_by_last_watched_within_started() {
        let mut videos = vec![video("older"), video("newer")];
        videos[0].progress = 40.0;
        videos[0].last_watched = Some(10);
        videos[1].progress = 40.0;
        videos[1].last_watched = Some(20);

        let sorted: Vec<_> = sort_for_display(&videos).iter().map(|v| v.id.as_str()).collect();
        assert_eq!(sorted, vec!["newer", "older"]);
    }

    #[test]
    fn test_continue_watching_projection() {
        let mut state = AppState::default();
        for i in 0..8 {
            let mut v = video(&format!("p{}", i));
            v.progress = 50.0;
            v.last_watched = Some(i);
            state.subjects.physics.push(v);
        }
        let mut finished = video("finished");
        finished.progress = 96.0;
        finished.last_watched = Some(1_000);
        state.subjects.chemistry.push(finished);
        let mut barely = video("barely");
        barely.progress = 5.0;
        state.subjects.chemistry.push(barely);
        let mut bio = video("bio");
        bio.progress = 20.0;
        bio.last_watched = Some(500);
        state.subjects.biology.push(bio);

        let view = continue_watching(&state);
        assert_eq!(view.len(), CONTINUE_WATCHING_LIMIT);
        assert_eq!(view[0].video.id, "bio");
        assert_eq!(view[0].subject, Subject::Biology);
        assert_eq!(view[1].video.id, "p7");
        assert!(view.iter().all(|c| c.video.id != "finished" && c.video.id != "barely"));
    }

    #[test]
    fn test_subject_stats() {
        let mut state = state_with(Subject::Physics, &["A", "B", "C"]);
        mark_watched(&mut state, Subject::Physics, "A", 1);

        let stats = subject_stats(&state);
        assert_eq!(stats.len(), 3);
        assert_eq!(stats[0].total, 3);
        assert_eq!(stats[0].watched, 1);
        assert_eq!(stats[0].unwatched(), 2);
        assert_eq!(stats[0].percent, 33);
        assert_eq!(stats[1].percent, 0);
    }
}
