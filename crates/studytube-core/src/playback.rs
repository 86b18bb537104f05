//! Playback progress sampling
//!
//! While a video plays, a [`ProgressTracker`] samples the player every
//! interval and sends a [`PlaybackTick`] to whoever owns the library. The
//! tracker runs as a tokio task behind an explicit handle; cancelling or
//! dropping the handle stops it.
//!
//! [`PlaybackController`] turns player state changes into tracker starts and
//! stops. Each tracker gets a fresh session id, and ticks from a session that
//! is no longer active are rejected by [`PlaybackController::accepts`], so a
//! sample that was already in the channel when playback paused never lands.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

use crate::models::Subject;

/// Something that reports playback position
pub trait PlaybackSource: Send + Sync + 'static {
    /// Seconds from the start of the video
    fn current_time(&self) -> f64;

    /// Total length in seconds; zero or less while unknown
    fn duration(&self) -> f64;
}

/// One progress sample
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackTick {
    pub session: u64,
    pub subject: Subject,
    pub video_id: String,
    /// `current_time / duration * 100`, unclamped
    pub percent: f64,
    pub current_time: f64,
}

/// Handle to a running sampling task
#[derive(Debug)]
pub struct ProgressTracker {
    session: u64,
    handle: JoinHandle<()>,
}

impl ProgressTracker {
    /// Start sampling `source` every `period`
    ///
    /// The first sample is taken one period after start. Samples are skipped
    /// while the duration is unknown. The task ends on its own once the
    /// receiver is dropped.
    pub fn start(
        session: u64,
        subject: Subject,
        video_id: impl Into<String>,
        source: Arc<dyn PlaybackSource>,
        period: Duration,
        ticks: mpsc::UnboundedSender<PlaybackTick>,
    ) -> Self {
        let video_id = video_id.into();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;

                let duration = source.duration();
                if duration.is_nan() || duration <= 0.0 {
                    trace!("Duration unknown for {}, skipping sample", video_id);
                    continue;
                }

                let current_time = source.current_time();
                let tick = PlaybackTick {
                    session,
                    subject,
                    video_id: video_id.clone(),
                    percent: current_time / duration * 100.0,
                    current_time,
                };
                if ticks.send(tick).is_err() {
                    debug!("Tick receiver closed, stopping tracker {}", session);
                    break;
                }
            }
        });

        Self { session, handle }
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    /// Stop sampling
    pub fn cancel(self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Player state changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    Playing,
    Paused,
    Ended,
    Error,
    /// The viewer was closed
    Closed,
}

/// Playback reached the end of a video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackCompleted {
    pub subject: Subject,
    pub video_id: String,
}

struct ActiveVideo {
    subject: Subject,
    video_id: String,
    source: Arc<dyn PlaybackSource>,
}

/// Drives progress trackers from player events
pub struct PlaybackController {
    period: Duration,
    ticks: mpsc::UnboundedSender<PlaybackTick>,
    next_session: u64,
    active: Option<ActiveVideo>,
    tracker: Option<ProgressTracker>,
}

impl PlaybackController {
    /// Create a controller and the receiver its ticks arrive on
    pub fn new(period: Duration) -> (Self, mpsc::UnboundedReceiver<PlaybackTick>) {
        let (ticks, rx) = mpsc::unbounded_channel();
        let controller = Self {
            period,
            ticks,
            next_session: 1,
            active: None,
            tracker: None,
        };
        (controller, rx)
    }

    /// Load a video into the player
    ///
    /// Whatever was open before is closed first.
    pub fn open(&mut self, subject: Subject, video_id: impl Into<String>, source: Arc<dyn PlaybackSource>) {
        self.stop_tracking();
        self.active = Some(ActiveVideo {
            subject,
            video_id: video_id.into(),
            source,
        });
    }

    /// Apply a player state change
    ///
    /// Returns a completion when the video played to the end.
    pub fn handle(&mut self, event: PlayerEvent) -> Option<PlaybackCompleted> {
        debug!("Player event: {:?}", event);
        match event {
            PlayerEvent::Playing => {
                self.start_tracking();
                None
            }
            PlayerEvent::Paused | PlayerEvent::Error => {
                self.stop_tracking();
                None
            }
            PlayerEvent::Ended => {
                self.stop_tracking();
                self.active.as_ref().map(|active| PlaybackCompleted {
                    subject: active.subject,
                    video_id: active.video_id.clone(),
                })
            }
            PlayerEvent::Closed => {
                self.stop_tracking();
                self.active = None;
                None
            }
        }
    }

    /// Whether a tick belongs to the running tracker
    pub fn accepts(&self, tick: &PlaybackTick) -> bool {
        self.tracker
            .as_ref()
            .is_some_and(|tracker| tracker.session() == tick.session)
    }

    pub fn is_tracking(&self) -> bool {
        self.tracker.is_some()
    }

    /// The open video, if any
    pub fn current(&self) -> Option<(Subject, &str)> {
        self.active
            .as_ref()
            .map(|active| (active.subject, active.video_id.as_str()))
    }

    fn start_tracking(&mut self) {
        self.stop_tracking();
        let Some(active) = &self.active else {
            debug!("Playing event with no open video");
            return;
        };

        let session = self.next_session;
        self.next_session += 1;
        self.tracker = Some(ProgressTracker::start(
            session,
            active.subject,
            active.video_id.clone(),
            Arc::clone(&active.source),
            self.period,
            self.ticks.clone(),
        ));
    }

    fn stop_tracking(&mut self) {
        if let Some(tracker) = self.tracker.take() {
            tracker.cancel();
        }
    }
}
