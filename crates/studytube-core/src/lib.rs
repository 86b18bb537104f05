//! StudyTube Core Library
//!
//! This crate provides the core functionality for StudyTube, a local-first
//! tracker for study videos organised by subject (physics, chemistry and
//! biology).
//!
//! # Architecture
//!
//! - **Library**: owns the application state and persists it after every
//!   mutation
//! - **Progress engine**: turns playback telemetry into progress, completion
//!   and ordering
//! - **Persistence**: a single JSON blob behind the `StateStore` trait, plus
//!   backup export and import
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let mut library = Library::open(FileStore::from_config(&config));
//!
//! // Add videos
//! let lookup = OEmbedClient::new(&config.oembed_url, config.lookup_timeout())?;
//! library.add_videos(&links, Subject::Physics, &lookup, |_| {}).await;
//!
//! // Record playback
//! library.update_progress(Subject::Physics, "dQw4w9WgXcQ", 42.0, 84.0);
//! ```
//!
//! # Modules
//!
//! - `library`: State container and mutations (main entry point)
//! - `models`: Videos, subjects, settings and the application state
//! - `activity`: Activity log and continue-watching ring
//! - `progress`: Progress derivation, ordering and statistics
//! - `video_id`: Extracting video ids from links
//! - `metadata`: oEmbed metadata lookup
//! - `playback`: Cancellable progress sampling
//! - `storage`: Persistence, export and import
//! - `config`: Application configuration

pub mod activity;
pub mod config;
pub mod library;
pub mod metadata;
pub mod models;
pub mod playback;
pub mod progress;
pub mod storage;
pub mod video_id;

pub use activity::{time_ago, ActivityEntry, ActivityKind, ContinueWatchingEntry};
pub use config::Config;
pub use library::{AddProgress, AddSummary, Library, StorageUsage};
pub use metadata::{LookupError, OEmbedClient, VideoDetails, VideoLookup};
pub use models::{AppState, Settings, Subject, Theme, UnknownTheme, VideoRecord};
pub use playback::{
    PlaybackCompleted, PlaybackController, PlaybackSource, PlaybackTick, PlayerEvent,
    ProgressTracker,
};
pub use progress::{ProgressOutcome, SubjectStats};
pub use storage::{FileStore, ImportError, MemoryStore, StateStore, StorageError};
pub use video_id::{analyze_links, extract_video_id, split_links};
