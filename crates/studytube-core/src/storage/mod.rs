//! Storage layer
//!
//! Handles persistence of the application state.
//!
//! ## Architecture
//!
//! - **StateStore**: the medium (a JSON file on disk, or memory in tests)
//! - **Snapshot**: load/save with migration, backup export and import
//!
//! Load never fails: missing or corrupt data falls back to defaults. Save
//! and import report typed errors and leave in-memory state alone.

pub mod error;
pub mod persistence;
pub mod snapshot;

pub use error::{ImportError, StorageError, StorageResult};
pub use persistence::{atomic_write, FileStore, MemoryStore, StateStore, STORAGE_BUDGET_BYTES, STORAGE_KEY};
pub use snapshot::{
    apply_backup, export_file_name, load_state, preview_backup, save_state, BackupPreview,
    ExportDocument, PersistedState, EXPORT_VERSION,
};
