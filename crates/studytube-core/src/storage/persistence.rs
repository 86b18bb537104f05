//! State blob persistence
//!
//! The state is stored as a single JSON blob under a fixed key. The
//! [`StateStore`] trait abstracts the medium so the library can run against
//! a file on disk or an in-memory store in tests.
//!
//! Storage location: `~/.local/share/studytube/` (configurable via `Config`)
//!
//! Files:
//! - `youtubeLearningTracker.json` - The serialized state

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::config::Config;
use crate::storage::error::{StorageError, StorageResult};

/// Key the state blob is stored under
pub const STORAGE_KEY: &str = "youtubeLearningTracker";

/// Budget used for the storage usage gauge (5 MiB)
pub const STORAGE_BUDGET_BYTES: usize = 5 * 1024 * 1024;

/// A medium that holds the serialized state
pub trait StateStore {
    /// Read the stored blob, `None` if nothing has been saved yet
    fn read(&self) -> StorageResult<Option<String>>;

    /// Replace the stored blob
    fn write(&mut self, contents: &str) -> StorageResult<()>;

    /// Size of the stored blob in bytes
    fn size(&self) -> usize {
        self.read().ok().flatten().map(|s| s.len()).unwrap_or(0)
    }
}

/// Stores the blob in a JSON file using atomic writes
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store the blob at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store the blob in the configured data directory
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.state_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if a state file exists on disk
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl StateStore for FileStore {
    fn read(&self) -> StorageResult<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        fs::read_to_string(&self.path)
            .map(Some)
            .map_err(|source| StorageError::ReadError {
                path: self.path.clone(),
                source,
            })
    }

    fn write(&mut self, contents: &str) -> StorageResult<()> {
        atomic_write(&self.path, contents.as_bytes())
    }

    fn size(&self) -> usize {
        fs::metadata(&self.path)
            .map(|m| m.len() as usize)
            .unwrap_or(0)
    }
}

/// Keeps blobs in memory, keyed like browser local storage
///
/// Clones share the same underlying map, so a test can keep a handle to
/// inspect what a library wrote. An optional quota makes writes fail once
/// the blob grows past it.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects blobs larger than `limit` bytes
    pub fn with_quota(limit: usize) -> Self {
        Self {
            quota: Some(limit),
            ..Self::default()
        }
    }

    /// Store pre-seeded with a blob
    pub fn with_contents(contents: impl Into<String>) -> Self {
        let store = Self::default();
        store
            .entries
            .borrow_mut()
            .insert(STORAGE_KEY.to_string(), contents.into());
        store
    }

    /// Current blob, if any
    pub fn contents(&self) -> Option<String> {
        self.entries.borrow().get(STORAGE_KEY).cloned()
    }

    /// Change the quota on this handle
    pub fn set_quota(&mut self, quota: Option<usize>) {
        self.quota = quota;
    }
}

impl StateStore for MemoryStore {
    fn read(&self) -> StorageResult<Option<String>> {
        Ok(self.contents())
    }

    fn write(&mut self, contents: &str) -> StorageResult<()> {
        if let Some(limit) = self.quota {
            if contents.len() > limit {
                return Err(StorageError::QuotaExceeded {
                    size: contents.len(),
                    limit,
                });
            }
        }
        self.entries
            .borrow_mut()
            .insert(STORAGE_KEY.to_string(), contents.to_string());
        Ok(())
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
///
/// The target file is never left in a partially-written state.
pub fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StorageError::from_io(e, parent.to_path_buf()))?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    // Sync to disk before rename
    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}
