//! Durable storage of the whole note collection under one namespace key.
use std::{
    collections::HashMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use log::{debug, error, info, trace, warn};
use tempfile::NamedTempFile;

use crate::{Note, NoteError, Result};

/// A durable key-value medium holding string values.
pub trait StorageMedium: Send + Sync {
    /// Returns the stored value, or `None` if the key was never written.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Overwrites the value stored under `key`.
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// Stores each key as `<dir>/<key>.json`, replacing files atomically.
#[derive(Debug, Clone)]
pub struct FileMedium {
    dir: PathBuf,
}

impl FileMedium {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl StorageMedium for FileMedium {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            debug!("No stored value at {}", path.display());
            return Ok(None);
        }

        let value = fs::read_to_string(&path).map_err(|e| {
            error!("Failed to read {}: {}", path.display(), e);
            NoteError::from(e)
        })?;
        Ok(Some(value))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        if !self.dir.exists() {
            debug!("Creating data directory: {}", self.dir.display());
            fs::create_dir_all(&self.dir).map_err(|e| {
                error!("Failed to create directory {}: {}", self.dir.display(), e);
                NoteError::from(e)
            })?;
        }

        let path = self.path_for(key);

        // Temp file in the same directory so the final rename is atomic
        let mut temp_file = NamedTempFile::new_in(&self.dir).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            NoteError::from(e)
        })?;

        trace!("Writing {} bytes to temporary file", value.len());
        temp_file.write_all(value.as_bytes()).map_err(|e| {
            error!("Failed to write to temporary file: {}", e);
            NoteError::from(e)
        })?;

        temp_file.flush().map_err(|e| {
            error!("Failed to flush temporary file: {}", e);
            NoteError::from(e)
        })?;

        temp_file.persist(&path).map_err(|e| {
            error!("Failed to persist file {}: {}", path.display(), e.error);
            NoteError::from(e.error)
        })?;

        debug!("Persisted {}", path.display());
        Ok(())
    }
}

/// In-process medium with an optional byte quota.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryMedium {
    entries: Arc<Mutex<HashMap<String, String>>>,
    quota_bytes: Option<usize>,
    fail_writes: Arc<AtomicBool>,
    fail_reads: Arc<AtomicBool>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes whose value exceeds `bytes` are rejected.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota_bytes: Some(bytes),
            ..Self::default()
        }
    }

    /// Makes every subsequent write fail until switched back off.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent read fail until switched back off.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Stores a raw value without going through note serialization.
    pub fn insert_raw(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.lock()?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| NoteError::storage("Failed to acquire lock on memory medium"))
    }
}

impl StorageMedium for MemoryMedium {
    fn read(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(NoteError::storage("Medium could not be read"));
        }
        Ok(self.lock()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(NoteError::storage("Medium rejected the write"));
        }

        if let Some(quota) = self.quota_bytes {
            if value.len() > quota {
                return Err(NoteError::storage(format!(
                    "Quota exceeded: {} bytes written, {} allowed",
                    value.len(),
                    quota
                )));
            }
        }

        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Loads and saves the full note list as one JSON array.
#[derive(Clone)]
pub struct PersistenceStore {
    medium: Arc<dyn StorageMedium>,
    namespace: String,
}

impl PersistenceStore {
    pub fn new(medium: Arc<dyn StorageMedium>, namespace: impl Into<String>) -> Self {
        Self {
            medium,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns every stored note in stored order.
    ///
    /// Missing or corrupt data yields an empty list. A medium that cannot be
    /// read is a `Storage` error, so callers never write over data they
    /// failed to see.
    pub fn try_load(&self) -> Result<Vec<Note>> {
        let raw = match self.medium.read(&self.namespace).map_err(|e| {
            error!("Failed to read notes under '{}': {}", self.namespace, e);
            e
        })? {
            Some(raw) => raw,
            None => {
                debug!("Nothing stored under '{}'", self.namespace);
                return Ok(Vec::new());
            }
        };

        match serde_json::from_str::<Vec<Note>>(&raw) {
            Ok(notes) => {
                trace!("Loaded {} notes from '{}'", notes.len(), self.namespace);
                Ok(notes)
            }
            Err(e) => {
                warn!(
                    "Stored notes under '{}' could not be parsed, starting empty: {}",
                    self.namespace, e
                );
                Ok(Vec::new())
            }
        }
    }

    /// Like `try_load`, but an unreadable medium also yields an empty list.
    ///
    /// Only for read-only views; mutations go through `try_load`.
    pub fn load(&self) -> Vec<Note> {
        self.try_load().unwrap_or_else(|e| {
            warn!("Showing no notes, store unreadable: {}", e);
            Vec::new()
        })
    }

    /// Overwrites the stored collection with `notes`.
    pub fn save(&self, notes: &[Note]) -> Result<()> {
        let json = serde_json::to_string(notes).map_err(|e| {
            error!("Failed to serialize notes: {}", e);
            NoteError::from(e)
        })?;

        self.medium.write(&self.namespace, &json).map_err(|e| {
            error!("Failed to save notes under '{}': {}", self.namespace, e);
            e
        })?;

        info!("Saved {} notes under '{}'", notes.len(), self.namespace);
        Ok(())
    }
}
