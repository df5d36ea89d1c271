//! Storage tier strategies.
//!
//! A tier is a flat string key/value store. [`FileStorage`] keeps one JSON
//! document per tier on disk; [`MemoryStorage`] keeps the map in process and
//! can be cloned to share it, which lets tests simulate a restart by building
//! a fresh adapter over the same tiers.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Errors raised by a storage tier.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The backing document or a stored value is not valid JSON.
    #[error("storage serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Which storage scope a value lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Survives across browsing sessions ("remember me").
    Durable,
    /// Cleared when the browsing session ends.
    Session,
}

impl Tier {
    /// The tier chosen by a remember-me flag at login.
    #[must_use]
    pub const fn for_remember_me(remember_me: bool) -> Self {
        if remember_me { Self::Durable } else { Self::Session }
    }

    /// The other tier.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Durable => Self::Session,
            Self::Session => Self::Durable,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Durable => write!(f, "durable"),
            Self::Session => write!(f, "session"),
        }
    }
}

/// A key/value storage scope.
pub trait StorageTier: Send + Sync + fmt::Debug {
    /// Read a value, `None` if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key; absent keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Remove every key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn clear(&self) -> Result<(), StorageError>;
}

// =============================================================================
// MemoryStorage
// =============================================================================

/// Process-local tier. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    /// Create an empty tier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the tier holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl StorageTier for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.entries.lock().clear();
        Ok(())
    }
}

// =============================================================================
// FileStorage
// =============================================================================

/// Tier backed by a single JSON object file.
///
/// Every operation re-reads the file so that separate processes sharing the
/// directory observe each other's writes (best effort, last writer wins).
/// Writes go to a uniquely named temporary sibling and are renamed into place,
/// so a reader never sees a partially written document.
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    /// Open (creating the directory if needed) `<dir>/<name>.json`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the directory cannot be created.
    pub fn open(dir: &Path, name: &str) -> Result<Self, StorageError> {
        fs::create_dir_all(dir).map_err(|source| StorageError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            path: dir.join(format!("{name}.json")),
            lock: Mutex::new(()),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(StorageError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn store(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(entries)?;
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        let mut temp = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        temp.write_all(&json).map_err(io_err)?;
        temp.as_file().sync_all().map_err(io_err)?;
        temp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    fn update(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, String>) -> bool,
    ) -> Result<(), StorageError> {
        let _guard = self.lock.lock();
        let mut entries = self.load()?;
        if f(&mut entries) {
            self.store(&entries)?;
        }
        Ok(())
    }
}

impl StorageTier for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock();
        Ok(self.load()?.remove(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|entries| entries.remove(key).is_some())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.lock.lock();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Tier whose every operation fails, as a full or read-only disk would.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct FailingStorage;

#[cfg(test)]
impl FailingStorage {
    fn error() -> StorageError {
        StorageError::Io {
            path: PathBuf::from("/unwritable/storage.json"),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        }
    }
}

#[cfg(test)]
impl StorageTier for FailingStorage {
    fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(Self::error())
    }

    fn write(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(Self::error())
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(Self::error())
    }

    fn clear(&self) -> Result<(), StorageError> {
        Err(Self::error())
    }
}
