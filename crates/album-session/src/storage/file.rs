//! File-backed key-value storage.
//!
//! All keys live in one JSON object:
//!
//! ```text
//! ~/.local/share/album-browser/storage.json
//! {
//!   "session": "{\"loginId\":\"5\",\"loginUser\":null,\"album\":null}"
//! }
//! ```

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::RwLock,
};

use album_core::{KeyValueStore, StorageError};

/// File-backed storage implementation.
///
/// Entries are cached in memory and the whole file is rewritten on every
/// mutation (write to temp, then rename). Two instances over the same file
/// do not see each other's writes; the last writer wins.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open the storage file, creating parent directories as needed.
    ///
    /// A missing file starts empty. An unreadable or malformed file is
    /// logged and also starts empty; it is replaced on the next write.
    ///
    /// # Errors
    /// Returns error if the parent directory cannot be created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let entries = match load(&path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %path.display(), "discarding unreadable storage file: {e}");
                BTreeMap::new()
            }
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "file storage opened");

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Temporary file path for atomic writes.
    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map_or_else(|| "storage".into(), |n| n.to_string_lossy().into_owned());
        self.path.with_file_name(format!(".{name}.tmp"))
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(entries)?;
        let temp_path = self.temp_path();
        write_synced(&temp_path, json.as_bytes())?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn mutate<F>(&self, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StorageError::Internal(e.to_string()))?;

        let mut next = entries.clone();
        f(&mut next);
        self.flush(&next)?;
        *entries = next;
        Ok(())
    }
}

/// Write `bytes` to `path` and sync them to disk before returning.
fn write_synced(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

fn load(path: &Path) -> Result<BTreeMap<String, String>, StorageError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .entries
            .read()
            .map_err(|e| StorageError::Internal(e.to_string()))?
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.mutate(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.mutate(|entries| {
            entries.remove(key);
        })
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.mutate(BTreeMap::clear)
    }
}
