//! In-memory key-value storage.

use std::{collections::HashMap, sync::RwLock};

use album_core::{KeyValueStore, StorageError};

/// In-memory storage implementation.
///
/// Useful for tests and throwaway runs.
/// Data is lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create a new in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage pre-filled with entries.
    #[must_use]
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Number of stored keys.
    ///
    /// # Errors
    /// Returns error if the lock is poisoned.
    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self
            .entries
            .read()
            .map_err(|e| StorageError::Internal(e.to_string()))?
            .len())
    }

    /// Whether no keys are stored.
    ///
    /// # Errors
    /// Returns error if the lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .entries
            .read()
            .map_err(|e| StorageError::Internal(e.to_string()))?
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .map_err(|e| StorageError::Internal(e.to_string()))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .map_err(|e| StorageError::Internal(e.to_string()))?
            .remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.entries
            .write()
            .map_err(|e| StorageError::Internal(e.to_string()))?
            .clear();
        Ok(())
    }
}
