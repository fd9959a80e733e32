//! In-memory storage backend for testing.

use crate::backend::KvBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;

type Map = BTreeMap<Vec<u8>, Vec<u8>>;

/// An in-memory storage backend.
///
/// This backend stores all data in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that don't need persistence
///
/// `commit` is a no-op unless commit failures have been enabled via
/// [`fail_commits`](Self::fail_commits).
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use lockbox_storage::{KvBackend, MemoryBackend};
///
/// let mut backend = MemoryBackend::new();
/// backend.put(b"key", b"value").unwrap();
/// assert_eq!(backend.len().unwrap(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
    map: RwLock<Map>,
    fail_commits: RwLock<bool>,
}

impl MemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory backend with pre-existing entries.
    ///
    /// Useful for testing reads against known stored bytes.
    #[must_use]
    pub fn with_entries(entries: Vec<(Vec<u8>, Vec<u8>)>) -> Self {
        Self {
            map: RwLock::new(entries.into_iter().collect()),
            fail_commits: RwLock::new(false),
        }
    }

    /// Returns a copy of all entries in the backend.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn raw_entries(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.map
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Makes subsequent commits fail.
    ///
    /// Useful for exercising write-error paths in tests.
    pub fn fail_commits(&self, fail: bool) {
        *self.fail_commits.write() = fail;
    }
}

impl KvBackend for MemoryBackend {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.map.read().get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.map.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &[u8]) -> StorageResult<()> {
        self.map.write().remove(key);
        Ok(())
    }

    fn clear(&mut self) -> StorageResult<()> {
        self.map.write().clear();
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<Vec<u8>>> {
        Ok(self.map.read().keys().cloned().collect())
    }

    fn entries(&self) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>> {
        Ok(self.raw_entries())
    }

    fn len(&self) -> StorageResult<usize> {
        Ok(self.map.read().len())
    }

    fn commit(&mut self) -> StorageResult<()> {
        if *self.fail_commits.read() {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "commit failures enabled",
            )));
        }
        Ok(())
    }
}
