//! File-based storage backend for persistent storage.

use crate::backend::KvBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

type Map = BTreeMap<Vec<u8>, Vec<u8>>;

/// A file-based storage backend.
///
/// This backend provides persistent storage using OS file APIs. The full
/// map is held in memory and serialized as CBOR on commit; data survives
/// process restarts.
///
/// # Durability
///
/// `commit()` uses the write-then-rename pattern for crash safety:
///
/// 1. Write the encoded map to a temporary file
/// 2. Sync the temporary file to disk
/// 3. Rename the temporary file over the store file
/// 4. Fsync the parent directory so the rename itself is durable
///
/// A crash at any point leaves either the old or the new map on disk,
/// never a partial write.
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads.
/// Internal locking ensures consistent access.
///
/// # Example
///
/// ```no_run
/// use lockbox_storage::{KvBackend, FileBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open(Path::new("store.db")).unwrap();
/// backend.put(b"key", b"value").unwrap();
/// backend.commit().unwrap();  // Ensure data is durable
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    temp_path: PathBuf,
    map: RwLock<Map>,
    sync_on_commit: bool,
}

impl FileBackend {
    /// Opens or creates a file backend at the given path.
    ///
    /// If the file exists, its map is loaded; if it doesn't, the backend
    /// starts empty and the file is created on first commit.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or `Corrupted` if its
    /// contents cannot be decoded.
    pub fn open(path: &Path) -> StorageResult<Self> {
        Self::open_with_sync(path, true)
    }

    /// Opens or creates a file backend with explicit commit durability.
    ///
    /// With `sync_on_commit` disabled, commits still rewrite the file
    /// atomically but skip the fsync calls. Only suitable for throwaway
    /// stores where durability does not matter.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn open_with_sync(path: &Path, sync_on_commit: bool) -> StorageResult<Self> {
        let map = Self::load(path)?;

        let mut temp_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        temp_name.push(".tmp");
        let temp_path = path.with_file_name(temp_name);

        Ok(Self {
            path: path.to_path_buf(),
            temp_path,
            map: RwLock::new(map),
            sync_on_commit,
        })
    }

    /// Opens or creates a file backend, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot
    /// be opened.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> StorageResult<Map> {
        if !path.exists() {
            return Ok(Map::new());
        }

        let mut file = File::open(path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;

        if data.is_empty() {
            return Ok(Map::new());
        }

        ciborium::de::from_reader(&data[..])
            .map_err(|e| StorageError::corrupted(format!("failed to decode store file: {e}")))
    }

    /// Syncs the parent directory so a rename is durable.
    ///
    /// On Windows, directory fsync is not supported; NTFS journaling
    /// provides equivalent metadata durability, so this is a no-op there.
    #[cfg(unix)]
    fn sync_directory(&self) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            let dir = File::open(parent)?;
            dir.sync_all()?;
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) -> StorageResult<()> {
        Ok(())
    }
}

impl KvBackend for FileBackend {
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
        Ok(self
            .map
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn len(&self) -> StorageResult<usize> {
        Ok(self.map.read().len())
    }

    fn commit(&mut self) -> StorageResult<()> {
        let data = {
            let map = self.map.read();
            let mut buf = Vec::new();
            ciborium::ser::into_writer(&*map, &mut buf)
                .map_err(|e| StorageError::codec(format!("failed to encode store map: {e}")))?;
            buf
        };

        let mut file = File::create(&self.temp_path)?;
        file.write_all(&data)?;
        if self.sync_on_commit {
            file.sync_all()?;
        }
        drop(file);

        fs::rename(&self.temp_path, &self.path)?;

        if self.sync_on_commit {
            self.sync_directory()?;
        }

        Ok(())
    }
}
