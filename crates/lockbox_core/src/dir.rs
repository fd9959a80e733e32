//! Namespace directory management.
//!
//! This module handles the file system layout for a Lockbox namespace:
//!
//! ```text
//! <root>/<namespace>/
//! ├─ LOCK           # Advisory lock for single-engine access
//! ├─ master.key     # Master key material (owner-only on Unix)
//! ├─ encrypted.db   # Encrypted scheme store
//! └─ plain.db       # Plain scheme fallback store
//! ```
//!
//! The LOCK file ensures only one engine can use the namespace at a time.

use crate::error::{EngineError, EngineResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// File names within the namespace directory.
const LOCK_FILE: &str = "LOCK";
const MASTER_KEY_FILE: &str = "master.key";
const ENCRYPTED_STORE_FILE: &str = "encrypted.db";
const PLAIN_STORE_FILE: &str = "plain.db";

/// Manages the namespace directory structure and file locking.
///
/// # Thread Safety
///
/// The `StoreDir` holds an exclusive lock on the namespace directory.
/// Only one `StoreDir` instance can exist per namespace at a time.
#[derive(Debug)]
pub struct StoreDir {
    /// Namespace directory path.
    path: PathBuf,
    /// Lock file handle (held for exclusive access).
    _lock_file: File,
}

impl StoreDir {
    /// Opens or creates a namespace directory and acquires its lock.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The path exists but is not a directory
    /// - Another engine holds the lock (returns `NamespaceLocked`)
    /// - I/O errors occur
    pub fn open(path: &Path) -> EngineResult<Self> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        if !path.is_dir() {
            return Err(EngineError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("namespace path is not a directory: {}", path.display()),
            )));
        }

        // Acquire exclusive lock (non-blocking)
        let lock_path = path.join(LOCK_FILE);
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(EngineError::NamespaceLocked);
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the path to the namespace directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path to the master key file.
    #[must_use]
    pub fn master_key_path(&self) -> PathBuf {
        self.path.join(MASTER_KEY_FILE)
    }

    /// Returns the path to the encrypted scheme store file.
    #[must_use]
    pub fn encrypted_store_path(&self) -> PathBuf {
        self.path.join(ENCRYPTED_STORE_FILE)
    }

    /// Returns the path to the plain scheme store file.
    #[must_use]
    pub fn plain_store_path(&self) -> PathBuf {
        self.path.join(PLAIN_STORE_FILE)
    }
}

impl Drop for StoreDir {
    fn drop(&mut self) {
        // Lock is released when the file handle closes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_creates_directory() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("lockbox");

        assert!(!path.exists());

        let _dir = StoreDir::open(&path).unwrap();
        assert!(path.exists());
        assert!(path.is_dir());
    }

    #[test]
    fn open_fails_on_file_path() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("lockbox");
        fs::write(&path, b"not a directory").unwrap();

        assert!(StoreDir::open(&path).is_err());
    }

    #[test]
    fn lock_prevents_second_open() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("lockbox");

        let _dir1 = StoreDir::open(&path).unwrap();

        let result = StoreDir::open(&path);
        assert!(matches!(result, Err(EngineError::NamespaceLocked)));
    }

    #[test]
    fn lock_released_on_drop() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("lockbox");

        {
            let _dir = StoreDir::open(&path).unwrap();
        }

        let _dir2 = StoreDir::open(&path).unwrap();
    }

    #[test]
    fn paths_are_correct() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("lockbox");

        let dir = StoreDir::open(&path).unwrap();

        assert_eq!(dir.master_key_path(), path.join("master.key"));
        assert_eq!(dir.encrypted_store_path(), path.join("encrypted.db"));
        assert_eq!(dir.plain_store_path(), path.join("plain.db"));
    }
}
