//! Master key lifecycle management.
//!
//! The master key is 32 bytes of root key material created once per storage
//! namespace and held in the namespace's key file, the stand-in for a
//! platform secure key store. Key- and value-level encryption keys are
//! derived from it with HKDF-SHA256 and never persisted.

use crate::crypto::{KeyCipher, ValueCipher, KEY_SIZE};
use crate::error::{EngineError, EngineResult};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Master key for a storage namespace.
///
/// The key is automatically zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    bytes: [u8; KEY_SIZE],
}

impl MasterKey {
    /// Generates a new random master key.
    ///
    /// Use [`KeyManager::obtain_master_key`] for a persistent, app-scoped
    /// key; this is for ephemeral stores and tests.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Creates a master key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the slice is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> EngineResult<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(EngineError::key_initialization(format!(
                "invalid master key size: expected {KEY_SIZE} bytes, got {}",
                bytes.len()
            )));
        }

        let mut key_bytes = [0u8; KEY_SIZE];
        key_bytes.copy_from_slice(bytes);
        Ok(Self { bytes: key_bytes })
    }

    /// Derives the deterministic cipher used for entry keys.
    pub(crate) fn derive_key_cipher(&self) -> EngineResult<KeyCipher> {
        let enc = self.derive(b"lockbox-key-encryption-v1")?;
        let seed = self.derive(b"lockbox-key-nonce-seed-v1")?;
        Ok(KeyCipher::new(&enc, seed))
    }

    /// Derives the randomized cipher used for entry values.
    pub(crate) fn derive_value_cipher(&self) -> EngineResult<ValueCipher> {
        let enc = self.derive(b"lockbox-value-encryption-v1")?;
        Ok(ValueCipher::new(&enc))
    }

    /// Derives 32 bytes of subkey material for the given context.
    fn derive(&self, info: &[u8]) -> EngineResult<[u8; KEY_SIZE]> {
        let hk = Hkdf::<Sha256>::new(None, &self.bytes);

        let mut out = [0u8; KEY_SIZE];
        hk.expand(info, &mut out)
            .map_err(|_| EngineError::key_initialization("HKDF expand failed"))?;

        Ok(out)
    }

    fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Creates and retrieves the master key for a storage namespace.
///
/// The key file is created lazily on first use and reused on every later
/// open, so the same namespace always resolves to the same key. On Unix the
/// file is written with owner-only permissions.
#[derive(Debug)]
pub struct KeyManager {
    key_path: PathBuf,
}

impl KeyManager {
    /// Creates a key manager for the given key file path.
    #[must_use]
    pub fn new(key_path: PathBuf) -> Self {
        Self { key_path }
    }

    /// Loads the namespace's master key, generating and persisting it on
    /// first use.
    ///
    /// # Errors
    ///
    /// Returns `KeyInitialization` if the key file is unreadable, has the
    /// wrong size, or cannot be created.
    pub fn obtain_master_key(&self) -> EngineResult<MasterKey> {
        if self.key_path.exists() {
            let bytes = fs::read(&self.key_path).map_err(|e| {
                EngineError::key_initialization(format!("failed to read master key file: {e}"))
            })?;
            return MasterKey::from_bytes(&bytes);
        }

        let key = MasterKey::generate();
        self.persist(&key).map_err(|e| {
            EngineError::key_initialization(format!("failed to persist master key: {e}"))
        })?;

        Ok(key)
    }

    /// Writes the key file atomically: temp file, restrict permissions,
    /// fsync, rename, fsync the parent directory.
    fn persist(&self, key: &MasterKey) -> io::Result<()> {
        let mut temp_name = self
            .key_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        temp_name.push(".tmp");
        let temp_path = self.key_path.with_file_name(temp_name);

        let mut file = File::create(&temp_path)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(key.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, &self.key_path)?;

        #[cfg(unix)]
        if let Some(parent) = self.key_path.parent() {
            File::open(parent)?.sync_all()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn generate_keys_differ() {
        let key1 = MasterKey::generate();
        let key2 = MasterKey::generate();
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn from_bytes_wrong_size_fails() {
        assert!(MasterKey::from_bytes(&[0u8; 16]).is_err());
        assert!(MasterKey::from_bytes(&[0u8; 64]).is_err());
    }

    #[test]
    fn debug_is_redacted() {
        let key = MasterKey::generate();
        let rendered = format!("{key:?}");
        assert!(rendered.contains("REDACTED"));
    }

    #[test]
    fn obtain_creates_then_reuses() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("master.key");

        let manager = KeyManager::new(path.clone());
        let first = manager.obtain_master_key().unwrap();
        assert!(path.exists());

        let second = manager.obtain_master_key().unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn obtain_rejects_truncated_key_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("master.key");
        fs::write(&path, b"short").unwrap();

        let manager = KeyManager::new(path);
        assert!(matches!(
            manager.obtain_master_key(),
            Err(EngineError::KeyInitialization { .. })
        ));
    }

    #[test]
    fn obtain_fails_when_key_path_is_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("master.key");
        fs::create_dir(&path).unwrap();

        let manager = KeyManager::new(path);
        assert!(matches!(
            manager.obtain_master_key(),
            Err(EngineError::KeyInitialization { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("master.key");

        KeyManager::new(path.clone()).obtain_master_key().unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn derived_ciphers_are_stable() {
        let key = MasterKey::from_bytes(&[7u8; KEY_SIZE]).unwrap();

        let a = key.derive_key_cipher().unwrap().seal(b"entry").unwrap();
        let b = key.derive_key_cipher().unwrap().seal(b"entry").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn key_and_value_subkeys_differ() {
        let key = MasterKey::from_bytes(&[7u8; KEY_SIZE]).unwrap();

        let enc = key.derive(b"lockbox-key-encryption-v1").unwrap();
        let val = key.derive(b"lockbox-value-encryption-v1").unwrap();
        let seed = key.derive(b"lockbox-key-nonce-seed-v1").unwrap();

        assert_ne!(enc, val);
        assert_ne!(enc, seed);
        assert_ne!(val, seed);
    }
}
