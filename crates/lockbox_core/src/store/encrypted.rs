//! Encrypted storage scheme.
//!
//! Wraps a [`KvBackend`] so that both entry keys and values are encrypted
//! before write and decrypted after read. Keys use the deterministic
//! cipher so point lookup works on ciphertext; values use the randomized
//! cipher with the plaintext key bound as associated data.

use crate::crypto::{KeyCipher, ValueCipher};
use crate::error::{EngineError, EngineResult};
use crate::keys::MasterKey;
use crate::store::ItemStore;
use lockbox_storage::{FileBackend, KvBackend};
use std::path::Path;

/// A store whose keys and values are encrypted at rest.
///
/// All operations encrypt and decrypt transparently; callers only ever see
/// plaintext strings. Stored bytes that fail authentication on read
/// surface [`EngineError::Corruption`].
pub struct EncryptedStore {
    backend: Box<dyn KvBackend>,
    keys: KeyCipher,
    values: ValueCipher,
}

impl EncryptedStore {
    /// Opens an encrypted store over a file backend at the given path.
    ///
    /// # Errors
    ///
    /// Returns `BackendInit` if the underlying store cannot be opened or
    /// decoded, or a key error if cipher derivation fails.
    pub fn open(path: &Path, master: &MasterKey, sync_on_commit: bool) -> EngineResult<Self> {
        let backend = FileBackend::open_with_sync(path, sync_on_commit).map_err(|e| {
            EngineError::backend_init(format!("failed to open encrypted store: {e}"))
        })?;
        Self::new(Box::new(backend), master)
    }

    /// Creates an encrypted store over a pre-configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if cipher derivation from the master key fails.
    pub fn new(backend: Box<dyn KvBackend>, master: &MasterKey) -> EngineResult<Self> {
        Ok(Self {
            backend,
            keys: master.derive_key_cipher()?,
            values: master.derive_value_cipher()?,
        })
    }

    fn decode_key(&self, stored: &[u8]) -> EngineResult<String> {
        let plain = self.keys.open(stored)?;
        String::from_utf8(plain)
            .map_err(|_| EngineError::corruption("decrypted key is not valid UTF-8"))
    }

    fn decode_value(&self, key: &str, sealed: &[u8]) -> EngineResult<String> {
        let plain = self.values.open(sealed, key.as_bytes())?;
        String::from_utf8(plain).map_err(|_| {
            EngineError::corruption(format!("decrypted value for {key:?} is not valid UTF-8"))
        })
    }
}

impl ItemStore for EncryptedStore {
    fn get(&self, key: &str) -> EngineResult<Option<String>> {
        let stored_key = self.keys.seal(key.as_bytes())?;

        match self.backend.get(&stored_key)? {
            None => Ok(None),
            Some(sealed) => Ok(Some(self.decode_value(key, &sealed)?)),
        }
    }

    fn put(&mut self, key: &str, value: &str) -> EngineResult<()> {
        let stored_key = self.keys.seal(key.as_bytes())?;
        let sealed = self.values.seal(value.as_bytes(), key.as_bytes())?;

        self.backend
            .put(&stored_key, &sealed)
            .map_err(|e| EngineError::write(format!("failed to stage entry for {key:?}: {e}")))?;
        self.backend
            .commit()
            .map_err(|e| EngineError::write(format!("failed to persist entry for {key:?}: {e}")))
    }

    fn remove(&mut self, key: &str) -> EngineResult<()> {
        let stored_key = self.keys.seal(key.as_bytes())?;

        self.backend
            .remove(&stored_key)
            .map_err(|e| EngineError::write(format!("failed to stage removal of {key:?}: {e}")))?;
        self.backend
            .commit()
            .map_err(|e| EngineError::write(format!("failed to persist removal of {key:?}: {e}")))
    }

    fn clear(&mut self) -> EngineResult<()> {
        self.backend
            .clear()
            .map_err(|e| EngineError::write(format!("failed to stage clear: {e}")))?;
        self.backend
            .commit()
            .map_err(|e| EngineError::write(format!("failed to persist cleared store: {e}")))
    }

    fn keys(&self) -> EngineResult<Vec<String>> {
        let mut out = Vec::new();
        for stored in self.backend.keys()? {
            out.push(self.decode_key(&stored)?);
        }
        Ok(out)
    }

    fn entries(&self) -> EngineResult<Vec<(String, String)>> {
        let mut out = Vec::new();
        for (stored_key, sealed) in self.backend.entries()? {
            let key = self.decode_key(&stored_key)?;
            let value = self.decode_value(&key, &sealed)?;
            out.push((key, value));
        }
        Ok(out)
    }
}

impl std::fmt::Debug for EncryptedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedStore").finish_non_exhaustive()
    }
}
