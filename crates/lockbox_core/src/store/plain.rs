//! Plain storage scheme.
//!
//! The permanent fallback when encrypted initialization fails: the same
//! operation surface as the encrypted scheme, with UTF-8 strings stored
//! directly in the backend.

use crate::error::{EngineError, EngineResult};
use crate::store::ItemStore;
use lockbox_storage::{FileBackend, KvBackend};
use std::path::Path;

/// A store whose keys and values are persisted as plain text.
pub struct PlainStore {
    backend: Box<dyn KvBackend>,
}

impl PlainStore {
    /// Opens a plain store over a file backend at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be opened or
    /// decoded. The engine treats this as fatal; there is nothing left to
    /// fall back to.
    pub fn open(path: &Path, sync_on_commit: bool) -> EngineResult<Self> {
        let backend = FileBackend::open_with_sync(path, sync_on_commit)?;
        Ok(Self::new(Box::new(backend)))
    }

    /// Creates a plain store over a pre-configured backend.
    #[must_use]
    pub fn new(backend: Box<dyn KvBackend>) -> Self {
        Self { backend }
    }

    fn decode(bytes: Vec<u8>, what: &str) -> EngineResult<String> {
        String::from_utf8(bytes)
            .map_err(|_| EngineError::corruption(format!("stored {what} is not valid UTF-8")))
    }
}

impl ItemStore for PlainStore {
    fn get(&self, key: &str) -> EngineResult<Option<String>> {
        match self.backend.get(key.as_bytes())? {
            None => Ok(None),
            Some(bytes) => Ok(Some(Self::decode(bytes, "value")?)),
        }
    }

    fn put(&mut self, key: &str, value: &str) -> EngineResult<()> {
        self.backend
            .put(key.as_bytes(), value.as_bytes())
            .map_err(|e| EngineError::write(format!("failed to stage entry for {key:?}: {e}")))?;
        self.backend
            .commit()
            .map_err(|e| EngineError::write(format!("failed to persist entry for {key:?}: {e}")))
    }

    fn remove(&mut self, key: &str) -> EngineResult<()> {
        self.backend
            .remove(key.as_bytes())
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
        for key in self.backend.keys()? {
            out.push(Self::decode(key, "key")?);
        }
        Ok(out)
    }

    fn entries(&self) -> EngineResult<Vec<(String, String)>> {
        let mut out = Vec::new();
        for (key, value) in self.backend.entries()? {
            out.push((Self::decode(key, "key")?, Self::decode(value, "value")?));
        }
        Ok(out)
    }
}

impl std::fmt::Debug for PlainStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlainStore").finish_non_exhaustive()
    }
}
