//! Storage engine facade and backend selection.

use crate::config::Config;
use crate::dir::StoreDir;
use crate::error::{EngineError, EngineResult};
use crate::keys::KeyManager;
use crate::store::{EncryptedStore, ItemStore, PlainStore};
use parking_lot::Mutex;
use std::path::Path;
use tracing::warn;

/// Which storage scheme the engine selected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendSelection {
    /// Keys and values are encrypted at rest.
    Encrypted,
    /// Plain fallback; encryption setup failed at construction.
    Plain,
}

/// The main storage engine handle.
///
/// `StorageEngine` is the single entry point for interacting with a
/// Lockbox store. It provides:
/// - String-keyed reads, writes, and removals
/// - Full-store enumeration and clearing
/// - Batch import from a serialized JSON payload
///
/// # Opening an Engine
///
/// Use `StorageEngine::open()` with the application's data root:
///
/// ```rust,ignore
/// use lockbox_core::StorageEngine;
/// use std::path::Path;
///
/// let engine = StorageEngine::open(Path::new("/data/app"))?;
/// engine.set_item("session", "token")?;
/// ```
///
/// # Backend Selection
///
/// Construction attempts master-key setup and the encrypted store first;
/// if either fails, the failure is logged and the engine permanently falls
/// back to plain storage for its lifetime. There is no retry and no
/// health-check-triggered recovery - retrying would change the durability
/// story of entries already written in plain. [`selection`](Self::selection)
/// reports which scheme is active.
///
/// # Concurrency
///
/// The selected backend sits behind a single writer lock; operations from
/// multiple threads serialize, and each runs to completion (or failure)
/// before returning. Sequential operations observe read-after-write
/// consistency.
///
/// # In-Memory Engines
///
/// For testing, use `StorageEngine::open_in_memory()`.
pub struct StorageEngine {
    /// Namespace directory (holds the lock). None for in-memory engines.
    dir: Option<StoreDir>,
    /// The selected backend; fixed for the engine's lifetime.
    store: Mutex<Box<dyn ItemStore>>,
    /// Which scheme `store` is.
    selection: BackendSelection,
}

impl StorageEngine {
    /// Opens an engine under the given application data root with the
    /// default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace directory cannot be prepared,
    /// another engine holds its lock, or the plain fallback itself cannot
    /// be constructed. Encryption setup failures are not errors; they
    /// select the plain scheme.
    pub fn open(root: &Path) -> EngineResult<Self> {
        Self::open_with_config(root, Config::default())
    }

    /// Opens an engine under the given application data root.
    ///
    /// The store lives in `<root>/<namespace>/`; repeated opens with the
    /// same root and namespace resolve to the same store.
    ///
    /// # Errors
    ///
    /// See [`open`](Self::open).
    pub fn open_with_config(root: &Path, config: Config) -> EngineResult<Self> {
        let dir = StoreDir::open(&root.join(&config.namespace))?;

        let (store, selection): (Box<dyn ItemStore>, _) =
            match Self::open_encrypted(&dir, &config) {
                Ok(encrypted) => (Box::new(encrypted), BackendSelection::Encrypted),
                Err(err) => {
                    warn!(
                        "encrypted storage initialization failed, \
                         falling back to plain storage: {err}"
                    );
                    let plain = PlainStore::open(&dir.plain_store_path(), config.sync_on_commit)?;
                    (Box::new(plain), BackendSelection::Plain)
                }
            };

        Ok(Self {
            dir: Some(dir),
            store: Mutex::new(store),
            selection,
        })
    }

    /// Opens an engine over a pre-configured store.
    ///
    /// This is a lower-level constructor for when you have already built a
    /// backend; it skips namespace management and locking. For most use
    /// cases, prefer [`open`](Self::open).
    #[must_use]
    pub fn open_with_store(store: Box<dyn ItemStore>, selection: BackendSelection) -> Self {
        Self {
            dir: None,
            store: Mutex::new(store),
            selection,
        }
    }

    /// Opens a fresh in-memory engine for testing.
    ///
    /// The store is encrypted under a randomly generated master key and
    /// lost when the engine is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if cipher derivation fails.
    pub fn open_in_memory() -> EngineResult<Self> {
        use crate::keys::MasterKey;
        use lockbox_storage::MemoryBackend;

        let master = MasterKey::generate();
        let store = EncryptedStore::new(Box::new(MemoryBackend::new()), &master)?;
        Ok(Self::open_with_store(
            Box::new(store),
            BackendSelection::Encrypted,
        ))
    }

    fn open_encrypted(dir: &StoreDir, config: &Config) -> EngineResult<EncryptedStore> {
        let master = KeyManager::new(dir.master_key_path()).obtain_master_key()?;
        EncryptedStore::open(&dir.encrypted_store_path(), &master, config.sync_on_commit)
    }

    /// Returns which storage scheme this engine selected at construction.
    #[must_use]
    pub fn selection(&self) -> BackendSelection {
        self.selection
    }

    /// Returns the namespace directory path, if this engine owns one.
    #[must_use]
    pub fn namespace_path(&self) -> Option<&Path> {
        self.dir.as_ref().map(StoreDir::path)
    }

    /// Stores `value` under `key` and durably commits.
    ///
    /// Returns the stored value, so completion layers can report it
    /// without retaining their inputs.
    ///
    /// # Errors
    ///
    /// Returns `Write` if the commit fails.
    pub fn set_item(&self, key: &str, value: &str) -> EngineResult<String> {
        self.store.lock().put(key, value)?;
        Ok(value.to_string())
    }

    /// Returns the value stored under `key`, or `None` if absent.
    ///
    /// An absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `Corruption` if the stored entry fails authentication.
    pub fn get_item(&self, key: &str) -> EngineResult<Option<String>> {
        self.store.lock().get(key)
    }

    /// Returns every key in the store. Order is not guaranteed.
    pub fn get_all_keys(&self) -> EngineResult<Vec<String>> {
        self.store.lock().keys()
    }

    /// Returns every (key, value) pair in the store, one per entry.
    /// Order is not guaranteed.
    pub fn get_all_keys_and_values(&self) -> EngineResult<Vec<(String, String)>> {
        self.store.lock().entries()
    }

    /// Imports a batch of entries from a serialized JSON payload.
    ///
    /// The payload must be a flat JSON object whose values are all
    /// strings. The whole payload is validated before anything is
    /// written, then each pair is applied as an individually committed
    /// write in payload order.
    ///
    /// # Errors
    ///
    /// - `Parse` if the payload is not a flat string-to-string object;
    ///   the store is unchanged.
    /// - `Write` if an individual commit fails partway; prior pairs in
    ///   the batch remain applied (no rollback). Callers needing
    ///   all-or-nothing semantics must handle partial-failure recovery
    ///   themselves.
    pub fn save(&self, payload: &str) -> EngineResult<()> {
        let batch = parse_batch(payload)?;

        let mut store = self.store.lock();
        for (key, value) in &batch {
            store.put(key, value)?;
        }

        Ok(())
    }

    /// Removes the entry under `key`, if any, and durably commits.
    ///
    /// Returns the key, so completion layers can report it without
    /// retaining their inputs. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `Write` if the commit fails.
    pub fn remove_item(&self, key: &str) -> EngineResult<String> {
        self.store.lock().remove(key)?;
        Ok(key.to_string())
    }

    /// Removes every entry and durably commits.
    ///
    /// Clearing an empty store succeeds.
    ///
    /// # Errors
    ///
    /// Returns `Write` if the commit fails.
    pub fn clear(&self) -> EngineResult<()> {
        self.store.lock().clear()
    }
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("selection", &self.selection)
            .field("namespace", &self.namespace_path())
            .finish_non_exhaustive()
    }
}

/// Parses a batch payload into (key, value) pairs in payload order.
fn parse_batch(payload: &str) -> EngineResult<Vec<(String, String)>> {
    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| EngineError::parse(format!("invalid batch payload: {e}")))?;

    let object = match value {
        serde_json::Value::Object(map) => map,
        other => {
            return Err(EngineError::parse(format!(
                "batch payload must be a JSON object, got {}",
                json_type_name(&other)
            )))
        }
    };

    let mut batch = Vec::with_capacity(object.len());
    for (key, value) in object {
        match value {
            serde_json::Value::String(s) => batch.push((key, s)),
            other => {
                return Err(EngineError::parse(format!(
                    "value for {key:?} must be a string, got {}",
                    json_type_name(&other)
                )))
            }
        }
    }

    Ok(batch)
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
