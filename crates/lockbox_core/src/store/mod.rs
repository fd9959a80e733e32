//! Storage scheme implementations.
//!
//! The engine selects one of two schemes at construction time: the
//! encrypted scheme, or the plain scheme it permanently falls back to when
//! encryption setup fails. Both implement [`ItemStore`].

mod encrypted;
mod plain;

pub use encrypted::EncryptedStore;
pub use plain::PlainStore;

use crate::error::EngineResult;

/// The string-level contract shared by the encrypted and plain schemes.
///
/// # Invariants
///
/// - `get` returns exactly the string previously `put` under that key
/// - Keys are unique; `put` on an existing key replaces its value
/// - Every mutation (`put`, `remove`, `clear`) durably commits before
///   returning success - the store never reports success for a write that
///   would not survive an immediate process crash
/// - Enumeration order is the backing map's order and carries no guarantee
pub trait ItemStore: Send {
    /// Returns the value stored under `key`, if any.
    ///
    /// An absent key is not an error.
    fn get(&self, key: &str) -> EngineResult<Option<String>>;

    /// Stores `value` under `key` and commits.
    fn put(&mut self, key: &str, value: &str) -> EngineResult<()>;

    /// Removes the entry under `key`, if any, and commits.
    ///
    /// Removing an absent key succeeds.
    fn remove(&mut self, key: &str) -> EngineResult<()>;

    /// Removes every entry and commits.
    fn clear(&mut self) -> EngineResult<()>;

    /// Returns every key in the store.
    fn keys(&self) -> EngineResult<Vec<String>>;

    /// Returns every (key, value) pair in the store.
    fn entries(&self) -> EngineResult<Vec<(String, String)>>;
}
