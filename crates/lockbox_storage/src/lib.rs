//! # Lockbox Storage
//!
//! Durable key-value backend trait and implementations for Lockbox.
//!
//! This crate provides the lowest-level storage abstraction for Lockbox.
//! Backends are **opaque byte maps** - they do not interpret the keys or
//! values they store, and in particular do not know whether the bytes they
//! hold are ciphertext or plaintext.
//!
//! ## Design Principles
//!
//! - Backends are simple byte maps (get, put, remove, enumerate)
//! - Mutations are buffered in memory; `commit` is the only durability point
//! - Must be `Send + Sync` for concurrent access
//! - Lockbox owns all interpretation of keys and values
//!
//! ## Available Backends
//!
//! - [`MemoryBackend`] - For testing and ephemeral storage
//! - [`FileBackend`] - For persistent storage using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use lockbox_storage::{KvBackend, MemoryBackend};
//!
//! let mut backend = MemoryBackend::new();
//! backend.put(b"greeting", b"hello").unwrap();
//! backend.commit().unwrap();
//! assert_eq!(backend.get(b"greeting").unwrap(), Some(b"hello".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::KvBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::MemoryBackend;
