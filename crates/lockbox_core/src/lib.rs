//! # Lockbox Core
//!
//! Encrypted key-value storage engine for Lockbox.
//!
//! This crate provides:
//! - Master-key lifecycle management backed by a per-namespace key file
//! - An encrypted store (AES-256-GCM, deterministic key encryption for
//!   lookup, randomized value encryption)
//! - A plain store used as a permanent fallback when encryption setup fails
//! - The [`StorageEngine`] facade exposing string-keyed CRUD, enumeration,
//!   and batch import
//!
//! ## Example
//!
//! ```rust,ignore
//! use lockbox_core::StorageEngine;
//! use std::path::Path;
//!
//! let engine = StorageEngine::open(Path::new("/data/app"))?;
//! engine.set_item("session", "token")?;
//! assert_eq!(engine.get_item("session")?, Some("token".to_string()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod crypto;
mod dir;
mod engine;
mod error;
mod keys;
mod store;

pub use config::{Config, DEFAULT_NAMESPACE};
pub use dir::StoreDir;
pub use engine::{BackendSelection, StorageEngine};
pub use error::{EngineError, EngineResult};
pub use keys::{KeyManager, MasterKey};
pub use store::{EncryptedStore, ItemStore, PlainStore};
