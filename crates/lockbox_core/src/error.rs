//! Error types for the Lockbox engine.

use std::io;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur in Lockbox engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] lockbox_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Master key material could not be created or retrieved.
    ///
    /// Handled internally: the engine falls back to plain storage and
    /// never surfaces this to the caller.
    #[error("key initialization failed: {message}")]
    KeyInitialization {
        /// Description of the failure.
        message: String,
    },

    /// The encrypted store could not be opened even with a valid key.
    ///
    /// Handled internally: the engine falls back to plain storage and
    /// never surfaces this to the caller.
    #[error("encrypted backend initialization failed: {message}")]
    BackendInit {
        /// Description of the failure.
        message: String,
    },

    /// Another engine holds the namespace lock.
    #[error("namespace locked: another engine has exclusive access")]
    NamespaceLocked,

    /// A batch-import payload could not be parsed.
    #[error("parse error: {message}")]
    Parse {
        /// Description of what was malformed.
        message: String,
    },

    /// An individual commit failed.
    #[error("write failed: {message}")]
    Write {
        /// Description of the failure.
        message: String,
    },

    /// Stored data failed authentication or validation on read.
    #[error("data corruption: {message}")]
    Corruption {
        /// Description of the corruption.
        message: String,
    },
}

impl EngineError {
    /// Creates a key initialization error.
    pub fn key_initialization(message: impl Into<String>) -> Self {
        Self::KeyInitialization {
            message: message.into(),
        }
    }

    /// Creates a backend initialization error.
    pub fn backend_init(message: impl Into<String>) -> Self {
        Self::BackendInit {
            message: message.into(),
        }
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Creates a write error.
    pub fn write(message: impl Into<String>) -> Self {
        Self::Write {
            message: message.into(),
        }
    }

    /// Creates a corruption error.
    pub fn corruption(message: impl Into<String>) -> Self {
        Self::Corruption {
            message: message.into(),
        }
    }
}
