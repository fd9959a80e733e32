//! Engine configuration.

/// Default namespace identifier.
///
/// Repeated launches of the same application with the same root directory
/// and namespace resolve to the same store.
pub const DEFAULT_NAMESPACE: &str = "lockbox";

/// Configuration for opening a storage engine.
#[derive(Debug, Clone)]
pub struct Config {
    /// Namespace identifier; names the directory holding this store's
    /// files, isolating it from other stores under the same root.
    pub namespace: String,

    /// Whether to fsync on every commit (safer but slower).
    ///
    /// Defaults to true. Disabling trades crash durability for speed and
    /// is only suitable for throwaway stores.
    pub sync_on_commit: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            sync_on_commit: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the namespace identifier.
    #[must_use]
    pub fn namespace(mut self, value: impl Into<String>) -> Self {
        self.namespace = value.into();
        self
    }

    /// Sets whether to fsync on every commit.
    #[must_use]
    pub fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }
}
