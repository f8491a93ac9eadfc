//! Configuration for loading a file store

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Order in which discovered index files are assigned ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryOrder {
    /// Sort by the full file name string, so `idx10` sorts before `idx2`.
    ///
    /// This is the order existing tooling relies on and stays the default.
    #[default]
    Lexicographic,
    /// Sort by the numeric suffix, so `idx2` sorts before `idx10`.
    Numeric,
}

/// Configuration for a file store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileStoreConfig {
    /// Directory holding `main_file_cache.dat` and the index files
    pub directory: PathBuf,

    /// How discovered index files are ordered
    #[serde(default)]
    pub discovery_order: DiscoveryOrder,

    /// Memory-map the data file instead of reading it into memory
    #[serde(default = "default_use_memory_mapping")]
    pub use_memory_mapping: bool,
}

const fn default_use_memory_mapping() -> bool {
    true
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./cache"),
            discovery_order: DiscoveryOrder::default(),
            use_memory_mapping: default_use_memory_mapping(),
        }
    }
}

impl FileStoreConfig {
    /// Create a new configuration for the given store directory
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Set the store directory
    #[must_use]
    pub fn with_directory<P: AsRef<Path>>(mut self, directory: P) -> Self {
        self.directory = directory.as_ref().to_path_buf();
        self
    }

    /// Set the index discovery order
    #[must_use]
    pub const fn with_discovery_order(mut self, order: DiscoveryOrder) -> Self {
        self.discovery_order = order;
        self
    }

    /// Enable or disable memory mapping of the data file
    #[must_use]
    pub const fn with_memory_mapping(mut self, enable: bool) -> Self {
        self.use_memory_mapping = enable;
        self
    }
}
