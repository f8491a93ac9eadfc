//! Reader and editor model for legacy RS2 `main_file_cache` file stores.
//!
//! A file store is one monolithic data file plus a set of companion index
//! files living side by side in a single directory:
//!
//! - `main_file_cache.dat`: 520-byte sectors holding resource bytes
//! - `main_file_cache.idx<N>`: flat arrays of 6-byte records, each naming
//!   the length and starting sector of one resource
//!
//! This crate discovers and validates that layout, decodes every index file
//! into an ordered [`Index`] of [`IndexEntry`] values and tracks, per index,
//! whether the in-memory entries have diverged from what is on disk. Turning
//! the bytes an entry points at into a usable resource is left to the
//! archive layer sitting on top of [`ByteSource`].
//!
//! # Example
//!
//! ```rust,no_run
//! use rs2_filestore::{FileStore, IndexEntry};
//!
//! # fn example() -> rs2_filestore::Result<()> {
//! let mut store = FileStore::load("/path/to/cache")?;
//!
//! let models = store.get_index(1)?;
//! println!("index {} holds {} entries", models.id(), models.len());
//!
//! let index = store.get_index_mut(1)?;
//! index.set(0, IndexEntry::new(42, 1_024))?;
//! assert!(index.is_dirty());
//!
//! store.persist_dirty()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![allow(clippy::must_use_candidate)]

use std::path::PathBuf;
use thiserror::Error;

// Read-only view over the data file
pub mod byte_source;

// Store configuration
pub mod config;

// Index file name matching and ordering
pub mod discovery;

// Index entries, decoding and change tracking
pub mod index;

// Top-level store aggregate
mod store;

pub use byte_source::ByteSource;
pub use config::{DiscoveryOrder, FileStoreConfig};
pub use index::{Index, IndexDecoder, IndexEntry, IndexState};
pub use store::FileStore;

/// Result type for file store operations.
pub type Result<T> = std::result::Result<T, FileStoreError>;

/// Errors that can occur while loading or editing a file store.
#[derive(Debug, Error)]
pub enum FileStoreError {
    /// I/O error while listing the directory or reading an index file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The store path does not name a directory.
    #[error("{}: invalid path specified, must be a directory", .0.display())]
    NotADirectory(PathBuf),

    /// The directory has no `main_file_cache.dat`.
    #[error("{}: invalid path specified, must contain data and index files", .0.display())]
    DataFileMissing(PathBuf),

    /// A byte source could not be opened.
    #[error("{}: file not found or not readable: {source}", path.display())]
    NotFound {
        /// Path that failed to open
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// An index file's record stream is truncated or invalid.
    #[error("Malformed index: {0}")]
    MalformedIndex(String),

    /// Entry lookup outside `[0, len)`.
    #[error("Entry {entry} not found in index {index} (size {size})")]
    EntryNotFound {
        /// Index id
        index: u32,
        /// Requested entry number
        entry: usize,
        /// Entry count at the time of the lookup
        size: usize,
    },

    /// Index lookup outside `[0, count)`.
    #[error("Index position {position} out of range (count {count})")]
    IndexOutOfRange {
        /// Requested position
        position: usize,
        /// Number of loaded indices
        count: usize,
    },

    /// Byte source slice past the end of the source.
    #[error("Read beyond source bounds: offset={offset}, length={length}, size={size}")]
    OutOfRange {
        /// Requested start offset
        offset: u64,
        /// Requested length
        length: u64,
        /// Total size of the source
        size: u64,
    },

    /// An entry field does not fit the 24-bit on-disk encoding.
    #[error("Entry {entry} in index {index} does not fit a 24-bit record field: {value}")]
    EntryOverflow {
        /// Index id
        index: u32,
        /// Entry number
        entry: usize,
        /// Offending field value
        value: u32,
    },
}

impl FileStoreError {
    /// Whether this error is a caller lookup error against the current store
    /// state rather than a sign of corrupt or missing on-disk data.
    pub const fn is_lookup_error(&self) -> bool {
        matches!(
            self,
            Self::EntryNotFound { .. } | Self::IndexOutOfRange { .. } | Self::OutOfRange { .. }
        )
    }
}

/// Version information for this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Data file name inside the store directory.
pub const DATA_FILE_NAME: &str = "main_file_cache.dat";

/// Prefix shared by every index file name; followed by one or more digits.
pub const INDEX_FILE_PREFIX: &str = "main_file_cache.idx";

/// Size in bytes of one sector of the data file.
pub const SECTOR_SIZE: u64 = 520;
