//! Read-only, bounds-checked view over the data file
//!
//! The view is backed by a memory map when possible and by an in-memory copy
//! otherwise. Either way the bytes live in a shared [`Bytes`] handle, so
//! clones and slices are cheap and safe to hand to other threads.

use crate::index::IndexEntry;
use crate::{FileStoreError, Result};
use bytes::Bytes;
use memmap2::MmapOptions;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Immutable view over the bytes of a file
#[derive(Clone)]
pub struct ByteSource {
    /// Path the bytes were read from
    path: PathBuf,
    /// File contents
    data: Bytes,
}

impl fmt::Debug for ByteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteSource")
            .field("path", &self.path)
            .field("len", &self.data.len())
            .finish()
    }
}

impl ByteSource {
    /// Open a file, memory-mapping it when possible.
    ///
    /// # Errors
    ///
    /// Returns [`FileStoreError::NotFound`] if the path does not exist or is
    /// not readable.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, true)
    }

    /// Open a file, choosing whether to memory-map it.
    ///
    /// Empty files are never mapped.
    ///
    /// # Errors
    ///
    /// Returns [`FileStoreError::NotFound`] if the path does not exist or is
    /// not readable.
    pub fn open_with(path: impl AsRef<Path>, use_memory_mapping: bool) -> Result<Self> {
        let path = path.as_ref();
        let not_found = |source| FileStoreError::NotFound {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(not_found)?;
        let size = file.metadata().map_err(not_found)?.len();

        let data = if use_memory_mapping && size > 0 {
            // The data file is opened read-only and never written while the
            // store holds it.
            #[allow(unsafe_code)]
            let mmap = unsafe { MmapOptions::new().map(&file).map_err(not_found)? };
            debug!("Memory-mapped {} ({} bytes)", path.display(), size);
            Bytes::from_owner(mmap)
        } else {
            let data = std::fs::read(path).map_err(not_found)?;
            debug!("Read {} into memory ({} bytes)", path.display(), data.len());
            Bytes::from(data)
        };

        Ok(Self {
            path: path.to_path_buf(),
            data,
        })
    }

    /// Wrap bytes that are already in memory.
    pub fn from_bytes(path: impl Into<PathBuf>, data: impl Into<Bytes>) -> Self {
        Self {
            path: path.into(),
            data: data.into(),
        }
    }

    /// Slice `length` bytes starting at `offset` without copying.
    ///
    /// # Errors
    ///
    /// Returns [`FileStoreError::OutOfRange`] if `offset + length` overflows
    /// or exceeds the size of the source.
    pub fn slice(&self, offset: u64, length: u64) -> Result<Bytes> {
        let size = self.len();
        let out_of_range = || FileStoreError::OutOfRange {
            offset,
            length,
            size,
        };

        let end = offset.checked_add(length).ok_or_else(out_of_range)?;
        if end > size {
            return Err(out_of_range());
        }

        let start = usize::try_from(offset).map_err(|_| out_of_range())?;
        let end = usize::try_from(end).map_err(|_| out_of_range())?;
        Ok(self.data.slice(start..end))
    }

    /// Slice the byte range an index entry points at.
    ///
    /// The range starts at the entry's first sector and spans its length.
    /// Sector headers inside the range are not stripped; that is the archive
    /// layer's job.
    ///
    /// # Errors
    ///
    /// Returns [`FileStoreError::OutOfRange`] if the range exceeds the source.
    pub fn read_entry(&self, entry: &IndexEntry) -> Result<Bytes> {
        self.slice(entry.offset(), u64::from(entry.length()))
    }

    /// Total size in bytes
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    /// Whether the source holds no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// All bytes of the source
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Path the source was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }
}
