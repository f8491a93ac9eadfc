//! Index file (`main_file_cache.idx<N>`) management
//!
//! An index is an ordered list of [`IndexEntry`] values. The position of an
//! entry is its entry number, which callers use to address a resource, so
//! entries are only ever replaced in place or appended at the end.
//!
//! Each index tracks whether its entries still match what was loaded from
//! disk through [`IndexState`]. Only [`Index::set`] and [`Index::append`]
//! can move an index from `Clean` to `Dirty`; a value-equal replacement
//! leaves the state untouched.

mod decoder;
mod entry;

pub use decoder::IndexDecoder;
pub use entry::{IndexEntry, MAX_FIELD_VALUE, RECORD_SIZE};

use crate::{FileStoreError, Result};
use std::iter::FusedIterator;
use std::slice;

/// Whether an index has diverged from its on-disk bytes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum IndexState {
    /// Entries match what was loaded or last persisted
    #[default]
    Clean,
    /// Entries have been replaced or appended since then
    Dirty,
}

/// Ordered, mutable collection of entries loaded from one index file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    /// Position of the index file in discovery order
    id: u32,
    /// Entries in on-disk order
    entries: Vec<IndexEntry>,
    /// Size of the index file's own bytes
    byte_length: usize,
    /// Change tracking
    state: IndexState,
}

impl Index {
    /// Create a clean index from already decoded entries.
    pub fn new(id: u32, entries: Vec<IndexEntry>, byte_length: usize) -> Self {
        Self {
            id,
            entries,
            byte_length,
            state: IndexState::Clean,
        }
    }

    /// Identifier of this index (its discovery position)
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Size in bytes of the index file this index was decoded from
    pub const fn byte_length(&self) -> usize {
        self.byte_length
    }

    /// Get the entry at `entry_number`.
    ///
    /// # Errors
    ///
    /// Returns [`FileStoreError::EntryNotFound`] if `entry_number` is not
    /// below [`len`](Self::len).
    pub fn get(&self, entry_number: usize) -> Result<IndexEntry> {
        self.entries
            .get(entry_number)
            .copied()
            .ok_or_else(|| self.entry_not_found(entry_number))
    }

    /// Replace the entry at `entry_number`, returning the previous entry.
    ///
    /// The index becomes dirty only if `entry` differs from the previous
    /// entry by value.
    ///
    /// # Errors
    ///
    /// Returns [`FileStoreError::EntryNotFound`] if `entry_number` is not
    /// below [`len`](Self::len).
    pub fn set(&mut self, entry_number: usize, entry: IndexEntry) -> Result<IndexEntry> {
        let not_found = self.entry_not_found(entry_number);
        let slot = self.entries.get_mut(entry_number).ok_or(not_found)?;

        let previous = std::mem::replace(slot, entry);
        if previous != entry {
            self.state = IndexState::Dirty;
        }

        Ok(previous)
    }

    /// Append an entry, returning its entry number.
    ///
    /// Appending always marks the index dirty.
    pub fn append(&mut self, entry: IndexEntry) -> usize {
        self.entries.push(entry);
        self.state = IndexState::Dirty;
        self.entries.len() - 1
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current change-tracking state
    pub const fn state(&self) -> IndexState {
        self.state
    }

    /// Whether the entries have changed since load
    pub fn is_dirty(&self) -> bool {
        self.state == IndexState::Dirty
    }

    /// Read-only view of the entries in stored order
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Iterate over the entries in stored order
    pub fn iter(&self) -> Entries<'_> {
        Entries {
            inner: self.entries.iter(),
        }
    }

    /// Record that the entries were written back as `byte_length` bytes.
    pub(crate) fn mark_persisted(&mut self, byte_length: usize) {
        self.byte_length = byte_length;
        self.state = IndexState::Clean;
    }

    fn entry_not_found(&self, entry_number: usize) -> FileStoreError {
        FileStoreError::EntryNotFound {
            index: self.id,
            entry: entry_number,
            size: self.entries.len(),
        }
    }
}

impl<'a> IntoIterator for &'a Index {
    type Item = &'a IndexEntry;
    type IntoIter = Entries<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Borrowing iterator over the entries of an [`Index`]
#[derive(Debug, Clone)]
pub struct Entries<'a> {
    inner: slice::Iter<'a, IndexEntry>,
}

impl<'a> Iterator for Entries<'a> {
    type Item = &'a IndexEntry;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Entries<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl ExactSizeIterator for Entries<'_> {}

impl FusedIterator for Entries<'_> {}
