//! Top-level file store
//!
//! Loading is all-or-nothing: the directory is validated, the data file is
//! opened, and every index file is decoded before a [`FileStore`] is
//! returned. Any failure along the way aborts the whole load.

use crate::byte_source::ByteSource;
use crate::config::FileStoreConfig;
use crate::discovery::{is_index_file_name, sort_index_names};
use crate::index::{Index, IndexDecoder};
use crate::{DATA_FILE_NAME, FileStoreError, Result};
use bytes::Bytes;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};

/// A loaded `main_file_cache` file store
#[derive(Debug)]
pub struct FileStore {
    /// Directory the store was loaded from
    directory: PathBuf,
    /// Shared view over `main_file_cache.dat`
    data: ByteSource,
    /// Indices in discovery order
    indices: Vec<Index>,
    /// Index file each index was decoded from, by position
    index_paths: Vec<PathBuf>,
}

impl FileStore {
    /// Load the file store in `directory` with default settings.
    ///
    /// # Errors
    ///
    /// See [`load_with_config`](Self::load_with_config).
    pub fn load(directory: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_config(&FileStoreConfig::new(directory))
    }

    /// Load a file store.
    ///
    /// Index files are sorted according to `config.discovery_order` and
    /// each gets its sorted position as id.
    ///
    /// # Errors
    ///
    /// - [`FileStoreError::NotADirectory`] if the configured path is not a
    ///   directory
    /// - [`FileStoreError::DataFileMissing`] if `main_file_cache.dat` is absent
    /// - [`FileStoreError::NotFound`] if the data file cannot be opened
    /// - [`FileStoreError::MalformedIndex`] if any index file is corrupt
    /// - [`FileStoreError::Io`] if the directory or an index file cannot be read
    pub fn load_with_config(config: &FileStoreConfig) -> Result<Self> {
        let directory = config.directory.as_path();
        info!("Loading file store from {}", directory.display());

        let data_path = Self::valid_data_path(directory)?;
        let data = ByteSource::open_with(&data_path, config.use_memory_mapping)?;

        let mut names = Self::index_file_names(directory)?;
        sort_index_names(&mut names, config.discovery_order);

        let mut indices = Vec::with_capacity(names.len());
        let mut index_paths = Vec::with_capacity(names.len());

        for (position, name) in names.iter().enumerate() {
            let id = u32::try_from(position).map_err(|_| {
                FileStoreError::MalformedIndex(format!("too many index files at {name}"))
            })?;
            let path = directory.join(name);

            let bytes = std::fs::read(&path)?;
            let index = IndexDecoder::decode(id, &bytes)?;
            debug!(
                "Loaded index {} from {}: {} entries ({} bytes)",
                id,
                name,
                index.len(),
                index.byte_length()
            );

            indices.push(index);
            index_paths.push(path);
        }

        info!(
            "Loaded {} indices over {} data bytes",
            indices.len(),
            data.len()
        );

        Ok(Self {
            directory: directory.to_path_buf(),
            data,
            indices,
            index_paths,
        })
    }

    /// Validate the store directory and return the data file path.
    fn valid_data_path(directory: &Path) -> Result<PathBuf> {
        if !directory.is_dir() {
            return Err(FileStoreError::NotADirectory(directory.to_path_buf()));
        }

        let data_path = directory.join(DATA_FILE_NAME);
        if !data_path.exists() {
            return Err(FileStoreError::DataFileMissing(directory.to_path_buf()));
        }

        Ok(data_path)
    }

    /// Names of all index files in `directory`, unsorted.
    fn index_file_names(directory: &Path) -> Result<Vec<String>> {
        let mut names = Vec::new();

        for entry in std::fs::read_dir(directory)? {
            let entry = entry?;
            let Ok(name) = entry.file_name().into_string() else {
                trace!("Skipping non UTF-8 entry {}", entry.path().display());
                continue;
            };

            if is_index_file_name(&name) {
                names.push(name);
            } else {
                trace!("Skipping {}", name);
            }
        }

        Ok(names)
    }

    /// Number of loaded indices
    pub fn count(&self) -> usize {
        self.indices.len()
    }

    /// Whether no index files were found
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Get the index at `position` in discovery order.
    ///
    /// # Errors
    ///
    /// Returns [`FileStoreError::IndexOutOfRange`] if `position` is not below
    /// [`count`](Self::count).
    pub fn get_index(&self, position: usize) -> Result<&Index> {
        let count = self.count();
        self.indices
            .get(position)
            .ok_or(FileStoreError::IndexOutOfRange { position, count })
    }

    /// Get the index at `position` for editing.
    ///
    /// # Errors
    ///
    /// Returns [`FileStoreError::IndexOutOfRange`] if `position` is not below
    /// [`count`](Self::count).
    pub fn get_index_mut(&mut self, position: usize) -> Result<&mut Index> {
        let count = self.count();
        self.indices
            .get_mut(position)
            .ok_or(FileStoreError::IndexOutOfRange { position, count })
    }

    /// Iterate over all indices in discovery order
    pub fn indices(&self) -> impl ExactSizeIterator<Item = &Index> {
        self.indices.iter()
    }

    /// Iterate over indices with unsaved changes
    pub fn dirty_indices(&self) -> impl Iterator<Item = &Index> {
        self.indices.iter().filter(|index| index.is_dirty())
    }

    /// Shared view over the data file
    pub fn data(&self) -> &ByteSource {
        &self.data
    }

    /// Directory the store was loaded from
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the index file behind the index at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`FileStoreError::IndexOutOfRange`] if `position` is not below
    /// [`count`](Self::count).
    pub fn index_path(&self, position: usize) -> Result<&Path> {
        let count = self.count();
        self.index_paths
            .get(position)
            .map(PathBuf::as_path)
            .ok_or(FileStoreError::IndexOutOfRange { position, count })
    }

    /// Slice the raw data-file bytes for one entry.
    ///
    /// # Errors
    ///
    /// Fails with the lookup error of whichever step is out of range:
    /// [`FileStoreError::IndexOutOfRange`], [`FileStoreError::EntryNotFound`]
    /// or [`FileStoreError::OutOfRange`].
    pub fn read_entry(&self, position: usize, entry_number: usize) -> Result<Bytes> {
        let entry = self.get_index(position)?.get(entry_number)?;
        self.data.read_entry(&entry)
    }

    /// Write every dirty index back to its index file.
    ///
    /// Each file is replaced atomically (temp file, fsync, rename) and the
    /// index returns to the clean state. Returns the ids that were written.
    ///
    /// # Errors
    ///
    /// Returns [`FileStoreError::EntryOverflow`] if an entry cannot be
    /// encoded, or [`FileStoreError::Io`] if writing fails. Indices written
    /// before the failure stay clean; the failing one and any after it stay
    /// dirty.
    pub fn persist_dirty(&mut self) -> Result<Vec<u32>> {
        let mut written = Vec::new();

        for (index, path) in self.indices.iter_mut().zip(&self.index_paths) {
            if !index.is_dirty() {
                continue;
            }

            let data = IndexDecoder::encode(index)?;
            Self::write_atomic(path, &data)?;
            index.mark_persisted(data.len());

            debug!(
                "Persisted index {} to {} ({} entries)",
                index.id(),
                path.display(),
                index.len()
            );
            written.push(index.id());
        }

        if !written.is_empty() {
            info!("Persisted {} dirty indices", written.len());
        }

        Ok(written)
    }

    /// Replace `path` with `data` via a sibling `.tmp` file.
    fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
        let mut temp_name = path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        let result = Self::write_synced(&temp_path, data)
            .and_then(|()| std::fs::rename(&temp_path, path));

        if let Err(e) = result {
            warn!("Failed to write {}: {}", path.display(), e);
            let _ = std::fs::remove_file(&temp_path);
            return Err(e.into());
        }

        Ok(())
    }

    fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(data)?;
        file.sync_all()
    }
}
