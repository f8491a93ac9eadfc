//! Decoding and encoding of raw index file bytes
//!
//! Both directions are pure: they take bytes or an [`Index`] and never touch
//! the filesystem or the data file.

use super::entry::{IndexEntry, RECORD_SIZE};
use super::Index;
use crate::{FileStoreError, Result};
use binrw::{BinRead, BinWrite};
use std::io::Cursor;
use tracing::trace;

/// Stateless codec between index file bytes and [`Index`] values
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexDecoder;

impl IndexDecoder {
    /// Decode the raw bytes of one index file into an index with the given id.
    ///
    /// Entries keep the order of their records in `data`, and the resulting
    /// index records `data.len()` as its byte length.
    ///
    /// # Errors
    ///
    /// Returns [`FileStoreError::MalformedIndex`] if `data` is not a whole
    /// number of 6-byte records.
    pub fn decode(id: u32, data: &[u8]) -> Result<Index> {
        let trailing = data.len() % RECORD_SIZE;
        if trailing != 0 {
            return Err(FileStoreError::MalformedIndex(format!(
                "index {id}: {} bytes is not a multiple of the {RECORD_SIZE}-byte record size \
                 ({trailing} trailing bytes)",
                data.len()
            )));
        }

        let count = data.len() / RECORD_SIZE;
        let mut cursor = Cursor::new(data);
        let mut entries = Vec::with_capacity(count);

        for entry_number in 0..count {
            let entry = IndexEntry::read_be(&mut cursor).map_err(|e| {
                FileStoreError::MalformedIndex(format!(
                    "index {id}: failed to read entry {entry_number}: {e}"
                ))
            })?;
            entries.push(entry);
        }

        trace!("Decoded index {} with {} entries", id, entries.len());

        Ok(Index::new(id, entries, data.len()))
    }

    /// Encode an index back into its on-disk record stream.
    ///
    /// # Errors
    ///
    /// Returns [`FileStoreError::EntryOverflow`] if any entry field does not
    /// fit in 24 bits.
    pub fn encode(index: &Index) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(index.len() * RECORD_SIZE);
        let mut cursor = Cursor::new(&mut data);

        for (entry_number, entry) in index.iter().enumerate() {
            if !entry.is_encodable() {
                return Err(FileStoreError::EntryOverflow {
                    index: index.id(),
                    entry: entry_number,
                    value: entry.length().max(entry.sector()),
                });
            }

            entry.write_be(&mut cursor).map_err(|e| {
                FileStoreError::MalformedIndex(format!(
                    "index {}: failed to write entry {entry_number}: {e}",
                    index.id()
                ))
            })?;
        }

        Ok(data)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use proptest::test_runner::TestCaseError;

    fn record(length: u32, sector: u32) -> [u8; RECORD_SIZE] {
        let l = length.to_be_bytes();
        let s = sector.to_be_bytes();
        [l[1], l[2], l[3], s[1], s[2], s[3]]
    }

    fn index_bytes(pairs: &[(u32, u32)]) -> Vec<u8> {
        pairs
            .iter()
            .flat_map(|&(sector, length)| record(length, sector))
            .collect()
    }

    /// (sector, length) pairs that fit the 24-bit fields
    fn entry_pairs() -> impl Strategy<Value = Vec<(u32, u32)>> {
        prop::collection::vec((0u32..=0x00FF_FFFF, 0u32..=0x00FF_FFFF), 0..64)
    }

    #[test]
    fn test_decode_known_sequence() {
        let pairs = [(1, 100), (7, 0), (0x00AB_CDEF, 0x0012_3456)];
        let index = IndexDecoder::decode(3, &index_bytes(&pairs)).expect("valid index");

        let expected: Vec<IndexEntry> = pairs
            .iter()
            .map(|&(sector, length)| IndexEntry::new(sector, length))
            .collect();

        assert_eq!(index.id(), 3);
        assert_eq!(index.len(), 3);
        assert_eq!(index.byte_length(), 18);
        assert_eq!(index.entries(), expected.as_slice());
        assert!(!index.is_dirty());
    }

    #[test]
    fn test_decode_empty() {
        let index = IndexDecoder::decode(0, &[]).expect("empty index is valid");
        assert!(index.is_empty());
        assert_eq!(index.byte_length(), 0);
    }

    #[test]
    fn test_decode_truncated_record() {
        let mut data = index_bytes(&[(1, 2), (3, 4)]);
        data.pop();

        let err = IndexDecoder::decode(0, &data).expect_err("truncated record must fail");
        assert!(matches!(err, FileStoreError::MalformedIndex(_)));
    }

    #[test]
    fn test_encode_rejects_wide_fields() {
        let mut index = IndexDecoder::decode(5, &index_bytes(&[(1, 2)])).expect("valid index");
        index.append(IndexEntry::new(0x0100_0000, 1));

        let err = IndexDecoder::encode(&index).expect_err("wide sector must fail");
        assert!(matches!(
            err,
            FileStoreError::EntryOverflow {
                index: 5,
                entry: 1,
                value: 0x0100_0000
            }
        ));
    }

    #[test]
    fn test_encode_reflects_edits() {
        let mut index =
            IndexDecoder::decode(0, &index_bytes(&[(1, 10), (2, 20)])).expect("valid index");
        index.set(1, IndexEntry::new(9, 90)).expect("entry 1 exists");
        index.append(IndexEntry::new(3, 30));

        let data = IndexDecoder::encode(&index).expect("encodable index");
        assert_eq!(data, index_bytes(&[(1, 10), (9, 90), (3, 30)]));
    }

    proptest! {
        /// Decoding the same bytes twice yields element-wise equal entries
        #[test]
        fn decode_is_deterministic(pairs in entry_pairs()) {
            let data = index_bytes(&pairs);
            let first = IndexDecoder::decode(0, &data).map_err(|e| TestCaseError::fail(e.to_string()))?;
            let second = IndexDecoder::decode(0, &data).map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(first.entries(), second.entries());
            prop_assert_eq!(first.byte_length(), second.byte_length());
        }

        /// Any length that is not a whole number of records is rejected
        #[test]
        fn decode_rejects_partial_records(data in prop::collection::vec(any::<u8>(), 0..256)) {
            prop_assume!(data.len() % RECORD_SIZE != 0);
            prop_assert!(matches!(
                IndexDecoder::decode(0, &data),
                Err(FileStoreError::MalformedIndex(_))
            ));
        }

        /// Decoding reproduces the written pairs in order
        #[test]
        fn decode_reproduces_pairs(pairs in entry_pairs()) {
            let index = IndexDecoder::decode(1, &index_bytes(&pairs))
                .map_err(|e| TestCaseError::fail(e.to_string()))?;

            prop_assert_eq!(index.len(), pairs.len());
            for (entry, &(sector, length)) in index.iter().zip(&pairs) {
                prop_assert_eq!(entry.sector(), sector);
                prop_assert_eq!(entry.length(), length);
            }

            let encoded = IndexDecoder::encode(&index).map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(encoded, index_bytes(&pairs));
        }
    }
}
