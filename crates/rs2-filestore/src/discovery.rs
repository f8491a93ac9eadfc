//! Index file name matching and ordering
//!
//! Index files are named `main_file_cache.idx` followed by one or more ASCII
//! digits. Their position after sorting becomes the index id, so the sort
//! order is part of the on-disk contract.

use crate::INDEX_FILE_PREFIX;
use crate::config::DiscoveryOrder;

/// Whether `name` is an index file name (`main_file_cache.idx<digits>`).
pub fn is_index_file_name(name: &str) -> bool {
    name.strip_prefix(INDEX_FILE_PREFIX)
        .is_some_and(|suffix| !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()))
}

/// Numeric suffix of an index file name.
///
/// Returns `None` for names that are not index files or whose suffix does
/// not fit a `u32`.
pub fn index_suffix(name: &str) -> Option<u32> {
    if !is_index_file_name(name) {
        return None;
    }
    name.strip_prefix(INDEX_FILE_PREFIX)?.parse().ok()
}

/// Sort index file names in discovery order.
///
/// [`DiscoveryOrder::Lexicographic`] compares whole names as strings, so
/// `idx10` lands between `idx1` and `idx2`. [`DiscoveryOrder::Numeric`]
/// compares suffixes as numbers; ties between equal values written with
/// leading zeros fall back to the shorter name first.
pub fn sort_index_names(names: &mut [String], order: DiscoveryOrder) {
    match order {
        DiscoveryOrder::Lexicographic => names.sort_unstable(),
        DiscoveryOrder::Numeric => names.sort_unstable_by(|a, b| {
            index_suffix(a)
                .cmp(&index_suffix(b))
                .then_with(|| a.len().cmp(&b.len()))
                .then_with(|| a.cmp(b))
        }),
    }
}
