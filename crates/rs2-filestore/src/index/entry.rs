//! Index entry record (6-byte `main_file_cache.idx<N>` format)

use crate::SECTOR_SIZE;
use binrw::{BinRead, BinReaderExt, BinResult, BinWrite, BinWriterExt, Endian};

/// Size in bytes of one on-disk index record.
pub const RECORD_SIZE: usize = 6;

/// Largest value a 24-bit record field can hold.
pub const MAX_FIELD_VALUE: u32 = 0x00FF_FFFF;

/// Custom binrw parser for an unsigned 24-bit big-endian field
fn parse_u24<R: std::io::Read + std::io::Seek>(
    reader: &mut R,
    _endian: Endian,
    _args: (),
) -> BinResult<u32> {
    let bytes: [u8; 3] = reader.read_be()?;
    Ok(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
}

/// Custom binrw writer for an unsigned 24-bit big-endian field
fn write_u24<W: std::io::Write + std::io::Seek>(
    value: &u32,
    writer: &mut W,
    _endian: Endian,
    _args: (),
) -> BinResult<()> {
    if *value > MAX_FIELD_VALUE {
        return Err(binrw::Error::AssertFail {
            pos: writer.stream_position()?,
            message: format!("Value {value:#x} does not fit in 24 bits"),
        });
    }

    let [_, b0, b1, b2] = value.to_be_bytes();
    writer.write_be(&[b0, b1, b2])?;
    Ok(())
}

/// Location of one resource in the data file
///
/// On disk (big-endian):
/// - Length: 3 bytes, resource size in bytes
/// - Sector: 3 bytes, first 520-byte sector of the resource
///
/// Entries are plain values: two entries are equal when both fields are.
/// Replacing an entry in an [`Index`](super::Index) substitutes a whole new
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, BinRead, BinWrite)]
#[brw(big)]
pub struct IndexEntry {
    /// Resource length in bytes
    #[br(parse_with = parse_u24)]
    #[bw(write_with = write_u24)]
    length: u32,

    /// First sector of the resource in the data file
    #[br(parse_with = parse_u24)]
    #[bw(write_with = write_u24)]
    sector: u32,
}

impl IndexEntry {
    /// Create an entry pointing `length` bytes starting at `sector`.
    pub const fn new(sector: u32, length: u32) -> Self {
        Self { length, sector }
    }

    /// First sector of the resource
    pub const fn sector(&self) -> u32 {
        self.sector
    }

    /// Byte offset of the first sector within the data file
    pub const fn offset(&self) -> u64 {
        self.sector as u64 * SECTOR_SIZE
    }

    /// Resource length in bytes
    pub const fn length(&self) -> u32 {
        self.length
    }

    /// Whether both fields fit the 24-bit on-disk encoding
    pub const fn is_encodable(&self) -> bool {
        self.length <= MAX_FIELD_VALUE && self.sector <= MAX_FIELD_VALUE
    }
}
