//! File Header
//!
//! Fixed 128-byte record at offset 0 locating every section of an index file.
//!
//! ```text
//! 0   header_size u64        8   filter offset u64   16  filter size u64
//! 24  keys offset u64        32  keys size u64       40  cells offset u64
//! 48  cells size u64         56  bitmaps offset u64  64  bitmaps size u64
//! 72  key entries u32        76  cell entries u32    80  level stride u8
//! 81  block size u16         83  file type u8        84  min level u8
//! 85  magic [4]              89  version u16         91  crc32 u32
//! 95..128 zero padding
//! ```
//!
//! The CRC covers bytes `0..91`.

use bytes::BufMut;

use crate::codec::{read_u16, read_u32, read_u64, read_u8};
use crate::column::Section;
use crate::error::{GeoMapError, Result};

/// Encoded header size in bytes
pub const HEADER_SIZE: usize = 128;

/// Magic tag identifying an index file
pub const MAGIC: &[u8; 4] = b"RGMP";

/// Current on-disk format version
pub const VERSION: u16 = 1;

/// File type tag for a key/cell inverted index
pub const FILE_TYPE: u8 = 0;

const MAGIC_OFFSET: usize = 85;
const CRC_OFFSET: usize = 91;

/// Decoded file header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    pub filter: Section,
    pub keys: Section,
    pub cells: Section,
    pub bitmaps: Section,
    pub key_entries: u32,
    pub cell_entries: u32,
    pub level_stride: u8,
    pub block_size: u16,
    pub file_type: u8,
    pub min_level: u8,
}

impl Header {
    /// Encode into the fixed 128-byte layout
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = Vec::with_capacity(HEADER_SIZE);
        out.put_u64_le(HEADER_SIZE as u64);
        for section in [self.filter, self.keys, self.cells, self.bitmaps] {
            out.put_u64_le(section.offset);
            out.put_u64_le(section.size);
        }
        out.put_u32_le(self.key_entries);
        out.put_u32_le(self.cell_entries);
        out.put_u8(self.level_stride);
        out.put_u16_le(self.block_size);
        out.put_u8(self.file_type);
        out.put_u8(self.min_level);
        out.put_slice(MAGIC);
        out.put_u16_le(VERSION);
        debug_assert_eq!(out.len(), CRC_OFFSET);

        let crc = crc32fast::hash(&out);
        out.put_u32_le(crc);

        let mut header = [0u8; HEADER_SIZE];
        header[..out.len()].copy_from_slice(&out);
        header
    }

    /// Decode and validate a header against a file of `file_size` bytes
    pub fn decode(src: &[u8], file_size: u64) -> Result<Self> {
        if src.len() < HEADER_SIZE {
            return Err(GeoMapError::Corruption(format!(
                "file of {} bytes is shorter than the {}-byte header",
                src.len(),
                HEADER_SIZE
            )));
        }

        if &src[MAGIC_OFFSET..MAGIC_OFFSET + 4] != MAGIC {
            return Err(GeoMapError::Corruption("bad magic".to_string()));
        }

        let version = read_u16(src, 89)?;
        if version != VERSION {
            return Err(GeoMapError::Corruption(format!(
                "unsupported format version {}",
                version
            )));
        }

        let stored_crc = read_u32(src, CRC_OFFSET)?;
        let computed_crc = crc32fast::hash(&src[..CRC_OFFSET]);
        if stored_crc != computed_crc {
            return Err(GeoMapError::Corruption(format!(
                "header checksum mismatch: expected {:#010x}, got {:#010x}",
                stored_crc, computed_crc
            )));
        }

        let header_size = read_u64(src, 0)?;
        if header_size != HEADER_SIZE as u64 {
            return Err(GeoMapError::Corruption(format!(
                "header size {} does not match {}",
                header_size, HEADER_SIZE
            )));
        }

        let section = |at: usize| -> Result<Section> {
            Ok(Section::new(read_u64(src, at)?, read_u64(src, at + 8)?))
        };

        let header = Self {
            filter: section(8)?,
            keys: section(24)?,
            cells: section(40)?,
            bitmaps: section(56)?,
            key_entries: read_u32(src, 72)?,
            cell_entries: read_u32(src, 76)?,
            level_stride: read_u8(src, 80)?,
            block_size: read_u16(src, 81)?,
            file_type: read_u8(src, 83)?,
            min_level: read_u8(src, 84)?,
        };

        header.check_sections(file_size)?;
        Ok(header)
    }

    fn check_sections(&self, file_size: u64) -> Result<()> {
        if self.level_stride == 0 || self.block_size == 0 {
            return Err(GeoMapError::Corruption(format!(
                "invalid layout parameters: stride {}, block size {}",
                self.level_stride, self.block_size
            )));
        }

        let named = [
            ("filter", self.filter),
            ("keys", self.keys),
            ("cells", self.cells),
            ("bitmaps", self.bitmaps),
        ];
        for (name, section) in named {
            let end = section.offset.checked_add(section.size);
            if section.offset < HEADER_SIZE as u64 || end.map_or(true, |end| end > file_size) {
                return Err(GeoMapError::Corruption(format!(
                    "{} section {}+{} lies outside file of {} bytes",
                    name, section.offset, section.size, file_size
                )));
            }
        }
        Ok(())
    }
}
