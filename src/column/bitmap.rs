//! Bitmap column
//!
//! One serialized roaring bitmap of key-ids per row, row aligned with the
//! cell-id column.

use roaring::RoaringBitmap;

use crate::block::{VarBlockReader, VarValue};
use crate::error::{GeoMapError, Result};
use crate::io::WriteBuffer;

use super::var::{VarColumnReader, VarColumnWriter};
use super::Section;

impl VarValue for RoaringBitmap {
    fn encoded_len(&self) -> usize {
        self.serialized_size()
    }

    fn encode_into(&self, dst: &mut [u8]) -> Result<()> {
        self.serialize_into(dst)
            .map_err(|e| GeoMapError::Bitmap(format!("failed to serialize bitmap: {}", e)))
    }

    fn decode(src: &[u8]) -> Result<Self> {
        RoaringBitmap::deserialize_from(src)
            .map_err(|e| GeoMapError::Bitmap(format!("failed to deserialize bitmap: {}", e)))
    }
}

/// Builds the key-id bitmap column
pub struct BitmapColumnWriter {
    inner: VarColumnWriter<RoaringBitmap>,
}

impl BitmapColumnWriter {
    pub fn new(block_size: u16) -> Self {
        Self {
            inner: VarColumnWriter::new(block_size as usize),
        }
    }

    /// Append the bitmap for the next cell row
    pub fn add_bitmap(&mut self, bitmap: RoaringBitmap) {
        self.inner.add_value(bitmap);
    }

    pub fn entries(&self) -> u64 {
        self.inner.entries()
    }

    pub fn write_to(self, out: &mut WriteBuffer) -> Result<Section> {
        self.inner.write_to(out)
    }
}

/// Borrowed view of the bitmap column
pub struct BitmapColumnReader<'a> {
    inner: VarColumnReader<'a>,
}

impl<'a> BitmapColumnReader<'a> {
    pub fn new(section: &'a [u8], entries: u32, block_size: u16) -> Result<Self> {
        Ok(Self {
            inner: VarColumnReader::new(section, entries, block_size)?,
        })
    }

    pub fn entries(&self) -> u32 {
        self.inner.entries()
    }

    pub fn block_count(&self) -> usize {
        self.inner.block_count()
    }

    pub fn read_block(&self, block_id: u32) -> Result<VarBlockReader<'a, RoaringBitmap>> {
        self.inner.read_block(block_id)
    }
}
