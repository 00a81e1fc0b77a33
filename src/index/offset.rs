//! Block offset index
//!
//! Maps a block id to its byte span inside a column's data region.

use crate::codec::{encode_all, FixedView};
use crate::error::{GeoMapError, Result};
use crate::io::WriteBuffer;

/// Collects cumulative block end offsets while a column is written
#[derive(Debug, Default, Clone)]
pub struct BlockOffsetWriter {
    end_offsets: Vec<u64>,
}

impl BlockOffsetWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the next block's size
    pub fn push_block(&mut self, size: u64) {
        let end = self.end_offsets.last().copied().unwrap_or(0) + size;
        self.end_offsets.push(end);
    }

    /// Number of blocks recorded
    pub fn len(&self) -> usize {
        self.end_offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.end_offsets.is_empty()
    }

    /// Total bytes of all recorded blocks
    pub fn data_size(&self) -> u64 {
        self.end_offsets.last().copied().unwrap_or(0)
    }

    /// Bytes the index occupies once written
    pub fn byte_size(&self) -> u64 {
        (self.end_offsets.len() * 8) as u64
    }

    pub fn write_to(&self, out: &mut WriteBuffer) -> u64 {
        out.write(&encode_all(&self.end_offsets)).1
    }
}

/// Resolves block ids to `(start, len)` spans relative to the data region
#[derive(Debug, Clone, Copy)]
pub struct BlockOffsetReader<'a> {
    end_offsets: FixedView<'a, u64>,
}

impl<'a> BlockOffsetReader<'a> {
    /// Wrap the offsets of `blocks` blocks packed at the start of `bytes`
    pub fn new(bytes: &'a [u8], blocks: usize) -> Result<Self> {
        Ok(Self {
            end_offsets: FixedView::new(bytes, blocks)?,
        })
    }

    pub fn block_count(&self) -> usize {
        self.end_offsets.len()
    }

    /// Bytes this index occupies
    pub fn byte_size(&self) -> usize {
        self.end_offsets.byte_len()
    }

    /// Total bytes of block data the index describes
    pub fn data_size(&self) -> u64 {
        self.end_offsets.last().unwrap_or(0)
    }

    /// Byte span `(start, len)` of `block_id` within the data region
    pub fn block_span(&self, block_id: u32) -> Result<(u64, u64)> {
        let block = block_id as usize;
        let end = self.end_offsets.try_get(block)?;
        let start = if block == 0 { 0 } else { self.end_offsets.get(block - 1) };
        if start > end {
            return Err(GeoMapError::Corruption(format!(
                "block {} offsets are not monotonic ({} > {})",
                block_id, start, end
            )));
        }
        Ok((start, end - start))
    }
}
