//! Cell-id column
//!
//! Distinct indexed cell ids in ascending order, stored in fixed-width blocks
//! behind a block value (skip) index and a block offset index.

use crate::block::{block_entries, determine_blocks, FixedBlockReader, FixedBlockWriter};
use crate::error::{GeoMapError, Result};
use crate::index::{BlockOffsetReader, BlockOffsetWriter, BlockValueIndexReader, BlockValueIndexWriter};
use crate::io::WriteBuffer;

use super::Section;

/// Builds the cell-id column
pub struct CellIdColumnWriter {
    block_size: usize,
    blocks: Vec<FixedBlockWriter<u64>>,
    current: FixedBlockWriter<u64>,
    last: Option<u64>,
    entries: u64,
}

impl CellIdColumnWriter {
    pub fn new(block_size: u16) -> Self {
        let block_size = block_size as usize;
        Self {
            block_size,
            blocks: Vec::new(),
            current: FixedBlockWriter::new(block_size),
            last: None,
            entries: 0,
        }
    }

    /// Append the next cell id; ids must be strictly ascending
    pub fn add_value(&mut self, value: u64) -> Result<()> {
        if let Some(last) = self.last {
            if value <= last {
                return Err(GeoMapError::InvalidInput(format!(
                    "cell ids must be strictly ascending: {:#x} after {:#x}",
                    value, last
                )));
            }
        }

        if !self.current.insert_value(value) {
            let full = std::mem::replace(&mut self.current, FixedBlockWriter::new(self.block_size));
            self.blocks.push(full);
            self.current.insert_value(value);
        }
        self.last = Some(value);
        self.entries += 1;
        Ok(())
    }

    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Write skip index, offset index, then blocks, sequentially
    pub fn write_to(mut self, out: &mut WriteBuffer) -> Result<Section> {
        if !self.current.is_empty() {
            self.blocks.push(self.current);
        }

        let mut value_index = BlockValueIndexWriter::<u64>::new();
        let mut offsets = BlockOffsetWriter::new();
        for block in &self.blocks {
            if let Some(summary) = block.summary() {
                value_index.push_block(summary.max);
                offsets.push_block(summary.size);
            }
        }

        let start = out.offset();
        value_index.write_to(out);
        offsets.write_to(out);
        for block in &self.blocks {
            block.finish(out)?;
        }

        Ok(Section::new(start, out.offset() - start))
    }
}

/// Borrowed view of the cell-id column
pub struct CellIdColumnReader<'a> {
    entries: u32,
    block_size: u32,
    block_index: BlockValueIndexReader<'a, u64>,
    offsets: BlockOffsetReader<'a>,
    data: &'a [u8],
}

impl<'a> CellIdColumnReader<'a> {
    pub fn new(section: &'a [u8], entries: u32, block_size: u16) -> Result<Self> {
        let block_size = block_size as u32;
        let blocks = determine_blocks(block_size, entries) as usize;

        let block_index = BlockValueIndexReader::new(section, blocks)?;
        let rest = &section[block_index.byte_size()..];
        let offsets = BlockOffsetReader::new(rest, blocks)?;
        let data = &rest[offsets.byte_size()..];

        if offsets.data_size() != entries as u64 * 8 || offsets.data_size() > data.len() as u64 {
            return Err(GeoMapError::Corruption(format!(
                "cell column of {} entries has {} bytes of blocks ({} available)",
                entries,
                offsets.data_size(),
                data.len()
            )));
        }

        Ok(Self {
            entries,
            block_size,
            block_index,
            offsets,
            data,
        })
    }

    pub fn entries(&self) -> u32 {
        self.entries
    }

    pub fn block_count(&self) -> usize {
        self.offsets.block_count()
    }

    /// Skip index over block maxima
    pub fn block_index(&self) -> BlockValueIndexReader<'a, u64> {
        self.block_index
    }

    pub fn read_block(&self, block_id: u32) -> Result<FixedBlockReader<'a, u64>> {
        let (start, len) = self.offsets.block_span(block_id)?;
        let rows = block_entries(block_id, self.block_size, self.entries);
        if len != rows as u64 * 8 {
            return Err(GeoMapError::Corruption(format!(
                "cell block {} is {} bytes but holds {} rows",
                block_id, len, rows
            )));
        }
        let bytes = self
            .data
            .get(start as usize..(start + len) as usize)
            .ok_or_else(|| GeoMapError::out_of_bounds(start as usize, len as usize, self.data.len()))?;
        FixedBlockReader::new(bytes, rows as usize)
    }
}
