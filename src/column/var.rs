//! Shared machinery for variable-width columns

use crate::block::{block_entries, determine_blocks, VarBlockReader, VarBlockWriter, VarValue};
use crate::error::{GeoMapError, Result};
use crate::index::{BlockOffsetReader, BlockOffsetWriter};
use crate::io::WriteBuffer;

use super::Section;

/// Rotates variable-width blocks and writes them behind a block offset index
pub(crate) struct VarColumnWriter<V> {
    block_size: usize,
    blocks: Vec<VarBlockWriter<V>>,
    current: VarBlockWriter<V>,
    entries: u64,
}

impl<V: VarValue> VarColumnWriter<V> {
    pub(crate) fn new(block_size: usize) -> Self {
        Self {
            block_size,
            blocks: Vec::new(),
            current: VarBlockWriter::new(block_size),
            entries: 0,
        }
    }

    pub(crate) fn add_value(&mut self, value: V) {
        if let Err(value) = self.current.insert_value(value) {
            let full = std::mem::replace(&mut self.current, VarBlockWriter::new(self.block_size));
            self.blocks.push(full);
            // A fresh block always has room
            let _ = self.current.insert_value(value);
        }
        self.entries += 1;
    }

    pub(crate) fn entries(&self) -> u64 {
        self.entries
    }

    /// Write the offset index then every block, sequentially
    pub(crate) fn write_to(mut self, out: &mut WriteBuffer) -> Result<Section> {
        if !self.current.is_empty() {
            self.blocks.push(self.current);
        }

        let mut offsets = BlockOffsetWriter::new();
        for block in &self.blocks {
            offsets.push_block(block.byte_size());
        }

        let start = out.offset();
        offsets.write_to(out);
        for block in &self.blocks {
            block.finish(out)?;
        }

        let section = Section::new(start, out.offset() - start);
        debug_assert_eq!(section.size, offsets.byte_size() + offsets.data_size());
        Ok(section)
    }
}

/// Borrowed view of a variable-width column section
pub(crate) struct VarColumnReader<'a> {
    entries: u32,
    block_size: u32,
    offsets: BlockOffsetReader<'a>,
    data: &'a [u8],
}

impl<'a> VarColumnReader<'a> {
    pub(crate) fn new(section: &'a [u8], entries: u32, block_size: u16) -> Result<Self> {
        let block_size = block_size as u32;
        let blocks = determine_blocks(block_size, entries) as usize;
        let offsets = BlockOffsetReader::new(section, blocks)?;
        let data = &section[offsets.byte_size()..];

        if offsets.data_size() > data.len() as u64 {
            return Err(GeoMapError::Corruption(format!(
                "column blocks need {} bytes but section holds {}",
                offsets.data_size(),
                data.len()
            )));
        }

        Ok(Self {
            entries,
            block_size,
            offsets,
            data,
        })
    }

    pub(crate) fn entries(&self) -> u32 {
        self.entries
    }

    pub(crate) fn block_size(&self) -> u32 {
        self.block_size
    }

    pub(crate) fn block_count(&self) -> usize {
        self.offsets.block_count()
    }

    pub(crate) fn read_block<V: VarValue>(&self, block_id: u32) -> Result<VarBlockReader<'a, V>> {
        let (start, len) = self.offsets.block_span(block_id)?;
        let rows = block_entries(block_id, self.block_size, self.entries);
        let bytes = self
            .data
            .get(start as usize..(start + len) as usize)
            .ok_or_else(|| GeoMapError::out_of_bounds(start as usize, len as usize, self.data.len()))?;
        VarBlockReader::new(bytes, rows as usize)
    }
}
