//! Byte column
//!
//! Stores the raw key bytes in key-id order. There is no value index: a key-id
//! is its row number, so its block and in-block position follow from the
//! block size alone.

use crate::block::{BlockValues, VarBlockReader};
use crate::error::{GeoMapError, Result};
use crate::io::WriteBuffer;

use super::var::{VarColumnReader, VarColumnWriter};
use super::Section;

/// Builds the key column
pub struct ByteColumnWriter {
    inner: VarColumnWriter<Vec<u8>>,
}

impl ByteColumnWriter {
    pub fn new(block_size: u16) -> Self {
        Self {
            inner: VarColumnWriter::new(block_size as usize),
        }
    }

    /// Append the next row
    pub fn add_bytes(&mut self, bytes: Vec<u8>) {
        self.inner.add_value(bytes);
    }

    /// Rows added so far
    pub fn entries(&self) -> u64 {
        self.inner.entries()
    }

    pub fn write_to(self, out: &mut WriteBuffer) -> Result<Section> {
        self.inner.write_to(out)
    }
}

/// Borrowed view of the key column
pub struct ByteColumnReader<'a> {
    inner: VarColumnReader<'a>,
}

impl<'a> ByteColumnReader<'a> {
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

    pub fn read_block(&self, block_id: u32) -> Result<VarBlockReader<'a, Vec<u8>>> {
        self.inner.read_block(block_id)
    }

    /// `(block id, in-block row)` of a column row
    pub fn locate(&self, row: u32) -> (u32, u32) {
        let block_size = self.inner.block_size();
        (row / block_size, row % block_size)
    }

    /// Read the given rows, visiting each touched block once
    ///
    /// Rows must be ascending; output follows the same order.
    pub fn read_rows<I>(&self, rows: I) -> Result<Vec<Vec<u8>>>
    where
        I: IntoIterator<Item = u32>,
    {
        let mut out = Vec::new();
        for group in group_rows(rows, self.inner.block_size()) {
            let first_row = group.block_id as u64 * self.inner.block_size() as u64;
            if let Some(&last) = group.values.last() {
                if first_row + last as u64 >= self.entries() as u64 {
                    return Err(GeoMapError::out_of_bounds(
                        (first_row + last as u64) as usize,
                        1,
                        self.entries() as usize,
                    ));
                }
            }
            let block = self.read_block(group.block_id)?;
            for raw in block.read_raw_indexes(&group.values)? {
                out.push(raw.to_vec());
            }
        }
        Ok(out)
    }
}

/// Split ascending column rows into per-block in-block positions
pub fn group_rows<I>(rows: I, block_size: u32) -> Vec<BlockValues<u32>>
where
    I: IntoIterator<Item = u32>,
{
    let mut groups: Vec<BlockValues<u32>> = Vec::new();
    for row in rows {
        let block_id = row / block_size;
        let position = row % block_size;
        match groups.last_mut() {
            Some(group) if group.block_id == block_id => group.values.push(position),
            _ => groups.push(BlockValues {
                block_id,
                values: vec![position],
            }),
        }
    }
    groups
}
