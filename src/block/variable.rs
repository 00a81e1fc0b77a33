//! Variable-width blocks
//!
//! Byte payloads preceded by a cumulative end-offset array, so any row can be
//! sliced out with two offset reads.

use std::marker::PhantomData;

use crate::codec::{encode_all, FixedView};
use crate::error::{GeoMapError, Result};
use crate::io::WriteBuffer;

use super::fixed::check_index_range;

/// A value stored as a variable-length payload
pub trait VarValue: Sized {
    /// Exact number of bytes `encode_into` writes
    fn encoded_len(&self) -> usize;

    /// Serialize into `dst`, which is exactly `encoded_len()` bytes long
    fn encode_into(&self, dst: &mut [u8]) -> Result<()>;

    fn decode(src: &[u8]) -> Result<Self>;
}

impl VarValue for Vec<u8> {
    fn encoded_len(&self) -> usize {
        self.len()
    }

    fn encode_into(&self, dst: &mut [u8]) -> Result<()> {
        dst.copy_from_slice(self);
        Ok(())
    }

    fn decode(src: &[u8]) -> Result<Self> {
        Ok(src.to_vec())
    }
}

/// Accumulates one variable-width block
pub struct VarBlockWriter<V> {
    capacity: usize,
    values: Vec<V>,
    payload_size: u64,
}

impl<V: VarValue> VarBlockWriter<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            values: Vec::new(),
            payload_size: 0,
        }
    }

    /// Append a value; returns it back when the block is full
    pub fn insert_value(&mut self, value: V) -> std::result::Result<(), V> {
        if self.values.len() >= self.capacity {
            return Err(value);
        }
        self.payload_size += value.encoded_len() as u64;
        self.values.push(value);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() >= self.capacity
    }

    /// Bytes the block occupies once written (offset array plus payloads)
    pub fn byte_size(&self) -> u64 {
        (self.values.len() * 8) as u64 + self.payload_size
    }

    /// Write the offset array followed by every payload at the buffer cursor
    pub fn finish(&self, out: &mut WriteBuffer) -> Result<u64> {
        let mut end_offsets = Vec::with_capacity(self.values.len());
        let mut end = 0u64;
        for value in &self.values {
            end += value.encoded_len() as u64;
            end_offsets.push(end);
        }
        out.write(&encode_all(&end_offsets));

        for value in &self.values {
            out.write_with(value.encoded_len(), |dst| value.encode_into(dst))?;
        }
        Ok(self.byte_size())
    }
}

/// Read access to one variable-width block
pub struct VarBlockReader<'a, V> {
    offsets: FixedView<'a, u64>,
    data: &'a [u8],
    _marker: PhantomData<V>,
}

impl<'a, V: VarValue> VarBlockReader<'a, V> {
    /// Wrap a block of `entries` rows
    pub fn new(bytes: &'a [u8], entries: usize) -> Result<Self> {
        let offsets = FixedView::<u64>::new(bytes, entries)?;
        let data = &bytes[offsets.byte_len()..];

        if let Some(end) = offsets.last() {
            if end > data.len() as u64 {
                return Err(GeoMapError::Corruption(format!(
                    "block payload end {} exceeds block data of {} bytes",
                    end,
                    data.len()
                )));
            }
        }

        Ok(Self {
            offsets,
            data,
            _marker: PhantomData,
        })
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Undecoded payload of row `index`
    pub fn raw(&self, index: u32) -> Result<&'a [u8]> {
        let index = index as usize;
        let end = self.offsets.try_get(index)?;
        let start = if index == 0 { 0 } else { self.offsets.get(index - 1) };
        if start > end || end > self.data.len() as u64 {
            return Err(GeoMapError::Corruption(format!(
                "row {} spans invalid payload range {}..{}",
                index, start, end
            )));
        }
        Ok(&self.data[start as usize..end as usize])
    }

    /// Undecoded payloads at the given rows, in the order requested
    pub fn read_raw_indexes(&self, indexes: &[u32]) -> Result<Vec<&'a [u8]>> {
        indexes.iter().map(|&index| self.raw(index)).collect()
    }

    /// Decoded values at the given rows, in the order requested
    pub fn read_indexes(&self, indexes: &[u32]) -> Result<Vec<V>> {
        indexes.iter().map(|&index| V::decode(self.raw(index)?)).collect()
    }

    /// Decoded values for each inclusive `(start, end)` row range
    pub fn read_index_ranges(&self, ranges: &[(u32, u32)]) -> Result<Vec<V>> {
        let mut out = Vec::new();
        for &(start, end) in ranges {
            check_index_range(start, end, self.len())?;
            for index in start..=end {
                out.push(V::decode(self.raw(index)?)?);
            }
        }
        Ok(out)
    }
}
