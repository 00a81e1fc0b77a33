//! Read Buffer
//!
//! Loads an index file into memory once and serves byte ranges from it.

use std::path::Path;

use bytes::Bytes;

use crate::codec::check_range;
use crate::error::Result;

/// Whole-file, read-only buffer
///
/// Cloning is cheap: the bytes are reference counted and shared.
#[derive(Clone)]
pub struct ReadBuffer {
    data: Bytes,
}

impl ReadBuffer {
    /// Read the entire file at `path` into memory
    pub fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Ok(Self::from_bytes(Bytes::from(data)))
    }

    /// Wrap bytes already in memory
    pub fn from_bytes(data: Bytes) -> Self {
        Self { data }
    }

    /// Borrow `[offset, offset + len)`
    pub fn view(&self, offset: u64, len: u64) -> Result<&[u8]> {
        let (offset, len) = (offset as usize, len as usize);
        check_range(offset, len, self.data.len())?;
        Ok(&self.data[offset..offset + len])
    }

    /// Shared handle to `[offset, offset + len)` without copying
    pub fn slice(&self, offset: u64, len: u64) -> Result<Bytes> {
        let (offset, len) = (offset as usize, len as usize);
        check_range(offset, len, self.data.len())?;
        Ok(self.data.slice(offset..offset + len))
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}
