//! Write Buffer
//!
//! Append-only, growable in-memory image of an output file.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{GeoMapError, Result};

/// In-memory write buffer backing a single output file
///
/// Writes land at the logical cursor. Moving the cursor past the end grows
/// the buffer with zeros; nothing reaches disk until `flush`.
pub struct WriteBuffer {
    /// Output file path
    path: PathBuf,
    /// Output file, opened (and truncated) at creation
    file: File,
    /// Backing bytes
    buffer: Vec<u8>,
    /// Logical write cursor
    position: usize,
}

impl WriteBuffer {
    /// Create (or truncate) `path` and allocate `capacity` bytes up front
    pub fn create(path: &Path, capacity: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            buffer: Vec::with_capacity(capacity),
            position: 0,
        })
    }

    /// Write `data` at the cursor, returning `(offset, size)` of the region
    pub fn write(&mut self, data: &[u8]) -> (u64, u64) {
        let offset = self.position;
        let end = offset + data.len();
        self.grow_to(end);
        self.buffer[offset..end].copy_from_slice(data);
        self.position = end;
        (offset as u64, data.len() as u64)
    }

    /// Reserve `size` bytes at the cursor and let `fill` populate them in place
    ///
    /// Used for payloads that serialize straight into a byte slice, skipping an
    /// intermediate copy.
    pub fn write_with<F>(&mut self, size: usize, fill: F) -> Result<(u64, u64)>
    where
        F: FnOnce(&mut [u8]) -> Result<()>,
    {
        let offset = self.position;
        let end = offset + size;
        self.grow_to(end);
        fill(&mut self.buffer[offset..end])?;
        self.position = end;
        Ok((offset as u64, size as u64))
    }

    /// Move the cursor by `delta` bytes, growing the buffer if needed
    pub fn seek(&mut self, delta: i64) -> Result<()> {
        let target = self.position as i64 + delta;
        if target < 0 {
            return Err(GeoMapError::InvalidInput(format!(
                "seek to {} is before start of buffer",
                target
            )));
        }
        let target = target as usize;
        self.grow_to(target);
        self.position = target;
        Ok(())
    }

    /// Rewind the cursor to the start without truncating
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Current cursor position
    pub fn offset(&self) -> u64 {
        self.position as u64
    }

    /// Total bytes held in the buffer
    pub fn len(&self) -> u64 {
        self.buffer.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the whole buffer at `file_offset` and rewind the cursor
    pub fn flush(&mut self, file_offset: u64) -> Result<()> {
        self.file.seek(SeekFrom::Start(file_offset))?;
        self.file.write_all(&self.buffer)?;
        self.file.sync_all()?;
        self.position = 0;
        Ok(())
    }

    fn grow_to(&mut self, len: usize) {
        if len > self.buffer.len() {
            self.buffer.resize(len, 0);
        }
    }
}
