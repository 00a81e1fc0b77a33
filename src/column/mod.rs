//! Columns
//!
//! Block-structured columns built from block storage plus block indexes.
//!
//! ## Section Layouts
//! ```text
//! Cell-id column (sorted u64, skip indexed):
//! ┌───────────────────┬────────────────────┬──────────────────────────┐
//! │ block maxima x B  │ block end offsets  │ fixed blocks of u64      │
//! └───────────────────┴────────────────────┴──────────────────────────┘
//!
//! Byte column (keys) and bitmap column (key-id sets):
//! ┌────────────────────┬──────────────────────────────────────────────┐
//! │ block end offsets  │ variable blocks                              │
//! └────────────────────┴──────────────────────────────────────────────┘
//! ```
//!
//! Row `i` of every column lives in block `i / block_size` at position
//! `i % block_size`. The cell-id and bitmap columns are row aligned: row `i`
//! of both describes the same cell.

mod bitmap;
mod byte;
mod cell_id;
mod var;

pub use self::bitmap::{BitmapColumnReader, BitmapColumnWriter};
pub use self::byte::{group_rows, ByteColumnReader, ByteColumnWriter};
pub use self::cell_id::{CellIdColumnReader, CellIdColumnWriter};

/// Location of a serialized section inside the file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Section {
    pub offset: u64,
    pub size: u64,
}

impl Section {
    pub fn new(offset: u64, size: u64) -> Self {
        Self { offset, size }
    }

    /// One past the last byte of the section
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size)
    }
}

impl From<(u64, u64)> for Section {
    fn from((offset, size): (u64, u64)) -> Self {
        Self { offset, size }
    }
}
