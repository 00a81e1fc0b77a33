//! Block Storage
//!
//! A block is a fixed-capacity run of column rows and the unit of selective I/O.
//!
//! ## Block Families
//! ```text
//! Fixed-width (sorted integers, no per-row index):
//! ┌──────────┬──────────┬─────┬──────────┐
//! │ value 0  │ value 1  │ ... │ value N-1│   row i at i * WIDTH
//! └──────────┴──────────┴─────┴──────────┘
//!
//! Variable-width (byte payloads):
//! ┌───────────────────────────────┬──────────┬─────┬──────────┐
//! │ end offsets: u64 x N          │ payload 0│ ... │payload N-1│
//! └───────────────────────────────┴──────────┴─────┴──────────┘
//!   end[i] = total payload bytes of rows 0..=i
//! ```
//!
//! Writers refuse inserts once full; the owning column rotates to a fresh block.

mod fixed;
mod variable;

pub use fixed::{FixedBlockReader, FixedBlockWriter};
pub use variable::{VarBlockReader, VarBlockWriter, VarValue};

/// Number of blocks needed for `total_entries` rows: `ceil(total / block_size)`
pub fn determine_blocks(block_size: u32, total_entries: u32) -> u32 {
    if total_entries % block_size > 0 {
        total_entries / block_size + 1
    } else {
        total_entries / block_size
    }
}

/// Number of rows held by `block_id` in a column of `total_entries` rows
pub fn block_entries(block_id: u32, block_size: u32, total_entries: u32) -> u32 {
    let start = block_id as u64 * block_size as u64;
    let remaining = (total_entries as u64).saturating_sub(start);
    remaining.min(block_size as u64) as u32
}

/// Result of finalizing a fixed-width block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSummary<T> {
    /// Bytes written for the block
    pub size: u64,
    /// Largest (last) value in the block
    pub max: T,
}

/// Row positions requested from a single block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockValues<T> {
    pub block_id: u32,
    pub values: Vec<T>,
}
