//! Block Indexes
//!
//! Per-column indexes written once every block of the column is finalized.
//!
//! ## Layout
//! ```text
//! Block offset index (every column):
//! ┌──────────────┬──────────────┬─────┬────────────────┐
//! │ end[0]: u64  │ end[1]: u64  │ ... │ end[B-1]: u64  │  end[b] = bytes of blocks 0..=b
//! └──────────────┴──────────────┴─────┴────────────────┘
//!
//! Block value (skip) index (sorted fixed-width columns):
//! ┌──────────────┬──────────────┬─────┬────────────────┐
//! │ max[0]       │ max[1]       │ ... │ max[B-1]       │  largest value of each block
//! └──────────────┴──────────────┴─────┴────────────────┘
//! ```

mod offset;
mod value;

pub use offset::{BlockOffsetReader, BlockOffsetWriter};
pub use value::{BlockQuery, BlockValueIndexReader, BlockValueIndexWriter};
