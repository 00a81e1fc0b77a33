//! Byte Buffers
//!
//! File-backed buffers every other component reads from or writes into.
//!
//! ## Responsibilities
//! - Accumulate a whole index file in memory while it is built
//! - Persist it with a single positioned write
//! - Load a whole index file once and hand out zero-copy views

mod read_buffer;
mod write_buffer;

pub use read_buffer::ReadBuffer;
pub use write_buffer::WriteBuffer;
