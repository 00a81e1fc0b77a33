//! Error types for GeoMap
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using GeoMapError
pub type Result<T> = std::result::Result<T, GeoMapError>;

/// Unified error type for GeoMap operations
#[derive(Debug, Error)]
pub enum GeoMapError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Format Errors
    // -------------------------------------------------------------------------
    #[error("Out of bounds: offset {offset} + len {len} exceeds size {size}")]
    OutOfBounds { offset: u64, len: u64, size: u64 },

    #[error("Index file corruption detected: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Write Errors
    // -------------------------------------------------------------------------
    #[error("Capacity exceeded: {0}")]
    Capacity(String),

    #[error("Invalid cell id: {0:#018x}")]
    InvalidCell(u64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // -------------------------------------------------------------------------
    // Collaborator Errors
    // -------------------------------------------------------------------------
    #[error("Filter error: {0}")]
    Filter(#[from] fst::Error),

    #[error("Bitmap error: {0}")]
    Bitmap(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Surface Errors
    // -------------------------------------------------------------------------
    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),

    #[error("Unknown handle: {0}")]
    InvalidHandle(u64),
}

impl GeoMapError {
    /// Build an out-of-bounds error for a `[offset, offset + len)` request
    pub(crate) fn out_of_bounds(offset: usize, len: usize, size: usize) -> Self {
        GeoMapError::OutOfBounds {
            offset: offset as u64,
            len: len as u64,
            size: size as u64,
        }
    }
}
