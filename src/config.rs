//! Configuration for GeoMap
//!
//! Centralized build configuration with sensible defaults.

use crate::cell::MAX_LEVEL;
use crate::error::{GeoMapError, Result};

/// Build-time configuration for a GeoMap index file
///
/// Readers never consult this: every parameter that affects the on-disk layout
/// is persisted in the file header.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    // -------------------------------------------------------------------------
    // Cell Normalization
    // -------------------------------------------------------------------------
    /// Distance between indexed cell levels, counted up from `min_level`
    pub level_stride: u8,

    /// Coarsest level a cell may be indexed at
    pub min_level: u8,

    // -------------------------------------------------------------------------
    // Block Layout
    // -------------------------------------------------------------------------
    /// Maximum number of rows per column block
    pub block_size: u16,

    // -------------------------------------------------------------------------
    // Write Limits
    // -------------------------------------------------------------------------
    /// Maximum key length in bytes accepted by `write`
    pub max_key_len: usize,

    /// Maximum number of normalized cells a single `write` may produce
    pub max_region_cells: u64,

    /// Initial capacity of the in-memory write buffer (in bytes)
    pub write_buffer_capacity: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            level_stride: 3,
            min_level: 3,
            block_size: 1024,
            max_key_len: 512,
            max_region_cells: 1 << 16,
            write_buffer_capacity: 4096 * 4, // 16 KB
        }
    }
}

impl IndexConfig {
    /// Create a new config builder
    pub fn builder() -> IndexConfigBuilder {
        IndexConfigBuilder::default()
    }

    /// Reject parameter combinations that cannot produce a readable file
    pub fn validate(&self) -> Result<()> {
        if self.level_stride == 0 {
            return Err(GeoMapError::Config("level_stride must be at least 1".to_string()));
        }
        if self.level_stride > MAX_LEVEL {
            return Err(GeoMapError::Config(format!(
                "level_stride {} exceeds max cell level {}",
                self.level_stride, MAX_LEVEL
            )));
        }
        if self.min_level > MAX_LEVEL {
            return Err(GeoMapError::Config(format!(
                "min_level {} exceeds max cell level {}",
                self.min_level, MAX_LEVEL
            )));
        }
        if self.block_size == 0 {
            return Err(GeoMapError::Config("block_size must be at least 1".to_string()));
        }
        if self.max_key_len == 0 {
            return Err(GeoMapError::Config("max_key_len must be at least 1".to_string()));
        }
        if self.max_region_cells == 0 {
            return Err(GeoMapError::Config("max_region_cells must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Builder for IndexConfig
#[derive(Default)]
pub struct IndexConfigBuilder {
    config: IndexConfig,
}

impl IndexConfigBuilder {
    /// Set the level stride between indexed cell levels
    pub fn level_stride(mut self, stride: u8) -> Self {
        self.config.level_stride = stride;
        self
    }

    /// Set the coarsest indexed cell level
    pub fn min_level(mut self, level: u8) -> Self {
        self.config.min_level = level;
        self
    }

    /// Set the number of rows per block
    pub fn block_size(mut self, rows: u16) -> Self {
        self.config.block_size = rows;
        self
    }

    /// Set the maximum key length (in bytes)
    pub fn max_key_len(mut self, len: usize) -> Self {
        self.config.max_key_len = len;
        self
    }

    /// Set the cap on normalized cells per `write`
    pub fn max_region_cells(mut self, cells: u64) -> Self {
        self.config.max_region_cells = cells;
        self
    }

    /// Set the initial write buffer capacity (in bytes)
    pub fn write_buffer_capacity(mut self, bytes: usize) -> Self {
        self.config.write_buffer_capacity = bytes;
        self
    }

    pub fn build(self) -> IndexConfig {
        self.config
    }
}
