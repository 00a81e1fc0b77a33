//! Index Writer
//!
//! Accumulates `(region, key)` pairs in memory and serializes them into an
//! immutable index file in a single `build` call.
//!
//! ## Build Pipeline
//! ```text
//! write(region, key) ──▶ normalize ──▶ filter builder
//!                                 └──▶ key → cell set
//!
//! build(path):
//!   1. order keys by (first cell, key bytes), assign key-ids
//!   2. invert to cell → key-id bitmap
//!   3. reserve header, write filter, keys, cells, bitmaps
//!   4. rewind, write header, flush
//! ```
//!
//! A writer is single use: `build` consumes it. A failed build leaves the
//! output file in an unusable state.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use roaring::RoaringBitmap;
use tracing::{debug, info};

use crate::cell::{CellId, LevelPolicy};
use crate::column::{BitmapColumnWriter, ByteColumnWriter, CellIdColumnWriter, Section};
use crate::config::IndexConfig;
use crate::error::{GeoMapError, Result};
use crate::filter::CellFilterBuilder;
use crate::header::{Header, FILE_TYPE, HEADER_SIZE};
use crate::io::WriteBuffer;

/// Summary of a finished build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStats {
    /// Distinct keys written
    pub key_count: u32,
    /// Distinct indexed cells
    pub cell_count: u32,
    pub key_blocks: u32,
    pub cell_blocks: u32,
    pub filter_size: u64,
    pub keys_size: u64,
    pub cells_size: u64,
    pub bitmaps_size: u64,
    /// Total bytes on disk, header included
    pub file_size: u64,
}

/// Builds one index file
pub struct GeoMapWriter {
    config: IndexConfig,
    policy: LevelPolicy,
    filter: CellFilterBuilder,
    /// Key → normalized cell ids of every region written under it
    regions: BTreeMap<Vec<u8>, BTreeSet<u64>>,
}

impl GeoMapWriter {
    pub fn new(config: IndexConfig) -> Result<Self> {
        config.validate()?;
        let policy = LevelPolicy::new(config.min_level, config.level_stride);
        Ok(Self {
            config,
            policy,
            filter: CellFilterBuilder::new(),
            regions: BTreeMap::new(),
        })
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Number of distinct keys written so far
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Record that `key` covers the region `cells`
    ///
    /// Writing a key again adds the new cells to its region. On error nothing
    /// is recorded.
    pub fn write(&mut self, cells: &[CellId], key: &[u8]) -> Result<()> {
        if cells.is_empty() {
            return Err(GeoMapError::InvalidInput("region has no cells".to_string()));
        }
        if key.len() > self.config.max_key_len {
            return Err(GeoMapError::Capacity(format!(
                "key of {} bytes exceeds limit of {}",
                key.len(),
                self.config.max_key_len
            )));
        }
        if let Some(cell) = cells.iter().find(|c| !c.is_valid()) {
            return Err(GeoMapError::InvalidCell(cell.id()));
        }
        let expanded = cells
            .iter()
            .fold(0u64, |total, &cell| total.saturating_add(self.policy.normalized_len(cell)));
        if expanded > self.config.max_region_cells {
            return Err(GeoMapError::Capacity(format!(
                "region normalizes to {} cells, limit is {}",
                expanded, self.config.max_region_cells
            )));
        }

        let normalized = self.policy.normalize(cells);
        self.filter.insert_many(&normalized);
        self.regions
            .entry(key.to_vec())
            .or_default()
            .extend(normalized.iter().map(|c| c.id()));
        Ok(())
    }

    /// Serialize everything written so far to `path`
    pub fn build(self, path: &Path) -> Result<BuildStats> {
        let Self {
            config,
            policy,
            filter,
            regions,
        } = self;

        let key_count = u32::try_from(regions.len()).map_err(|_| {
            GeoMapError::Capacity(format!("{} keys exceed the u32 key-id space", regions.len()))
        })?;

        // Key-ids follow (first cell, key bytes) so nearby keys share blocks
        let mut ordered: Vec<(u64, Vec<u8>, BTreeSet<u64>)> = regions
            .into_iter()
            .map(|(key, cells)| (cells.first().copied().unwrap_or(0), key, cells))
            .collect();
        ordered.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));

        let mut inverted: BTreeMap<u64, RoaringBitmap> = BTreeMap::new();
        for (key_id, (_, _, cells)) in ordered.iter().enumerate() {
            for &cell in cells {
                inverted.entry(cell).or_default().insert(key_id as u32);
            }
        }

        let cell_count = u32::try_from(inverted.len()).map_err(|_| {
            GeoMapError::Capacity(format!("{} cells exceed the u32 row space", inverted.len()))
        })?;

        debug!(
            keys = key_count,
            cells = cell_count,
            path = %path.display(),
            "Inverted index assembled"
        );

        let mut out = WriteBuffer::create(path, config.write_buffer_capacity)?;

        // Placeholder; the real header is written once section sizes are known
        out.write(&[0u8; HEADER_SIZE]);

        let filter = filter.build()?;
        let filter_section = Section::from(out.write(filter.as_bytes()));

        let mut keys = ByteColumnWriter::new(config.block_size);
        for (_, key, _) in ordered {
            keys.add_bytes(key);
        }
        let keys_section = keys.write_to(&mut out)?;

        let mut cells = CellIdColumnWriter::new(config.block_size);
        let mut bitmaps = BitmapColumnWriter::new(config.block_size);
        for (cell, bitmap) in inverted {
            cells.add_value(cell)?;
            bitmaps.add_bitmap(bitmap);
        }
        let cells_section = cells.write_to(&mut out)?;
        let bitmaps_section = bitmaps.write_to(&mut out)?;

        let header = Header {
            filter: filter_section,
            keys: keys_section,
            cells: cells_section,
            bitmaps: bitmaps_section,
            key_entries: key_count,
            cell_entries: cell_count,
            level_stride: policy.stride,
            block_size: config.block_size,
            file_type: FILE_TYPE,
            min_level: policy.min_level,
        };

        out.reset();
        out.write(&header.encode());
        out.flush(0)?;

        let block_size = config.block_size as u32;
        let stats = BuildStats {
            key_count,
            cell_count,
            key_blocks: crate::block::determine_blocks(block_size, key_count),
            cell_blocks: crate::block::determine_blocks(block_size, cell_count),
            filter_size: filter_section.size,
            keys_size: keys_section.size,
            cells_size: cells_section.size,
            bitmaps_size: bitmaps_section.size,
            file_size: out.len(),
        };

        info!(
            keys = stats.key_count,
            cells = stats.cell_count,
            bytes = stats.file_size,
            path = %path.display(),
            "Index built"
        );

        Ok(stats)
    }
}
