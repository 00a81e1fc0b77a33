//! Index Reader
//!
//! Loads an index file once and answers `contains` queries against it.
//!
//! ## Query Plan
//! ```text
//! query cells ──▶ sort, dedup
//!     │
//!     ├─▶ filter.contains_range(range_min, range_max)   descendants indexed
//!     └─▶ filter.contains(ancestor) per stride level     inside indexed cell
//!                    │
//!                    ▼
//!        skip index: ranges + values routed to blocks
//!                    │
//!                    ▼
//!   cell block rows ──▶ bitmap rows ──▶ union of key-ids ──▶ key rows
//! ```
//!
//! Columns are borrowed views over the shared read buffer, built per call.
//! Nothing is decoded until a block is actually touched.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use roaring::{MultiOps, RoaringBitmap};
use tracing::{debug, info};

use crate::cell::{CellId, LevelPolicy};
use crate::column::{BitmapColumnReader, ByteColumnReader, CellIdColumnReader, Section};
use crate::error::{GeoMapError, Result};
use crate::filter::CellFilter;
use crate::header::Header;
use crate::io::ReadBuffer;

/// An open, immutable index file
///
/// Safe to share between threads; queries never mutate state.
pub struct GeoMapReader {
    path: PathBuf,
    buffer: ReadBuffer,
    header: Header,
    policy: LevelPolicy,
    filter: CellFilter<Bytes>,
}

impl GeoMapReader {
    /// Load and validate the index at `path`
    pub fn open(path: &Path) -> Result<Self> {
        let buffer = ReadBuffer::open(path)?;
        Self::from_buffer(path, buffer)
    }

    fn from_buffer(path: &Path, buffer: ReadBuffer) -> Result<Self> {
        let header = Header::decode(buffer.as_slice(), buffer.size())?;
        let filter = CellFilter::from_bytes(buffer.slice(header.filter.offset, header.filter.size)?)?;
        let policy = LevelPolicy::new(header.min_level, header.level_stride);

        let reader = Self {
            path: path.to_path_buf(),
            buffer,
            header,
            policy,
            filter,
        };

        // Surface layout corruption at open rather than on first query
        reader.keys()?;
        reader.cells()?;
        reader.bitmaps()?;

        info!(
            path = %reader.path.display(),
            keys = header.key_entries,
            cells = header.cell_entries,
            "Index opened"
        );

        Ok(reader)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Number of distinct keys in the index
    pub fn key_count(&self) -> u32 {
        self.header.key_entries
    }

    /// Number of distinct indexed cells
    pub fn cell_count(&self) -> u32 {
        self.header.cell_entries
    }

    pub fn filter(&self) -> &CellFilter<Bytes> {
        &self.filter
    }

    fn section(&self, section: Section) -> Result<&[u8]> {
        self.buffer.view(section.offset, section.size)
    }

    fn keys(&self) -> Result<ByteColumnReader<'_>> {
        ByteColumnReader::new(
            self.section(self.header.keys)?,
            self.header.key_entries,
            self.header.block_size,
        )
    }

    fn cells(&self) -> Result<CellIdColumnReader<'_>> {
        CellIdColumnReader::new(
            self.section(self.header.cells)?,
            self.header.cell_entries,
            self.header.block_size,
        )
    }

    fn bitmaps(&self) -> Result<BitmapColumnReader<'_>> {
        BitmapColumnReader::new(
            self.section(self.header.bitmaps)?,
            self.header.cell_entries,
            self.header.block_size,
        )
    }

    /// Keys whose region contains, or is contained by, any query cell
    ///
    /// Keys come back in key-id order, each at most once.
    pub fn contains(&self, cells: &[CellId]) -> Result<Vec<Vec<u8>>> {
        if let Some(cell) = cells.iter().find(|c| !c.is_valid()) {
            return Err(GeoMapError::InvalidCell(cell.id()));
        }
        if cells.is_empty() || self.header.cell_entries == 0 {
            return Ok(Vec::new());
        }

        // A cell's descendant range covers its normalized children, and their
        // index-level ancestors are the grid levels below the cell itself, so
        // query cells are never expanded.
        let mut query = cells.to_vec();
        query.sort_unstable();
        query.dedup();

        let mut ranges: Vec<(u64, u64)> = Vec::new();
        let mut ancestors: BTreeSet<u64> = BTreeSet::new();
        for &cell in &query {
            if let Some(range) = self.filter.contains_range(cell.range_min(), cell.range_max()) {
                ranges.push(range);
            }
            for ancestor in self.policy.ancestors(cell) {
                if self.filter.contains(ancestor) {
                    ancestors.insert(ancestor.id());
                }
            }
        }

        let ranges = merge_ranges(ranges);
        let values: Vec<u64> = ancestors
            .into_iter()
            .filter(|&value| !in_ranges(&ranges, value))
            .collect();

        if ranges.is_empty() && values.is_empty() {
            debug!(query_cells = cells.len(), "Filter rejected query");
            return Ok(Vec::new());
        }

        let cell_column = self.cells()?;
        let bitmap_column = self.bitmaps()?;
        let plan = cell_column.block_index().query_values_blocks(&ranges, &values);

        let mut matched: Vec<RoaringBitmap> = Vec::new();
        for query in &plan {
            let block = cell_column.read_block(query.block_id)?;
            let rows = block.query_value_indexes(&query.values);
            let row_ranges = block.query_value_ranges_indexes(&query.ranges);
            if rows.is_empty() && row_ranges.is_empty() {
                continue;
            }

            let bitmaps = bitmap_column.read_block(query.block_id)?;
            matched.extend(bitmaps.read_indexes(&rows)?);
            matched.extend(bitmaps.read_index_ranges(&row_ranges)?);
        }

        let key_ids: RoaringBitmap = matched.into_iter().union();
        let keys = self.keys()?.read_rows(key_ids.iter())?;

        debug!(
            query_cells = cells.len(),
            distinct = query.len(),
            ranges = ranges.len(),
            ancestors = values.len(),
            blocks = plan.len(),
            keys = keys.len(),
            "Contains query"
        );

        Ok(keys)
    }

    /// Not defined for this index format
    pub fn intersects(&self, _cells: &[CellId]) -> Result<Vec<Vec<u8>>> {
        Err(GeoMapError::Unsupported("intersects"))
    }
}

/// Sort and merge overlapping inclusive ranges
fn merge_ranges(mut ranges: Vec<(u64, u64)>) -> Vec<(u64, u64)> {
    ranges.sort_unstable();
    let mut merged: Vec<(u64, u64)> = Vec::with_capacity(ranges.len());
    for (lo, hi) in ranges {
        match merged.last_mut() {
            Some(last) if lo <= last.1 => last.1 = last.1.max(hi),
            _ => merged.push((lo, hi)),
        }
    }
    merged
}

/// Whether `value` lies in one of the sorted, disjoint `ranges`
fn in_ranges(ranges: &[(u64, u64)], value: u64) -> bool {
    let index = ranges.partition_point(|&(_, hi)| hi < value);
    ranges.get(index).map_or(false, |&(lo, _)| lo <= value)
}
