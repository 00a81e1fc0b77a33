//! Fixed-width blocks
//!
//! Sorted same-width integers stored back to back. Row lookups are pure
//! offset arithmetic and value lookups are binary searches over the block.

use std::fmt;

use crate::codec::{encode_all, FixedValue, FixedView};
use crate::error::{GeoMapError, Result};
use crate::io::WriteBuffer;

use super::BlockSummary;

/// Accumulates one fixed-width block
///
/// Values must arrive in ascending order; the block's last value is its
/// maximum and becomes its skip-index entry.
#[derive(Debug, Clone)]
pub struct FixedBlockWriter<T> {
    capacity: usize,
    values: Vec<T>,
}

impl<T: FixedValue> FixedBlockWriter<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            values: Vec::with_capacity(capacity.min(4096)),
        }
    }

    /// Append a value; returns `false` without inserting when the block is full
    pub fn insert_value(&mut self, value: T) -> bool {
        if self.values.len() >= self.capacity {
            return false;
        }
        debug_assert!(self.values.last().map_or(true, |&last| last <= value));
        self.values.push(value);
        true
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() >= self.capacity
    }

    /// Size and maximum the block will have once written
    pub fn summary(&self) -> Option<BlockSummary<T>> {
        self.values.last().map(|&max| BlockSummary {
            size: (self.values.len() * T::WIDTH) as u64,
            max,
        })
    }

    /// Write the block at the buffer cursor
    pub fn finish(&self, out: &mut WriteBuffer) -> Result<BlockSummary<T>> {
        let summary = self
            .summary()
            .ok_or_else(|| GeoMapError::InvalidInput("cannot finalize an empty block".to_string()))?;
        out.write(&encode_all(&self.values));
        Ok(summary)
    }
}

/// Read access to one fixed-width block
#[derive(Clone, Copy)]
pub struct FixedBlockReader<'a, T> {
    values: FixedView<'a, T>,
}

impl<T: FixedValue> fmt::Debug for FixedBlockReader<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedBlockReader")
            .field("values", &self.values)
            .finish()
    }
}

impl<'a, T: FixedValue> FixedBlockReader<'a, T> {
    /// Wrap `entries` values packed at the start of `bytes`
    pub fn new(bytes: &'a [u8], entries: usize) -> Result<Self> {
        Ok(Self {
            values: FixedView::new(bytes, entries)?,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> FixedView<'a, T> {
        self.values
    }

    /// Values at the given row positions, in the order requested
    pub fn read_indexes(&self, indexes: &[u32]) -> Result<Vec<T>> {
        indexes
            .iter()
            .map(|&index| self.values.try_get(index as usize))
            .collect()
    }

    /// Values for each inclusive `(start, end)` row range, ranges in order
    pub fn read_index_ranges(&self, ranges: &[(u32, u32)]) -> Result<Vec<T>> {
        let mut out = Vec::new();
        for &(start, end) in ranges {
            check_index_range(start, end, self.values.len())?;
            out.extend((start..=end).map(|index| self.values.get(index as usize)));
        }
        Ok(out)
    }

    /// Row positions of each query value present in the block
    ///
    /// Absent values produce no entry.
    ///
    /// # Panics
    /// If `query_values` is not sorted ascending.
    pub fn query_value_indexes(&self, query_values: &[T]) -> Vec<u32> {
        assert!(
            query_values.windows(2).all(|w| w[0] <= w[1]),
            "query values must be sorted"
        );

        let mut indexes = Vec::with_capacity(query_values.len());
        let mut from = 0;
        for &value in query_values {
            let index = self.values.lower_bound(from, value);
            let found = index < self.values.len() && self.values.get(index) == value;
            if found && indexes.last() != Some(&(index as u32)) {
                indexes.push(index as u32);
            }
            from = index;
        }
        indexes
    }

    /// Inclusive row ranges holding values inside each `[lo, hi]` query range
    ///
    /// Overlapping or adjacent row ranges are merged into one.
    ///
    /// # Panics
    /// If any range has `lo > hi` or ranges are not sorted by `lo`.
    pub fn query_value_ranges_indexes(&self, query_ranges: &[(T, T)]) -> Vec<(u32, u32)> {
        assert!(
            query_ranges.iter().all(|(lo, hi)| lo <= hi),
            "query ranges must be non-decreasing"
        );
        assert!(
            query_ranges.windows(2).all(|w| w[0].0 <= w[1].0),
            "query ranges must be sorted"
        );

        let mut index_ranges: Vec<(u32, u32)> = Vec::new();
        for &(lo, hi) in query_ranges {
            let lower = self.values.lower_bound(0, lo);
            let upper = self.values.upper_bound(lower, hi);
            if lower >= upper {
                continue;
            }

            let (start, end) = (lower as u32, (upper - 1) as u32);
            match index_ranges.last_mut() {
                Some(last) if last.1 + 1 >= start => last.1 = last.1.max(end),
                _ => index_ranges.push((start, end)),
            }
        }
        index_ranges
    }
}

pub(crate) fn check_index_range(start: u32, end: u32, len: usize) -> Result<()> {
    if start > end {
        return Err(GeoMapError::InvalidInput(format!(
            "index range {}..={} is inverted",
            start, end
        )));
    }
    if end as usize >= len {
        return Err(GeoMapError::out_of_bounds(start as usize, (end - start) as usize + 1, len));
    }
    Ok(())
}
