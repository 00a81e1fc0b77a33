//! Block value (skip) index
//!
//! Stores the maximum of every block of a sorted column. Binary search over
//! these maxima routes an exact value or a `[lo, hi]` range straight to the
//! block ids that can hold it, without touching block payloads.

use std::collections::BTreeMap;
use std::fmt;

use crate::codec::{encode_all, FixedValue, FixedView};
use crate::error::Result;
use crate::io::WriteBuffer;

/// Collects per-block maxima while a sorted column is written
#[derive(Debug, Clone)]
pub struct BlockValueIndexWriter<T> {
    maxes: Vec<T>,
}

impl<T: FixedValue> Default for BlockValueIndexWriter<T> {
    fn default() -> Self {
        Self { maxes: Vec::new() }
    }
}

impl<T: FixedValue> BlockValueIndexWriter<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the next block's maximum
    pub fn push_block(&mut self, max: T) {
        debug_assert!(self.maxes.last().map_or(true, |&last| last <= max));
        self.maxes.push(max);
    }

    pub fn len(&self) -> usize {
        self.maxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maxes.is_empty()
    }

    /// Bytes the index occupies once written
    pub fn byte_size(&self) -> u64 {
        (self.maxes.len() * T::WIDTH) as u64
    }

    pub fn write_to(&self, out: &mut WriteBuffer) -> u64 {
        out.write(&encode_all(&self.maxes)).1
    }
}

/// Query work routed to a single block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockQuery<T> {
    pub block_id: u32,
    /// Inclusive value ranges that may have rows in this block
    pub ranges: Vec<(T, T)>,
    /// Exact values that may have a row in this block
    pub values: Vec<T>,
}

/// Read side of the block value index
#[derive(Clone, Copy)]
pub struct BlockValueIndexReader<'a, T> {
    maxes: FixedView<'a, T>,
}

impl<T: FixedValue> fmt::Debug for BlockValueIndexReader<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockValueIndexReader")
            .field("blocks", &self.maxes.len())
            .field("maxes", &self.maxes)
            .finish()
    }
}

impl<'a, T: FixedValue> BlockValueIndexReader<'a, T> {
    /// Wrap the maxima of `blocks` blocks packed at the start of `bytes`
    pub fn new(bytes: &'a [u8], blocks: usize) -> Result<Self> {
        Ok(Self {
            maxes: FixedView::new(bytes, blocks)?,
        })
    }

    pub fn block_count(&self) -> usize {
        self.maxes.len()
    }

    /// Bytes this index occupies
    pub fn byte_size(&self) -> usize {
        self.maxes.byte_len()
    }

    /// Block that would hold `value`, if any block's maximum reaches it
    pub fn block_for_value(&self, value: T) -> Option<u32> {
        let block = self.maxes.lower_bound(0, value);
        (block < self.maxes.len()).then_some(block as u32)
    }

    /// Inclusive block id range that may hold values inside `[lo, hi]`
    pub fn blocks_for_range(&self, lo: T, hi: T) -> Option<(u32, u32)> {
        let start = self.maxes.lower_bound(0, lo);
        if start >= self.maxes.len() {
            return None;
        }
        let end = self.maxes.lower_bound(start, hi).min(self.maxes.len() - 1);
        Some((start as u32, end as u32))
    }

    /// Group query ranges and exact values by the blocks they touch
    ///
    /// Results are ordered by block id. Within a block, overlapping ranges are
    /// merged and repeated values dropped. Ranges and values are assumed not to
    /// overlap each other; that is established by the caller.
    ///
    /// # Panics
    /// If `values` is unsorted, `ranges` is not sorted by `lo`, or a range has
    /// `lo > hi`.
    pub fn query_values_blocks(&self, ranges: &[(T, T)], values: &[T]) -> Vec<BlockQuery<T>> {
        assert!(values.windows(2).all(|w| w[0] <= w[1]), "query values must be sorted");
        assert!(
            ranges.windows(2).all(|w| w[0].0 <= w[1].0),
            "query ranges must be sorted"
        );
        assert!(ranges.iter().all(|(lo, hi)| lo <= hi), "query ranges must be non-decreasing");

        let mut blocks: BTreeMap<u32, BlockQuery<T>> = BTreeMap::new();

        for &(lo, hi) in ranges {
            if let Some((start, end)) = self.blocks_for_range(lo, hi) {
                for block_id in start..=end {
                    push_range(block_query(&mut blocks, block_id), (lo, hi));
                }
            }
        }

        for &value in values {
            if let Some(block_id) = self.block_for_value(value) {
                let query = block_query(&mut blocks, block_id);
                if query.values.last() != Some(&value) {
                    query.values.push(value);
                }
            }
        }

        blocks.into_values().collect()
    }
}

fn block_query<T>(blocks: &mut BTreeMap<u32, BlockQuery<T>>, block_id: u32) -> &mut BlockQuery<T> {
    blocks.entry(block_id).or_insert_with(|| BlockQuery {
        block_id,
        ranges: Vec::new(),
        values: Vec::new(),
    })
}

fn push_range<T: FixedValue>(query: &mut BlockQuery<T>, (lo, hi): (T, T)) {
    match query.ranges.last_mut() {
        Some(last) if lo <= last.1 => last.1 = last.1.max(hi),
        _ => query.ranges.push((lo, hi)),
    }
}
