//! Existence Filter
//!
//! An immutable `fst::Set` over every indexed cell id. Each id is stored as its
//! 8 big-endian bytes, so lexicographic key order equals numeric id order and
//! range queries over ids become range streams over keys.
//!
//! The filter answers two questions without touching any column:
//! - is this exact id indexed (`contains`)
//! - which indexed ids, if any, fall inside `[lo, hi]` (`contains_range`)

use fst::{IntoStreamer, Set, Streamer};

use crate::cell::CellId;
use crate::error::Result;

/// Width of an encoded filter key
pub const KEY_WIDTH: usize = 8;

fn encode_key(id: u64) -> [u8; KEY_WIDTH] {
    id.to_be_bytes()
}

fn decode_key(key: &[u8]) -> Option<u64> {
    let bytes: [u8; KEY_WIDTH] = key.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

/// Accumulates cell ids for a filter
#[derive(Debug, Default)]
pub struct CellFilterBuilder {
    ids: Vec<u64>,
}

impl CellFilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, cell: CellId) {
        self.ids.push(cell.id());
    }

    pub fn insert_many(&mut self, cells: &[CellId]) {
        self.ids.extend(cells.iter().map(|c| c.id()));
    }

    /// Ids inserted so far, duplicates included
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Sort, deduplicate and freeze into an in-memory filter
    pub fn build(mut self) -> Result<CellFilter<Vec<u8>>> {
        self.ids.sort_unstable();
        self.ids.dedup();
        let set = Set::from_iter(self.ids.iter().map(|&id| encode_key(id)))?;
        Ok(CellFilter { set })
    }
}

/// Read side of the existence filter
pub struct CellFilter<D> {
    set: Set<D>,
}

impl<D: AsRef<[u8]>> CellFilter<D> {
    /// Wrap a serialized filter
    pub fn from_bytes(data: D) -> Result<Self> {
        Ok(Self { set: Set::new(data)? })
    }

    /// Number of distinct ids in the filter
    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Serialized form, as written to the filter section
    pub fn as_bytes(&self) -> &[u8] {
        self.set.as_fst().as_bytes()
    }

    /// Exact membership
    pub fn contains(&self, cell: CellId) -> bool {
        self.set.contains(encode_key(cell.id()))
    }

    /// Smallest and largest indexed ids inside `[lo, hi]`
    ///
    /// Returns `None` when no indexed id lies in the range. A single matching
    /// id comes back as `(id, id)`. The largest id is found by bisecting the
    /// id space with range seeks, so the cost does not grow with the number of
    /// ids inside the range.
    pub fn contains_range(&self, lo: CellId, hi: CellId) -> Option<(u64, u64)> {
        if lo > hi {
            return None;
        }
        let first = self.first_in(lo.id(), hi.id())?;

        // Invariant: some id lies in `[low, hi]`, none lies in `(high, hi]`
        let (mut low, mut high) = (first, hi.id());
        while low < high {
            let mid = low + (high - low) / 2 + 1;
            if let Some(next) = self.first_in(mid, hi.id()) {
                low = next;
            } else {
                high = mid - 1;
            }
        }
        Some((first, low))
    }

    /// Smallest indexed id inside `[lo, hi]`
    fn first_in(&self, lo: u64, hi: u64) -> Option<u64> {
        let mut stream = self
            .set
            .range()
            .ge(encode_key(lo))
            .le(encode_key(hi))
            .into_stream();
        stream.next().and_then(decode_key)
    }

    /// Every id in ascending order
    pub fn ids(&self) -> Vec<u64> {
        let mut out = Vec::with_capacity(self.set.len());
        let mut stream = self.set.stream();
        while let Some(key) = stream.next() {
            if let Some(id) = decode_key(key) {
                out.push(id);
            }
        }
        out
    }
}
