//! Hierarchical cell identifiers
//!
//! A cell id is a 64-bit value in the S2 layout: 3 face bits, then 2 bits per
//! level down to level 30, then a single sentinel bit marking the level.
//!
//! ```text
//!  63..61   60 ......................................... 0
//! ┌──────┬───────────────────────────────┬───┬──────────┐
//! │ face │ 2 bits per level (1..=level)  │ 1 │ 0 ... 0  │
//! └──────┴───────────────────────────────┴───┴──────────┘
//! ```
//!
//! Every descendant of a cell has an id inside `[range_min, range_max]` of
//! that cell, so "is any indexed cell below this one" reduces to a range test
//! over sorted ids.
//!
//! Computing a covering of a geometry is the caller's job; the index only
//! needs the hierarchy arithmetic implemented here.

use std::fmt;

/// Finest cell level
pub const MAX_LEVEL: u8 = 30;

/// Number of cube faces
pub const NUM_FACES: u8 = 6;

const POS_BITS: u32 = 2 * MAX_LEVEL as u32 + 1;

/// A hierarchical cell identifier
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(pub u64);

impl CellId {
    /// Build the cell at `level` containing the leaf position `pos` on `face`
    pub fn from_face_pos_level(face: u8, pos: u64, level: u8) -> CellId {
        let pos = pos & ((1u64 << POS_BITS) - 1);
        CellId(((face as u64) << POS_BITS) + (pos | 1)).parent(level)
    }

    /// The face cell (level 0) for `face`
    pub fn from_face(face: u8) -> CellId {
        CellId(((face as u64) << POS_BITS) + lsb_for_level(0))
    }

    /// Raw 64-bit value
    pub fn id(self) -> u64 {
        self.0
    }

    pub fn face(self) -> u8 {
        (self.0 >> POS_BITS) as u8
    }

    /// Whether the id encodes a real cell (valid face, sentinel on a level boundary)
    pub fn is_valid(self) -> bool {
        self.face() < NUM_FACES && (self.lsb() & 0x1555_5555_5555_5555) != 0
    }

    /// Level of the cell, 0 (face) to 30 (leaf)
    pub fn level(self) -> u8 {
        MAX_LEVEL - (self.0.trailing_zeros() >> 1) as u8
    }

    pub fn is_leaf(self) -> bool {
        self.0 & 1 != 0
    }

    /// Lowest set bit (the level sentinel)
    pub fn lsb(self) -> u64 {
        self.0 & self.0.wrapping_neg()
    }

    /// Ancestor at `level`; `level` must not exceed `self.level()`
    pub fn parent(self, level: u8) -> CellId {
        debug_assert!(level <= self.level());
        let new_lsb = lsb_for_level(level);
        CellId((self.0 & new_lsb.wrapping_neg()) | new_lsb)
    }

    /// First leaf descendant
    pub fn range_min(self) -> CellId {
        CellId(self.0 - (self.lsb() - 1))
    }

    /// Last leaf descendant
    pub fn range_max(self) -> CellId {
        CellId(self.0 + (self.lsb() - 1))
    }

    /// Whether `other` is this cell or one of its descendants
    pub fn contains(self, other: CellId) -> bool {
        other >= self.range_min() && other <= self.range_max()
    }

    /// First descendant at `level`
    pub fn child_begin(self, level: u8) -> CellId {
        debug_assert!(level >= self.level());
        CellId(self.0 - self.lsb() + lsb_for_level(level))
    }

    /// One past the last descendant at `level` (exclusive bound)
    pub fn child_end(self, level: u8) -> CellId {
        debug_assert!(level >= self.level());
        CellId(self.0 + self.lsb() + lsb_for_level(level))
    }

    /// Next cell at the same level in curve order
    pub fn next(self) -> CellId {
        CellId(self.0.wrapping_add(self.lsb() << 1))
    }

    /// Iterate the descendants of this cell at `level`
    pub fn children_at(self, level: u8) -> impl Iterator<Item = CellId> {
        let end = self.child_end(level);
        let mut current = self.child_begin(level);
        std::iter::from_fn(move || {
            if current == end {
                return None;
            }
            let cell = current;
            current = current.next();
            Some(cell)
        })
    }

    /// Parse a cell id from decimal or `0x`-prefixed hex text
    pub fn parse(text: &str) -> Option<CellId> {
        let text = text.trim();
        let id = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16).ok()?,
            None => text.parse().ok()?,
        };
        Some(CellId(id))
    }
}

impl fmt::Debug for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellId({:#018x})", self.0)
    }
}

impl From<u64> for CellId {
    fn from(id: u64) -> Self {
        CellId(id)
    }
}

fn lsb_for_level(level: u8) -> u64 {
    1u64 << (2 * (MAX_LEVEL - level) as u32)
}

// =============================================================================
// Level Normalization
// =============================================================================

/// Which cell levels are stored in an index
///
/// Index levels are `min_level`, `min_level + stride`, `min_level + 2*stride`
/// and so on, plus the leaf level 30, which is always indexed. A cell finer
/// than the last grid level is clamped to the leaf level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelPolicy {
    pub min_level: u8,
    pub stride: u8,
}

impl LevelPolicy {
    pub fn new(min_level: u8, stride: u8) -> Self {
        Self {
            min_level: min_level.min(MAX_LEVEL),
            stride: stride.max(1),
        }
    }

    fn on_grid(&self, level: u8) -> bool {
        level >= self.min_level && (level - self.min_level) % self.stride == 0
    }

    pub fn is_index_level(&self, level: u8) -> bool {
        level <= MAX_LEVEL && (level == MAX_LEVEL || self.on_grid(level))
    }

    /// Smallest index level at or below (finer than) `level`
    pub fn index_level_for(&self, level: u8) -> u8 {
        let start = level.max(self.min_level).min(MAX_LEVEL);
        let offset = (start - self.min_level) % self.stride;
        if offset == 0 {
            return start;
        }
        let next = start as u16 + (self.stride - offset) as u16;
        next.min(MAX_LEVEL as u16) as u8
    }

    /// Number of cells `cell` becomes once normalized
    pub fn normalized_len(&self, cell: CellId) -> u64 {
        let depth = (self.index_level_for(cell.level()) - cell.level()) as u32;
        1u64 << (2 * depth)
    }

    /// Append the normalized form of `cell` to `out`
    ///
    /// A cell already on an index level is kept; any other cell is replaced by
    /// all of its descendants at the next index level.
    pub fn normalize_into(&self, cell: CellId, out: &mut Vec<CellId>) {
        let level = cell.level();
        let target = self.index_level_for(level);
        if target == level {
            out.push(cell);
        } else {
            out.extend(cell.children_at(target));
        }
    }

    /// Normalize a whole region, returning sorted and deduplicated cells
    pub fn normalize(&self, cells: &[CellId]) -> Vec<CellId> {
        let mut out = Vec::with_capacity(cells.len());
        for &cell in cells {
            self.normalize_into(cell, &mut out);
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Ancestors of `cell` on grid levels strictly coarser than its own,
    /// finest first
    pub fn ancestors(&self, cell: CellId) -> impl Iterator<Item = CellId> {
        let stride = self.stride;
        let min_level = self.min_level;
        let level = cell.level();
        // Largest grid level below `level`, if any
        let mut next = (level > min_level)
            .then(|| min_level + (level - 1 - min_level) / stride * stride);
        std::iter::from_fn(move || {
            let current = next?;
            next = (current as u16 >= min_level as u16 + stride as u16).then(|| current - stride);
            Some(cell.parent(current))
        })
    }
}
