//! Little-endian primitive codec
//!
//! Every structured region of the file is a packed little-endian array or a
//! fixed record. Encoding goes through `bytes::BufMut`, decoding through
//! `bytes::Buf` after an explicit bounds check so a truncated file surfaces
//! as `OutOfBounds` instead of a panic.

use std::fmt;
use std::marker::PhantomData;

use bytes::{Buf, BufMut};

use crate::error::{GeoMapError, Result};

/// Check that `[offset, offset + len)` lies inside a buffer of `size` bytes
pub fn check_range(offset: usize, len: usize, size: usize) -> Result<()> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(GeoMapError::out_of_bounds(offset, len, size)),
    }
}

pub fn read_u8(src: &[u8], offset: usize) -> Result<u8> {
    check_range(offset, 1, src.len())?;
    Ok(src[offset])
}

pub fn read_u16(src: &[u8], offset: usize) -> Result<u16> {
    check_range(offset, 2, src.len())?;
    Ok((&src[offset..]).get_u16_le())
}

pub fn read_u32(src: &[u8], offset: usize) -> Result<u32> {
    check_range(offset, 4, src.len())?;
    Ok((&src[offset..]).get_u32_le())
}

pub fn read_u64(src: &[u8], offset: usize) -> Result<u64> {
    check_range(offset, 8, src.len())?;
    Ok((&src[offset..]).get_u64_le())
}

// =============================================================================
// Fixed-Width Values
// =============================================================================

/// An integer stored at a fixed width in little-endian order
pub trait FixedValue: Copy + Ord + fmt::Debug {
    /// Encoded width in bytes
    const WIDTH: usize;

    fn put<B: BufMut>(self, out: &mut B);

    /// Decode from the first `WIDTH` bytes of `src`
    fn get(src: &[u8]) -> Self;
}

impl FixedValue for u16 {
    const WIDTH: usize = 2;

    fn put<B: BufMut>(self, out: &mut B) {
        out.put_u16_le(self);
    }

    fn get(mut src: &[u8]) -> Self {
        src.get_u16_le()
    }
}

impl FixedValue for u32 {
    const WIDTH: usize = 4;

    fn put<B: BufMut>(self, out: &mut B) {
        out.put_u32_le(self);
    }

    fn get(mut src: &[u8]) -> Self {
        src.get_u32_le()
    }
}

impl FixedValue for u64 {
    const WIDTH: usize = 8;

    fn put<B: BufMut>(self, out: &mut B) {
        out.put_u64_le(self);
    }

    fn get(mut src: &[u8]) -> Self {
        src.get_u64_le()
    }
}

/// Encode a slice of values back to back
pub fn encode_all<T: FixedValue>(values: &[T]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * T::WIDTH);
    for &value in values {
        value.put(&mut out);
    }
    out
}

// =============================================================================
// Zero-Copy Array View
// =============================================================================

/// A borrowed, packed array of fixed-width values
///
/// Nothing is decoded until an element is accessed.
#[derive(Clone, Copy)]
pub struct FixedView<'a, T> {
    bytes: &'a [u8],
    len: usize,
    _marker: PhantomData<T>,
}

impl<'a, T: FixedValue> FixedView<'a, T> {
    /// View the first `len` values of `bytes`
    pub fn new(bytes: &'a [u8], len: usize) -> Result<Self> {
        let width = len
            .checked_mul(T::WIDTH)
            .ok_or_else(|| GeoMapError::out_of_bounds(0, usize::MAX, bytes.len()))?;
        check_range(0, width, bytes.len())?;
        Ok(Self {
            bytes: &bytes[..width],
            len,
            _marker: PhantomData,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes covered by the view
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Value at `index`; the caller guarantees `index < len`
    pub fn get(&self, index: usize) -> T {
        T::get(&self.bytes[index * T::WIDTH..])
    }

    pub fn try_get(&self, index: usize) -> Result<T> {
        if index >= self.len {
            return Err(GeoMapError::out_of_bounds(index, 1, self.len));
        }
        Ok(self.get(index))
    }

    pub fn last(&self) -> Option<T> {
        self.len.checked_sub(1).map(|i| self.get(i))
    }

    /// First position in `[from, len)` whose value is `>= value`
    pub fn lower_bound(&self, from: usize, value: T) -> usize {
        self.partition_point(from, |v| v < value)
    }

    /// First position in `[from, len)` whose value is `> value`
    pub fn upper_bound(&self, from: usize, value: T) -> usize {
        self.partition_point(from, |v| v <= value)
    }

    fn partition_point(&self, from: usize, pred: impl Fn(T) -> bool) -> usize {
        let mut lo = from.min(self.len);
        let mut hi = self.len;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if pred(self.get(mid)) {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}

impl<T: FixedValue> fmt::Debug for FixedView<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
