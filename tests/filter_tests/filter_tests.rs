//! Tests for the cell existence filter
//!
//! These tests verify:
//! - Exact membership for inserted and absent ids
//! - Range existence with smallest/largest matched ids, checked against a sorted set
//! - Serialized filters reopen from bytes

use std::collections::BTreeSet;

use bytes::Bytes;
use geomap::cell::MAX_LEVEL;
use geomap::filter::{CellFilter, CellFilterBuilder};
use geomap::CellId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// =============================================================================
// Helper Functions
// =============================================================================

fn filter_of(ids: &[u64]) -> CellFilter<Vec<u8>> {
    let mut builder = CellFilterBuilder::new();
    let cells: Vec<CellId> = ids.iter().map(|&id| CellId(id)).collect();
    builder.insert_many(&cells);
    builder.build().unwrap()
}

// =============================================================================
// Membership Tests
// =============================================================================

#[test]
fn test_contains_exact_ids() {
    let filter = filter_of(&[500, 7, 1 << 40, u64::MAX]);

    assert!(filter.contains(CellId(7)));
    assert!(filter.contains(CellId(500)));
    assert!(filter.contains(CellId(1 << 40)));
    assert!(filter.contains(CellId(u64::MAX)));
    assert!(!filter.contains(CellId(8)));
    assert!(!filter.contains(CellId(0)));
}

#[test]
fn test_empty_filter() {
    let filter = CellFilterBuilder::new().build().unwrap();
    assert!(filter.is_empty());
    assert!(!filter.contains(CellId(1)));
    assert_eq!(filter.contains_range(CellId(0), CellId(u64::MAX)), None);
}

// =============================================================================
// Range Tests
// =============================================================================

#[test]
fn test_range_without_ids_is_not_found() {
    let filter = filter_of(&[10, 20, 30]);

    assert_eq!(filter.contains_range(CellId(11), CellId(19)), None);
    assert_eq!(filter.contains_range(CellId(31), CellId(1000)), None);
    assert_eq!(filter.contains_range(CellId(0), CellId(9)), None);
}

#[test]
fn test_range_reports_matched_bounds() {
    let filter = filter_of(&[10, 20, 30, 40]);

    assert_eq!(filter.contains_range(CellId(15), CellId(35)), Some((20, 30)));
    assert_eq!(filter.contains_range(CellId(10), CellId(40)), Some((10, 40)));
    assert_eq!(filter.contains_range(CellId(0), CellId(u64::MAX)), Some((10, 40)));
}

#[test]
fn test_range_with_single_id() {
    let filter = filter_of(&[10, 20, 30]);

    assert_eq!(filter.contains_range(CellId(19), CellId(21)), Some((20, 20)));
    assert_eq!(filter.contains_range(CellId(20), CellId(20)), Some((20, 20)));
}

#[test]
fn test_inverted_range_is_not_found() {
    let filter = filter_of(&[10, 20, 30]);
    assert_eq!(filter.contains_range(CellId(30), CellId(10)), None);
}

#[test]
fn test_descendant_range_of_cell() {
    let parent = CellId::from_face_pos_level(2, 0x1234_5678, 12);
    let inside = parent.child_begin(MAX_LEVEL).next().next();
    let outside = parent.next().child_begin(MAX_LEVEL);
    let filter = filter_of(&[inside.id(), outside.id()]);

    assert_eq!(
        filter.contains_range(parent.range_min(), parent.range_max()),
        Some((inside.id(), inside.id()))
    );
}

#[test]
fn test_range_bounds_match_sorted_set() {
    let mut rng = StdRng::seed_from_u64(5);
    let ids: BTreeSet<u64> = (0..20_000).map(|_| rng.gen_range(0..1u64 << 40)).collect();
    let sorted: Vec<u64> = ids.iter().copied().collect();
    let filter = filter_of(&sorted);

    for _ in 0..500 {
        let a = rng.gen_range(0..1u64 << 40);
        let b = a.saturating_add(rng.gen_range(0..1u64 << 36));
        let expected = ids
            .range(a..=b)
            .next()
            .map(|&first| (first, *ids.range(a..=b).next_back().unwrap()));
        assert_eq!(filter.contains_range(CellId(a), CellId(b)), expected, "range [{}, {}]", a, b);
    }
}

#[test]
fn test_range_over_dense_ids() {
    let ids: Vec<u64> = (1_000..201_000).collect();
    let filter = filter_of(&ids);

    assert_eq!(filter.contains_range(CellId(0), CellId(u64::MAX)), Some((1_000, 200_999)));
    assert_eq!(filter.contains_range(CellId(150_000), CellId(1 << 50)), Some((150_000, 200_999)));
    assert_eq!(filter.contains_range(CellId(0), CellId(1_000)), Some((1_000, 1_000)));
    assert_eq!(filter.contains_range(CellId(200_999), CellId(u64::MAX)), Some((200_999, 200_999)));
}

// =============================================================================
// Serialization Tests
// =============================================================================

#[test]
fn test_filter_reopens_from_bytes() {
    let filter = filter_of(&[3, 1, 4, 1, 5, 9, 2, 6]);
    let bytes = Bytes::copy_from_slice(filter.as_bytes());

    let reopened = CellFilter::from_bytes(bytes).unwrap();
    assert_eq!(reopened.len(), 7);
    assert_eq!(reopened.ids(), vec![1, 2, 3, 4, 5, 6, 9]);
    assert_eq!(reopened.contains_range(CellId(7), CellId(8)), None);
}

#[test]
fn test_garbage_bytes_are_rejected() {
    assert!(CellFilter::from_bytes(vec![1u8, 2, 3]).is_err());
}
