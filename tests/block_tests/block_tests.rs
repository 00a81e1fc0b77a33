//! Tests for fixed and variable-width blocks
//!
//! These tests verify:
//! - Block capacity and rollover at exactly block size
//! - Exact row lookup for every stored value (and none for absent values)
//! - Merging of overlapping and adjacent range lookups
//! - Variable-width payload slicing by row

use std::fs;

use geomap::block::{
    block_entries, determine_blocks, FixedBlockReader, FixedBlockWriter, VarBlockReader,
    VarBlockWriter,
};
use geomap::codec::encode_all;
use geomap::io::WriteBuffer;
use geomap::GeoMapError;
use roaring::RoaringBitmap;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

/// Run `write` against a fresh buffer and return the flushed bytes
fn written_bytes<F>(write: F) -> Vec<u8>
where
    F: FnOnce(&mut WriteBuffer),
{
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("block.bin");
    let mut out = WriteBuffer::create(&path, 256).unwrap();
    write(&mut out);
    out.flush(0).unwrap();
    fs::read(&path).unwrap()
}

fn sample_values() -> Vec<u64> {
    vec![3, 8, 15, 16, 23, 42, 99, 1000]
}

// =============================================================================
// Block Sizing Tests
// =============================================================================

#[test]
fn test_determine_blocks_matches_ceiling() {
    for block_size in [1u32, 2, 7, 512, 1024] {
        for total in [0u32, 1, 2, block_size - 1, block_size, block_size + 1, 5 * block_size + 3] {
            let expected = (total as f64 / block_size as f64).ceil() as u32;
            assert_eq!(determine_blocks(block_size, total), expected);
        }
    }
}

#[test]
fn test_block_fills_exactly_at_capacity() {
    let block_size = 4;
    let mut writer = FixedBlockWriter::<u64>::new(block_size);

    for value in 0..block_size as u64 {
        assert!(writer.insert_value(value));
    }
    assert!(writer.is_full());
    assert_eq!(writer.len(), block_size);

    // One more value does not fit
    assert!(!writer.insert_value(99));
    assert_eq!(writer.len(), block_size);
}

#[test]
fn test_one_past_capacity_needs_second_block() {
    let block_size = 4u32;
    assert_eq!(determine_blocks(block_size, block_size), 1);
    assert_eq!(determine_blocks(block_size, block_size + 1), 2);
    assert_eq!(block_entries(0, block_size, block_size + 1), block_size);
    assert_eq!(block_entries(1, block_size, block_size + 1), 1);
}

// =============================================================================
// FixedBlockWriter Tests
// =============================================================================

#[test]
fn test_fixed_block_summary_and_layout() {
    let mut writer = FixedBlockWriter::<u64>::new(8);
    for value in sample_values() {
        writer.insert_value(value);
    }

    let summary = writer.summary().unwrap();
    assert_eq!(summary.max, 1000);
    assert_eq!(summary.size, 64);

    let bytes = written_bytes(|out| {
        writer.finish(out).unwrap();
    });
    assert_eq!(bytes, encode_all(&sample_values()));
}

#[test]
fn test_empty_fixed_block_cannot_finish() {
    let writer = FixedBlockWriter::<u64>::new(8);
    assert!(writer.summary().is_none());

    let temp = TempDir::new().unwrap();
    let mut out = WriteBuffer::create(&temp.path().join("b.bin"), 0).unwrap();
    assert!(matches!(writer.finish(&mut out), Err(GeoMapError::InvalidInput(_))));
}

// =============================================================================
// FixedBlockReader Tests
// =============================================================================

#[test]
fn test_every_value_maps_to_its_row() {
    let values = sample_values();
    let bytes = encode_all(&values);
    let block = FixedBlockReader::<u64>::new(&bytes, values.len()).unwrap();

    for (row, &value) in values.iter().enumerate() {
        assert_eq!(block.query_value_indexes(&[value]), vec![row as u32]);
    }
    assert_eq!(block.query_value_indexes(&values).len(), values.len());
}

#[test]
fn test_absent_values_have_no_row() {
    let values = sample_values();
    let bytes = encode_all(&values);
    let block = FixedBlockReader::<u64>::new(&bytes, values.len()).unwrap();

    assert!(block.query_value_indexes(&[0, 4, 17, 1001]).is_empty());
    assert_eq!(block.query_value_indexes(&[4, 15, 15, 17]), vec![2]);
}

#[test]
fn test_reader_debug_shows_values() {
    let bytes = encode_all(&[3u32, 8, 15]);
    let block = FixedBlockReader::<u32>::new(&bytes, 3).unwrap();

    assert_eq!(format!("{:?}", block), "FixedBlockReader { values: [3, 8, 15] }");
}

#[test]
#[should_panic(expected = "query values must be sorted")]
fn test_unsorted_values_panic() {
    let bytes = encode_all(&sample_values());
    let block = FixedBlockReader::<u64>::new(&bytes, 8).unwrap();
    block.query_value_indexes(&[42, 3]);
}

#[test]
fn test_overlapping_ranges_merge() {
    let bytes = encode_all(&sample_values());
    let block = FixedBlockReader::<u64>::new(&bytes, 8).unwrap();

    // 8..=16 hits rows 1..=3, 15..=42 hits rows 2..=5
    assert_eq!(block.query_value_ranges_indexes(&[(8, 16), (15, 42)]), vec![(1, 5)]);
}

#[test]
fn test_adjacent_ranges_merge() {
    let bytes = encode_all(&sample_values());
    let block = FixedBlockReader::<u64>::new(&bytes, 8).unwrap();

    // Rows 0..=1 and 2..=3 touch, so they collapse into one range
    assert_eq!(block.query_value_ranges_indexes(&[(0, 10), (11, 16)]), vec![(0, 3)]);
}

#[test]
fn test_disjoint_ranges_stay_separate() {
    let bytes = encode_all(&sample_values());
    let block = FixedBlockReader::<u64>::new(&bytes, 8).unwrap();

    assert_eq!(
        block.query_value_ranges_indexes(&[(0, 3), (20, 30), (43, 98), (500, 2000)]),
        vec![(0, 0), (4, 4), (7, 7)]
    );
}

#[test]
#[should_panic(expected = "query ranges must be non-decreasing")]
fn test_inverted_range_panics() {
    let bytes = encode_all(&sample_values());
    let block = FixedBlockReader::<u64>::new(&bytes, 8).unwrap();
    block.query_value_ranges_indexes(&[(10, 5)]);
}

#[test]
fn test_read_rows_and_row_ranges() {
    let bytes = encode_all(&sample_values());
    let block = FixedBlockReader::<u64>::new(&bytes, 8).unwrap();

    assert_eq!(block.read_indexes(&[7, 0]).unwrap(), vec![1000, 3]);
    assert_eq!(block.read_index_ranges(&[(1, 2), (6, 7)]).unwrap(), vec![8, 15, 99, 1000]);
    assert!(matches!(block.read_indexes(&[8]), Err(GeoMapError::OutOfBounds { .. })));
    assert!(block.read_index_ranges(&[(6, 8)]).is_err());
}

#[test]
fn test_truncated_fixed_block_is_rejected() {
    let bytes = encode_all(&sample_values());
    assert!(FixedBlockReader::<u64>::new(&bytes[..60], 8).is_err());
}

// =============================================================================
// Variable-Width Block Tests
// =============================================================================

#[test]
fn test_var_block_rows_round_trip() {
    let keys: Vec<Vec<u8>> = vec![b"alpha".to_vec(), Vec::new(), b"gamma-ray".to_vec()];
    let mut writer = VarBlockWriter::<Vec<u8>>::new(4);
    for key in &keys {
        writer.insert_value(key.clone()).unwrap();
    }
    assert_eq!(writer.byte_size(), 3 * 8 + 14);

    let bytes = written_bytes(|out| {
        assert_eq!(writer.finish(out).unwrap(), 38);
    });
    let block = VarBlockReader::<Vec<u8>>::new(&bytes, keys.len()).unwrap();

    assert_eq!(block.raw(1).unwrap(), b"");
    assert_eq!(block.read_indexes(&[2, 0]).unwrap(), vec![keys[2].clone(), keys[0].clone()]);
    assert_eq!(block.read_index_ranges(&[(0, 2)]).unwrap(), keys);
}

#[test]
fn test_var_block_rejects_when_full() {
    let mut writer = VarBlockWriter::<Vec<u8>>::new(1);
    writer.insert_value(b"a".to_vec()).unwrap();
    assert!(writer.is_full());
    assert_eq!(writer.insert_value(b"b".to_vec()), Err(b"b".to_vec()));
}

#[test]
fn test_bitmap_block_round_trip() {
    let bitmaps: Vec<RoaringBitmap> = vec![
        (0..10).collect(),
        [7u32].into_iter().collect(),
        (100..200).step_by(3).collect(),
    ];
    let mut writer = VarBlockWriter::<RoaringBitmap>::new(8);
    for bitmap in &bitmaps {
        writer.insert_value(bitmap.clone()).unwrap();
    }

    let bytes = written_bytes(|out| {
        writer.finish(out).unwrap();
    });
    let block = VarBlockReader::<RoaringBitmap>::new(&bytes, 3).unwrap();

    assert_eq!(block.read_indexes(&[1]).unwrap(), vec![bitmaps[1].clone()]);
    assert_eq!(block.read_index_ranges(&[(0, 2)]).unwrap(), bitmaps);
}

#[test]
fn test_var_block_payload_overrun_is_corruption() {
    // One row claiming 100 payload bytes with only 2 present
    let mut bytes = encode_all(&[100u64]);
    bytes.extend_from_slice(b"ab");
    assert!(matches!(
        VarBlockReader::<Vec<u8>>::new(&bytes, 1),
        Err(GeoMapError::Corruption(_))
    ));
}
