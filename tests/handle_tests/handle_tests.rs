//! Tests for the integer handle registry
//!
//! These tests verify:
//! - Writer handles accept regions and build files
//! - Reader handles answer queries until closed
//! - Unknown handles and bad input report failure

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use geomap::cell::MAX_LEVEL;
use geomap::{CellId, GeoMapError, HandleRegistry};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_index() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("handle.gmp");
    (temp_dir, path)
}

fn leaf_id(face: u8, pos: u64) -> u64 {
    CellId::from_face_pos_level(face, pos, MAX_LEVEL).id()
}

/// Build a two-key index through the registry and open it
fn build_and_open(registry: &HandleRegistry, path: &PathBuf) -> u64 {
    let writer = registry.new_writer(3).unwrap();
    assert!(registry.write(writer, &[leaf_id(0, 10)], b"first"));
    assert!(registry.write(writer, &[leaf_id(1, 20), leaf_id(1, 30)], b"second"));
    assert!(registry.build(writer, path));
    registry.open(path).unwrap()
}

// =============================================================================
// Writer Handle Tests
// =============================================================================

#[test]
fn test_write_build_open_query() {
    let (_temp, path) = setup_temp_index();
    let registry = HandleRegistry::new();

    let reader = build_and_open(&registry, &path);

    assert_eq!(registry.contains(reader, &[leaf_id(0, 10)]).unwrap(), vec![b"first".to_vec()]);
    assert_eq!(registry.contains(reader, &[leaf_id(1, 30)]).unwrap(), vec![b"second".to_vec()]);
    assert!(registry.contains(reader, &[leaf_id(4, 10)]).unwrap().is_empty());
}

#[test]
fn test_write_rejects_invalid_region() {
    let registry = HandleRegistry::new();
    let writer = registry.new_writer(3).unwrap();

    assert!(!registry.write(writer, &[], b"empty"));
    assert!(!registry.write(writer, &[0], b"invalid"));
    assert!(registry.write(writer, &[leaf_id(0, 1)], b"ok"));
}

#[test]
fn test_build_consumes_writer() {
    let (_temp, path) = setup_temp_index();
    let registry = HandleRegistry::new();
    let writer = registry.new_writer(3).unwrap();

    assert!(registry.build(writer, &path));
    assert!(!registry.build(writer, &path));
    assert!(!registry.write(writer, &[leaf_id(0, 1)], b"late"));
}

#[test]
fn test_build_to_unwritable_path_fails() {
    let (temp, _path) = setup_temp_index();
    let registry = HandleRegistry::new();
    let writer = registry.new_writer(3).unwrap();

    let path = temp.path().join("missing-dir").join("out.gmp");
    assert!(!registry.build(writer, &path));
}

#[test]
fn test_zero_stride_is_rejected() {
    let registry = HandleRegistry::new();
    assert!(matches!(registry.new_writer(0), Err(GeoMapError::Config(_))));
}

#[test]
fn test_stride_past_leaf_level_is_rejected() {
    let registry = HandleRegistry::new();
    assert!(matches!(registry.new_writer(31), Err(GeoMapError::Config(_))));
    assert!(matches!(registry.new_writer(255), Err(GeoMapError::Config(_))));
    assert!(registry.new_writer(30).is_ok());
}

#[test]
fn test_wide_stride_rejects_oversized_region() {
    let registry = HandleRegistry::new();
    let writer = registry.new_writer(28).unwrap();
    let coarse = CellId(leaf_id(0, 10)).parent(16).id();

    assert!(!registry.write(writer, &[coarse], b"too-wide"));
    assert!(registry.write(writer, &[leaf_id(0, 10)], b"leaf"));
}

#[test]
fn test_unknown_writer_handle() {
    let (_temp, path) = setup_temp_index();
    let registry = HandleRegistry::new();

    assert!(!registry.write(999, &[leaf_id(0, 1)], b"k"));
    assert!(!registry.build(999, &path));
}

// =============================================================================
// Reader Handle Tests
// =============================================================================

#[test]
fn test_close_releases_reader() {
    let (_temp, path) = setup_temp_index();
    let registry = HandleRegistry::new();
    let reader = build_and_open(&registry, &path);
    assert_eq!(registry.open_readers(), 1);

    assert!(registry.close(reader));
    assert!(!registry.close(reader));
    assert_eq!(registry.open_readers(), 0);
    assert!(matches!(
        registry.contains(reader, &[leaf_id(0, 10)]),
        Err(GeoMapError::InvalidHandle(_))
    ));
}

#[test]
fn test_close_discards_pending_writer() {
    let (_temp, path) = setup_temp_index();
    let registry = HandleRegistry::new();
    let writer = registry.new_writer(3).unwrap();

    assert!(registry.close(writer));
    assert!(!registry.build(writer, &path));
}

#[test]
fn test_handles_are_distinct() {
    let (_temp, path) = setup_temp_index();
    let registry = HandleRegistry::new();
    let first = build_and_open(&registry, &path);
    let second = registry.open(&path).unwrap();
    let writer = registry.new_writer(2).unwrap();

    assert_ne!(first, second);
    assert_ne!(second, writer);
    assert_eq!(registry.open_readers(), 2);
}

#[test]
fn test_open_missing_file_fails() {
    let (_temp, path) = setup_temp_index();
    let registry = HandleRegistry::new();
    assert!(matches!(registry.open(&path), Err(GeoMapError::Io(_))));
}

#[test]
fn test_intersects_is_unsupported() {
    let (_temp, path) = setup_temp_index();
    let registry = HandleRegistry::new();
    let reader = build_and_open(&registry, &path);

    assert!(matches!(
        registry.intersects(reader, &[leaf_id(0, 10)]),
        Err(GeoMapError::Unsupported(_))
    ));
}

#[test]
fn test_shared_registry_across_threads() {
    let (_temp, path) = setup_temp_index();
    let registry = Arc::new(HandleRegistry::new());
    let reader = build_and_open(&registry, &path);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..50 {
                    let keys = registry.contains(reader, &[leaf_id(1, 20)]).unwrap();
                    assert_eq!(keys, vec![b"second".to_vec()]);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
