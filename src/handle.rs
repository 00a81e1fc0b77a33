//! Handle Registry
//!
//! Integer handles over open readers and pending writers, for callers that
//! cannot hold Rust values directly (a foreign runtime or a request loop).
//!
//! ## Concurrency Model
//! - `readers`: RwLock; queries clone the `Arc` and release the lock first
//! - `writers`: Mutex; writers are single-user and mutated in place
//! - `next_handle`: atomic counter shared by both tables

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::warn;

use crate::cell::CellId;
use crate::config::IndexConfig;
use crate::error::{GeoMapError, Result};
use crate::reader::GeoMapReader;
use crate::writer::GeoMapWriter;

pub struct HandleRegistry {
    readers: RwLock<HashMap<u64, Arc<GeoMapReader>>>,
    writers: Mutex<HashMap<u64, GeoMapWriter>>,
    next_handle: AtomicU64,
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self {
            readers: RwLock::new(HashMap::new()),
            writers: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        }
    }
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::SeqCst)
    }

    // =========================================================================
    // Readers
    // =========================================================================

    /// Open an index file and return its handle
    pub fn open(&self, path: &Path) -> Result<u64> {
        let reader = GeoMapReader::open(path)?;
        let handle = self.allocate();
        self.readers.write().insert(handle, Arc::new(reader));
        Ok(handle)
    }

    /// Release a reader or discard a pending writer
    ///
    /// Returns `false` if the handle is unknown.
    pub fn close(&self, handle: u64) -> bool {
        if self.readers.write().remove(&handle).is_some() {
            return true;
        }
        self.writers.lock().remove(&handle).is_some()
    }

    fn reader(&self, handle: u64) -> Result<Arc<GeoMapReader>> {
        self.readers
            .read()
            .get(&handle)
            .cloned()
            .ok_or(GeoMapError::InvalidHandle(handle))
    }

    pub fn contains(&self, handle: u64, cell_ids: &[u64]) -> Result<Vec<Vec<u8>>> {
        let cells: Vec<CellId> = cell_ids.iter().map(|&id| CellId(id)).collect();
        self.reader(handle)?.contains(&cells)
    }

    pub fn intersects(&self, handle: u64, cell_ids: &[u64]) -> Result<Vec<Vec<u8>>> {
        let cells: Vec<CellId> = cell_ids.iter().map(|&id| CellId(id)).collect();
        self.reader(handle)?.intersects(&cells)
    }

    /// Number of open readers
    pub fn open_readers(&self) -> usize {
        self.readers.read().len()
    }

    // =========================================================================
    // Writers
    // =========================================================================

    /// Start a writer with default settings and the given level stride
    pub fn new_writer(&self, level_stride: u8) -> Result<u64> {
        let config = IndexConfig::builder().level_stride(level_stride).build();
        let writer = GeoMapWriter::new(config)?;
        let handle = self.allocate();
        self.writers.lock().insert(handle, writer);
        Ok(handle)
    }

    /// Add a region to a pending writer; `false` on any failure
    pub fn write(&self, handle: u64, cell_ids: &[u64], key: &[u8]) -> bool {
        let cells: Vec<CellId> = cell_ids.iter().map(|&id| CellId(id)).collect();
        let mut writers = self.writers.lock();
        let Some(writer) = writers.get_mut(&handle) else {
            warn!(handle, "Write to unknown writer handle");
            return false;
        };
        match writer.write(&cells, key) {
            Ok(()) => true,
            Err(e) => {
                warn!(handle, error = %e, "Write rejected");
                false
            }
        }
    }

    /// Build a pending writer to `path`, releasing the handle either way
    pub fn build(&self, handle: u64, path: &Path) -> bool {
        let Some(writer) = self.writers.lock().remove(&handle) else {
            warn!(handle, "Build on unknown writer handle");
            return false;
        };
        match writer.build(path) {
            Ok(_) => true,
            Err(e) => {
                warn!(handle, path = %path.display(), error = %e, "Build failed");
                false
            }
        }
    }
}
