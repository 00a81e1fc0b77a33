//! # GeoMap
//!
//! An immutable, on-disk spatial inverted index mapping hierarchical cell ids
//! to the keys whose regions cover them:
//! - Columnar, block-structured file with selective block reads
//! - Skip index over block maxima for cell-id lookups
//! - Succinct existence filter to reject queries without column I/O
//! - Compressed key-id bitmaps per indexed cell
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              GeoMapWriter / GeoMapReader                     │
//! │             (build once / query many times)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Filter    │          │   Columns   │
//!   │    (fst)    │          │ keys/cells/ │
//!   └─────────────┘          │   bitmaps   │
//!                            └──────┬──────┘
//!                                   │
//!                    ┌──────────────┴──────────────┐
//!                    ▼                             ▼
//!             ┌─────────────┐              ┌─────────────┐
//!             │   Blocks    │              │   Indexes   │
//!             │ fixed / var │              │ offset/skip │
//!             └──────┬──────┘              └─────────────┘
//!                    ▼
//!             ┌─────────────┐
//!             │  Buffers    │
//!             │ read/write  │
//!             └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod cell;
pub mod codec;
pub mod io;
pub mod block;
pub mod index;
pub mod column;
pub mod filter;
pub mod header;
pub mod writer;
pub mod reader;
pub mod handle;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use cell::{CellId, LevelPolicy};
pub use config::IndexConfig;
pub use error::{GeoMapError, Result};
pub use handle::HandleRegistry;
pub use header::Header;
pub use reader::GeoMapReader;
pub use writer::{BuildStats, GeoMapWriter};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of GeoMap
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
