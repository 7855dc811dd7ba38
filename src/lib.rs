//! # arenakv
//!
//! An embeddable key-value store that keeps all entry data outside the
//! managed heap:
//! - Anonymous off-heap memory or a segmented memory-mapped file
//! - Lock-free bump allocation under concurrent writers
//! - Length-prefixed codec protocol writing straight to raw addresses
//! - Hash index with full-key collision verification
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       ArenaMap<K, V>                         │
//! │            (hash index, RwLock, previous-value)              │
//! └───────┬─────────────────────┬───────────────────┬───────────┘
//!         │                     │                   │
//!         ▼                     ▼                   ▼
//!  ┌─────────────┐       ┌─────────────┐     ┌─────────────┐
//!  │  Codec<K>   │       │  Codec<V>   │     │   Storage   │
//!  │ (key bytes) │       │(value bytes)│     │   Engine    │
//!  └─────────────┘       └─────────────┘     └──────┬──────┘
//!                                                   │
//!                                                   ▼
//!                                            ┌─────────────┐
//!                                            │  Allocator  │
//!                                            │ off-heap /  │
//!                                            │ mapped file │
//!                                            └─────────────┘
//! ```
//!
//! The arena is monotonic: the allocator's cursor only moves forward, and
//! superseded entries are retired from the index without their bytes being
//! reclaimed. Mapped-file maps are durable at the byte level across
//! flush/close, but the index is not persisted — reopening a file starts
//! with an empty map.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod codec;
pub mod map;
pub mod memory;
pub mod storage;
pub mod util;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use codec::Codec;
pub use config::{BackingMode, IndexStrategy, StoreConfig};
pub use error::{ArenaError, Result};
pub use map::{ArenaMap, MapBuilder};
pub use memory::{Allocator, MmapAllocator, OffHeapAllocator, NULL_ADDRESS, SEGMENT_LIMIT};
pub use storage::StorageEngine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of arenakv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
