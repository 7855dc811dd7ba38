//! Configuration for arenakv
//!
//! Centralized configuration with sensible defaults. A [`StoreConfig`] pins
//! the two axes that are immutable for the lifetime of a map: the backing
//! mode of the address space and the index strategy.

use std::path::PathBuf;

use crate::error::{ArenaError, Result};
use crate::memory::SEGMENT_LIMIT;

/// Default capacity when none is configured (64 MB)
pub const DEFAULT_CAPACITY: u64 = 64 * 1024 * 1024;

/// How the address space is backed
#[derive(Debug, Clone)]
pub enum BackingMode {
    /// Anonymous native memory; contents are lost when the map is closed
    OffHeap,

    /// Memory-mapped file at the given path
    ///
    /// With `temporary = true` the path is expected to come from
    /// [`crate::util::temp`] and the backing file is removed on close.
    MappedFile { path: PathBuf, temporary: bool },
}

/// How keys are resolved in the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStrategy {
    /// Codec-backed index: key bytes are stored off-heap and hash matches
    /// are confirmed against them
    Generic,

    /// Fixed-width-key fast path: keys are hashed and compared as their
    /// native value, never routed through the key codec
    Primitive,
}

/// Storage configuration for one map instance
#[derive(Debug, Clone)]
pub struct StoreConfig {
    // -------------------------------------------------------------------------
    // Address Space Configuration
    // -------------------------------------------------------------------------
    /// Backing mode for the address space
    pub backing: BackingMode,

    /// Total capacity of the address space, in bytes
    pub capacity: u64,

    /// Size of one mapped segment (mapped-file mode only)
    ///
    /// The largest span a single mapping is asked to address. Files larger
    /// than this are split into multiple segments. Lowering it is mainly
    /// useful for exercising the multi-segment path.
    pub segment_size: u64,

    // -------------------------------------------------------------------------
    // Index Configuration
    // -------------------------------------------------------------------------
    /// Index strategy for key resolution
    pub index: IndexStrategy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backing: BackingMode::OffHeap,
            capacity: DEFAULT_CAPACITY,
            segment_size: SEGMENT_LIMIT,
            index: IndexStrategy::Generic,
        }
    }
}

impl StoreConfig {
    /// Validate the configuration before any resource is acquired
    ///
    /// Fails fast so a misconfigured map never pre-extends a file or maps
    /// a region it cannot use.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(ArenaError::Config(
                "capacity must be positive".to_string(),
            ));
        }

        if self.segment_size == 0 {
            return Err(ArenaError::Config(
                "segment size must be positive".to_string(),
            ));
        }

        if let BackingMode::MappedFile { path, .. } = &self.backing {
            if path.as_os_str().is_empty() {
                return Err(ArenaError::Config(
                    "mapped-file mode requires a file path".to_string(),
                ));
            }
        }

        Ok(())
    }
}
