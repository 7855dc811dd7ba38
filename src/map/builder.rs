//! Map builder
//!
//! Fluent construction of an [`ArenaMap`]: backing mode, capacity, codecs
//! and index strategy are fixed here and immutable for the map's lifetime.
//!
//! ```no_run
//! use arenakv::codec::StringCodec;
//! use arenakv::map::ArenaMap;
//!
//! let map: ArenaMap<String, String> = ArenaMap::builder()
//!     .off_heap()
//!     .allocate_size(10 * 1024 * 1024)
//!     .key_codec(StringCodec)
//!     .value_codec(StringCodec)
//!     .build()
//!     .unwrap();
//! ```

use std::hash::Hash;
use std::path::PathBuf;

use crate::codec::Codec;
use crate::config::{BackingMode, IndexStrategy, StoreConfig};
use crate::error::{ArenaError, Result};
use crate::memory::{Allocator, MmapAllocator, OffHeapAllocator};
use crate::storage::StorageEngine;
use crate::util::temp;

use super::ArenaMap;

/// Builder for [`ArenaMap`]
///
/// Validation is fail-fast: `build` checks the whole configuration before
/// any file is created or region mapped.
pub struct MapBuilder<K, V> {
    config: StoreConfig,
    key_codec: Option<Box<dyn Codec<K>>>,
    value_codec: Option<Box<dyn Codec<V>>>,
}

impl<K, V> MapBuilder<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            config: StoreConfig::default(),
            key_codec: None,
            value_codec: None,
        }
    }

    /// Back the map with anonymous native memory (the default)
    pub fn off_heap(mut self) -> Self {
        self.config.backing = BackingMode::OffHeap;
        self
    }

    /// Back the map with a memory-mapped file at `path`
    ///
    /// The file is created (parent directories included) and pre-extended
    /// to the configured capacity. Reopening an existing file re-maps its
    /// bytes but starts with an empty index: prior contents are not
    /// restored.
    pub fn persistent(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.backing = BackingMode::MappedFile {
            path: path.into(),
            temporary: false,
        };
        self
    }

    /// Back the map with a memory-mapped temporary file
    ///
    /// The path comes from [`crate::util::temp`] and the file is removed
    /// when the map is closed.
    pub fn temporary(mut self) -> Self {
        self.config.backing = BackingMode::MappedFile {
            path: temp::create_temp_path(),
            temporary: true,
        };
        self
    }

    /// Set the capacity of the address space in bytes
    pub fn allocate_size(mut self, bytes: u64) -> Self {
        self.config.capacity = bytes;
        self
    }

    /// Set the mapped-segment size (mapped-file mode)
    ///
    /// Mainly a testing knob for the multi-segment path; production use
    /// wants the default [`crate::memory::SEGMENT_LIMIT`].
    pub fn segment_size(mut self, bytes: u64) -> Self {
        self.config.segment_size = bytes;
        self
    }

    /// Use the fixed-width-key index fast path
    ///
    /// Keys are hashed and compared as their native value; the key codec
    /// is never invoked per operation. Intended for integral keys.
    pub fn primitive_index(mut self) -> Self {
        self.config.index = IndexStrategy::Primitive;
        self
    }

    /// Set the key codec
    pub fn key_codec(mut self, codec: impl Codec<K> + 'static) -> Self {
        self.key_codec = Some(Box::new(codec));
        self
    }

    /// Set the value codec
    pub fn value_codec(mut self, codec: impl Codec<V> + 'static) -> Self {
        self.value_codec = Some(Box::new(codec));
        self
    }

    /// Validate the configuration and construct the map
    pub fn build(self) -> Result<ArenaMap<K, V>>
    where
        K: Hash + Eq + Clone,
    {
        self.config.validate()?;

        let key_codec = self
            .key_codec
            .ok_or_else(|| ArenaError::Config("key codec is required".to_string()))?;
        let value_codec = self
            .value_codec
            .ok_or_else(|| ArenaError::Config("value codec is required".to_string()))?;

        let allocator: Box<dyn Allocator> = match &self.config.backing {
            BackingMode::OffHeap => Box::new(OffHeapAllocator::new(self.config.capacity)?),
            BackingMode::MappedFile { path, temporary } => {
                let allocator = MmapAllocator::with_segment_size(
                    path,
                    self.config.capacity,
                    self.config.segment_size,
                )?;
                Box::new(if *temporary {
                    allocator.delete_on_close()
                } else {
                    allocator
                })
            }
        };

        tracing::debug!(
            "Built map: {:?}, capacity {} bytes, {:?} index",
            self.config.backing,
            self.config.capacity,
            self.config.index
        );

        Ok(ArenaMap::from_parts(
            StorageEngine::new(allocator),
            key_codec,
            value_codec,
            self.config.index,
        ))
    }
}
