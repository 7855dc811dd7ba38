//! Storage Module
//!
//! Thin byte-level engine over one [`Allocator`]. It validates arguments,
//! performs raw copies in and out of the address space, and adds the
//! flush/capacity accounting the map layer needs.
//!
//! ## Responsibilities
//! - Copy caller buffers to and from allocator-owned addresses
//! - Validate addresses and buffer ranges before touching memory
//! - Proxy flush/close/capacity to the allocator
//!
//! The engine is allocator-agnostic: it behaves identically over the
//! off-heap and mapped-file variants.

use crate::error::{ArenaError, Result};
use crate::memory::{raw, Allocator, NULL_ADDRESS};

/// Byte-level put/get/delete over one allocator
///
/// `put` and `get` are `unsafe`: the engine cannot bounds-check a raw
/// address, so the caller must only pass addresses obtained from a
/// successful [`Allocator::allocate`] on the wrapped allocator, with
/// enough bytes reserved for the access.
pub struct StorageEngine {
    allocator: Box<dyn Allocator>,
}

impl StorageEngine {
    /// Wrap an allocator
    pub fn new(allocator: Box<dyn Allocator>) -> Self {
        Self { allocator }
    }

    /// The underlying allocator
    pub fn allocator(&self) -> &dyn Allocator {
        self.allocator.as_ref()
    }

    /// Copy `length` bytes of `data` starting at `offset` into the address
    /// space at `address`
    ///
    /// # Safety
    ///
    /// `address` must come from a successful `allocate` on this engine's
    /// allocator with at least `length` bytes reserved, and the allocator
    /// must not have been closed.
    pub unsafe fn put(
        &self,
        address: u64,
        data: &[u8],
        offset: usize,
        length: usize,
    ) -> Result<()> {
        if address == NULL_ADDRESS {
            return Err(ArenaError::InvalidArgument(
                "invalid address: 0".to_string(),
            ));
        }
        let end = offset.checked_add(length).ok_or_else(|| {
            ArenaError::InvalidArgument("offset + length overflows".to_string())
        })?;
        if end > data.len() {
            return Err(ArenaError::InvalidArgument(format!(
                "range {}..{} out of bounds for buffer of {} bytes",
                offset,
                end,
                data.len()
            )));
        }

        raw::copy_from_slice(address, &data[offset..end]);
        Ok(())
    }

    /// Copy `length` bytes out of the address space starting at `address`
    ///
    /// # Safety
    ///
    /// Same contract as [`StorageEngine::put`]: `address` must come from a
    /// successful `allocate` with at least `length` bytes reserved.
    pub unsafe fn get(&self, address: u64, length: usize) -> Result<Vec<u8>> {
        if address == NULL_ADDRESS {
            return Err(ArenaError::InvalidArgument(
                "invalid address: 0".to_string(),
            ));
        }

        Ok(raw::copy_to_vec(address, length))
    }

    /// Retire a stored range
    ///
    /// Address 0 is a no-op. Otherwise forwards to [`Allocator::free`],
    /// which is itself a no-op — this is the seam where reclamation would
    /// be added.
    pub fn delete(&self, address: u64, length: usize) {
        if address == NULL_ADDRESS {
            return;
        }
        self.allocator.free(address, length);
    }

    /// Total capacity of the address space in bytes
    pub fn capacity(&self) -> u64 {
        self.allocator.total_allocated()
    }

    /// Bytes handed out so far
    pub fn used(&self) -> u64 {
        self.allocator.used_memory()
    }

    /// Force written bytes to durable storage (mapped-file mode)
    pub fn flush(&self) -> Result<()> {
        self.allocator.flush()
    }

    /// Flush and release the address space
    pub fn close(&self) -> Result<()> {
        self.allocator.close()
    }
}
