//! Off-heap allocator
//!
//! Backs the address space with a single anonymous mapping. Nothing is
//! durable: contents live exactly as long as the allocator.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crossbeam::utils::Backoff;
use memmap2::{MmapMut, MmapOptions};
use parking_lot::Mutex;

use crate::error::{ArenaError, Result};

use super::{Allocator, NULL_ADDRESS};

/// Bump allocator over one anonymous native region
pub struct OffHeapAllocator {
    /// Total capacity in bytes
    capacity: u64,

    /// Base address of the mapping, fixed for the allocator's lifetime
    base: usize,

    /// Next free offset; only ever advances
    cursor: AtomicU64,

    /// The mapping itself, held to keep the region alive until close
    region: Mutex<Option<MmapMut>>,

    /// Set once by `close`; `allocate` refuses afterwards
    closed: AtomicBool,
}

impl OffHeapAllocator {
    /// Create an allocator with the given capacity in bytes
    pub fn new(capacity: u64) -> Result<Self> {
        if capacity == 0 {
            return Err(ArenaError::Config(
                "capacity must be positive".to_string(),
            ));
        }

        let mut region = MmapOptions::new().len(capacity as usize).map_anon()?;
        let base = region.as_mut_ptr() as usize;

        tracing::debug!("Mapped {} byte anonymous region", capacity);

        Ok(Self {
            capacity,
            base,
            cursor: AtomicU64::new(0),
            region: Mutex::new(Some(region)),
            closed: AtomicBool::new(false),
        })
    }

    /// Capacity of the region in bytes
    pub fn capacity(&self) -> u64 {
        self.capacity
    }
}

impl Allocator for OffHeapAllocator {
    fn allocate(&self, size: usize) -> Result<u64> {
        if size == 0 {
            return Err(ArenaError::InvalidArgument(
                "allocation size must be positive".to_string(),
            ));
        }
        if self.closed.load(Ordering::Acquire) {
            return Err(ArenaError::Closed);
        }

        let size = size as u64;
        let backoff = Backoff::new();

        loop {
            let offset = self.cursor.load(Ordering::Acquire);

            let new_offset = match offset.checked_add(size) {
                Some(n) if n <= self.capacity => n,
                // Out of space: report the sentinel, leave the cursor alone
                _ => return Ok(NULL_ADDRESS),
            };

            match self.cursor.compare_exchange(
                offset,
                new_offset,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(self.base as u64 + offset),
                Err(_) => backoff.spin(),
            }
        }
    }

    fn free(&self, _address: u64, _size: usize) {
        // Monotonic arena: space is never reclaimed
    }

    fn total_allocated(&self) -> u64 {
        self.capacity
    }

    fn used_memory(&self) -> u64 {
        self.cursor.load(Ordering::Acquire)
    }

    fn available_memory(&self) -> u64 {
        self.capacity - self.used_memory()
    }

    fn flush(&self) -> Result<()> {
        // Nothing durable to synchronize
        Ok(())
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        // Dropping the mapping releases the region
        self.region.lock().take();

        tracing::debug!("Released {} byte anonymous region", self.capacity);
        Ok(())
    }
}
