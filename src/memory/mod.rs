//! Memory Module
//!
//! Owns the address space abstraction: a bump [`Allocator`] over a logical
//! byte range `[0, capacity)`, backed either by one anonymous native region
//! ([`OffHeapAllocator`]) or by one or more memory-mapped file segments
//! ([`MmapAllocator`]).
//!
//! ## Allocation Model
//!
//! The cursor only ever moves forward. `free` is a no-op in both variants:
//! reclamation, if ever added, belongs to a free-list layered above the
//! allocator, so that an address returned by `allocate` stays valid until
//! `close`.

pub mod raw;

mod mmap;
mod offheap;

pub use mmap::MmapAllocator;
pub use offheap::OffHeapAllocator;

use crate::error::Result;

/// The "no space / invalid" address sentinel
///
/// Returned by [`Allocator::allocate`] when the request would exceed
/// capacity. Never a valid address.
pub const NULL_ADDRESS: u64 = 0;

/// Default size of one mapped segment: the largest span a single mapping
/// is asked to address (`i32::MAX`, ~2 GB)
///
/// Files larger than this are split across multiple segments. The limit is
/// an architectural parameter, not a law of nature; [`MmapAllocator`]
/// accepts a smaller segment size for testing the multi-segment path.
pub const SEGMENT_LIMIT: u64 = i32::MAX as u64;

/// A bump allocator over one logical address space
///
/// ## Concurrency
///
/// `allocate` is the only concurrency-sensitive primitive: it is lock-free
/// (CAS retry on the cursor) and hands each byte of `[0, capacity)` to at
/// most one successful call. All other methods are cheap reads or
/// lifecycle operations.
pub trait Allocator: Send + Sync {
    /// Reserve `size` bytes and return the native address of the range
    ///
    /// Returns:
    /// - `Ok(address)` — a non-zero address valid for `size` bytes
    /// - `Ok(NULL_ADDRESS)` — the request would exceed capacity; the
    ///   cursor is left untouched
    /// - `Err(InvalidArgument)` — `size` is zero (or, for segmented
    ///   allocators, larger than one segment)
    /// - `Err(Closed)` — the allocator was closed
    fn allocate(&self, size: usize) -> Result<u64>;

    /// Return a range to the allocator
    ///
    /// A no-op in both variants: the arena is monotonic and never reclaims
    /// space. Exists as the seam where a free-list would plug in.
    fn free(&self, address: u64, size: usize);

    /// Total capacity of the address space, in bytes
    fn total_allocated(&self) -> u64;

    /// Bytes handed out so far (the cursor position)
    fn used_memory(&self) -> u64;

    /// Bytes still available for allocation
    fn available_memory(&self) -> u64;

    /// Force written bytes to durable storage
    ///
    /// A no-op for the off-heap variant. Safe to call repeatedly and
    /// concurrently with ongoing `allocate` calls.
    fn flush(&self) -> Result<()>;

    /// Flush (mapped variant) and release the address space
    ///
    /// Idempotent. After `close` returns, no address previously handed out
    /// may be used.
    fn close(&self) -> Result<()>;
}
