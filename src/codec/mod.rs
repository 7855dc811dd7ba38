//! Codec Module
//!
//! The serialization contract between typed keys/values and raw addresses,
//! plus the concrete codecs shipped with the crate.
//!
//! ## Wire Format
//!
//! Every encoded value is a length-prefixed frame:
//!
//! ```text
//! ┌────────────────┬─────────────────────────────┐
//! │ length (4, LE) │      payload (length)       │
//! └────────────────┴─────────────────────────────┘
//! ```
//!
//! The length field is a signed 32-bit little-endian integer. `-1` encodes
//! the logically-null value and carries no payload. On decode, length `0`
//! and `-1` are both treated as "no value": an explicitly present empty
//! payload is indistinguishable from absence.
//!
//! ## Size-Then-Encode Protocol
//!
//! Callers must call `calculate_size` before `encode` for the same value
//! on the same thread. An implementation may do the real serialization
//! work inside `calculate_size` and cache the bytes for the following
//! `encode` (see [`BincodeCodec`]); `encode` consumes and clears the cache
//! so a stale entry is never reused. Any such scratch state is confined
//! per thread.

mod bytes;
mod object;
mod primitive;
mod string;

pub use bytes::BytesCodec;
pub use object::BincodeCodec;
pub use primitive::{F32Codec, F64Codec, I32Codec, I64Codec, U32Codec, U64Codec};
pub use string::StringCodec;

use std::collections::HashMap;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;

use crate::error::Result;
use crate::memory::raw;

/// Width of the length prefix in bytes
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Length field marking a logically-null value
pub const NULL_LENGTH: i32 = -1;

/// Serializes values of type `T` directly to and from raw addresses
///
/// Used identically for keys and for values. Implementations must be
/// stateless or keep mutable scratch confined per thread.
pub trait Codec<T>: Send + Sync {
    /// Number of bytes `encode` will write for `value`, prefix included
    ///
    /// Must be called before `encode` for the same value on the same
    /// thread. `calculate_size(None)` is [`LENGTH_PREFIX_SIZE`].
    fn calculate_size(&self, value: Option<&T>) -> Result<usize>;

    /// Write the frame for `value` at `address`; returns bytes written
    ///
    /// # Safety
    ///
    /// `address` must come from a successful allocation of at least
    /// `calculate_size(value)` bytes that has not been released.
    unsafe fn encode(&self, address: u64, value: Option<&T>) -> Result<usize>;

    /// Read the frame at `address` back into a value
    ///
    /// Returns `None` for a null or zero-length frame.
    ///
    /// # Safety
    ///
    /// `address` must point to a frame previously written by `encode` on
    /// an allocation that has not been released.
    unsafe fn decode(&self, address: u64) -> Result<Option<T>>;
}

// =============================================================================
// Frame Helpers
// =============================================================================

/// Write a length-prefixed frame at `address`; returns bytes written
///
/// # Safety
///
/// `address` must be writable for `LENGTH_PREFIX_SIZE + payload.len()`
/// bytes.
pub unsafe fn write_frame(address: u64, payload: &[u8]) -> usize {
    raw::put_i32_le(address, payload.len() as i32);
    raw::copy_from_slice(address + LENGTH_PREFIX_SIZE as u64, payload);
    LENGTH_PREFIX_SIZE + payload.len()
}

/// Write a null frame (length `-1`, no payload) at `address`
///
/// # Safety
///
/// `address` must be writable for `LENGTH_PREFIX_SIZE` bytes.
pub unsafe fn write_null_frame(address: u64) -> usize {
    raw::put_i32_le(address, NULL_LENGTH);
    LENGTH_PREFIX_SIZE
}

/// Read the frame at `address`; `None` for null or zero-length frames
///
/// # Safety
///
/// `address` must point to a frame written by [`write_frame`] or
/// [`write_null_frame`].
pub unsafe fn read_frame(address: u64) -> Option<Vec<u8>> {
    let length = raw::get_i32_le(address);
    if length <= 0 {
        return None;
    }
    Some(raw::copy_to_vec(
        address + LENGTH_PREFIX_SIZE as u64,
        length as usize,
    ))
}

// =============================================================================
// Per-Thread Scratch Cache
// =============================================================================

/// Serialized-bytes cache keyed by thread identity
///
/// Lets a codec serialize once in `calculate_size` and reuse the bytes in
/// the following `encode` on the same thread. Each thread only ever sees
/// its own slot, so concurrent size/encode sequences on different threads
/// cannot observe each other's bytes.
#[derive(Debug, Default)]
pub struct ScratchCache {
    slots: Mutex<HashMap<ThreadId, Vec<u8>>>,
}

impl ScratchCache {
    /// Cache `bytes` for the calling thread
    pub fn store(&self, bytes: Vec<u8>) {
        self.slots.lock().insert(thread::current().id(), bytes);
    }

    /// Take (and clear) the calling thread's cached bytes
    pub fn take(&self) -> Option<Vec<u8>> {
        self.slots.lock().remove(&thread::current().id())
    }
}
