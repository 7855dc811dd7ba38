//! Raw memory operations
//!
//! The single seam through which the crate touches native memory. All
//! helpers work on `u64` addresses obtained from an [`Allocator`] and copy
//! byte-wise, so they are safe for unaligned addresses.
//!
//! [`Allocator`]: crate::memory::Allocator

use std::ptr;

/// Copy `data` into native memory starting at `address`.
///
/// # Safety
///
/// `address` must point to writable memory with at least `data.len()` bytes
/// reserved, and the range must not overlap `data`.
pub unsafe fn copy_from_slice(address: u64, data: &[u8]) {
    ptr::copy_nonoverlapping(data.as_ptr(), address as *mut u8, data.len());
}

/// Copy `length` bytes of native memory starting at `address` into a
/// freshly allocated `Vec`.
///
/// # Safety
///
/// `address` must point to readable memory with at least `length` valid
/// bytes.
pub unsafe fn copy_to_vec(address: u64, length: usize) -> Vec<u8> {
    let mut data = vec![0u8; length];
    ptr::copy_nonoverlapping(address as *const u8, data.as_mut_ptr(), length);
    data
}

/// Write a little-endian `i32` at `address`.
///
/// # Safety
///
/// `address` must point to writable memory with at least 4 bytes reserved.
/// No alignment is required; the value is written byte-wise.
pub unsafe fn put_i32_le(address: u64, value: i32) {
    let bytes = value.to_le_bytes();
    ptr::copy_nonoverlapping(bytes.as_ptr(), address as *mut u8, bytes.len());
}

/// Read a little-endian `i32` from `address`.
///
/// # Safety
///
/// `address` must point to readable memory with at least 4 valid bytes.
/// No alignment is required; the value is read byte-wise.
pub unsafe fn get_i32_le(address: u64) -> i32 {
    let mut bytes = [0u8; 4];
    ptr::copy_nonoverlapping(address as *const u8, bytes.as_mut_ptr(), bytes.len());
    i32::from_le_bytes(bytes)
}
