//! Memory-mapped file allocator
//!
//! Backs the address space with a pre-extended file, mapped read-write in
//! one or more fixed-size segments. The on-disk byte layout *is* the
//! address space: no header or metadata region is written.
//!
//! ## Segmentation
//!
//! A single mapping is never asked to address more than `segment_size`
//! bytes (default [`SEGMENT_LIMIT`]). Larger files are split:
//!
//! ```text
//! logical offset o  →  segment o / segment_size, local o % segment_size
//!                   →  base[segment] + local
//! ```
//!
//! Callers never see segment boundaries. An allocation that would straddle
//! one is placed at the start of the next segment instead — the skipped
//! tail bytes are never handed out, so every returned address is valid for
//! the full request within a single mapping.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crossbeam::utils::Backoff;
use memmap2::{MmapMut, MmapOptions};
use parking_lot::Mutex;

use crate::error::{ArenaError, Result};

use super::{Allocator, NULL_ADDRESS, SEGMENT_LIMIT};

/// Mapped segments plus the file handle that keeps them valid
///
/// Dropped as a unit on close: unmapping the segments, then closing the
/// file.
struct MappedState {
    segments: Vec<MmapMut>,
    _file: File,
}

/// Bump allocator over a segmented memory-mapped file
pub struct MmapAllocator {
    /// Path of the backing file
    path: PathBuf,

    /// Total capacity in bytes; also the exact on-disk file length
    capacity: u64,

    /// Size of every segment except possibly the last
    segment_size: u64,

    /// Base address of each segment, fixed for the allocator's lifetime
    bases: Vec<usize>,

    /// Next free logical offset; only ever advances
    cursor: AtomicU64,

    /// Live mappings; taken (and thereby released) by `close`
    state: Mutex<Option<MappedState>>,

    /// Set once by `close`; `allocate` refuses afterwards
    closed: AtomicBool,

    /// Remove the backing file after the last unmap (temporary mode)
    remove_on_close: bool,
}

impl MmapAllocator {
    /// Create an allocator over the file at `path`, pre-extended to
    /// `capacity` bytes
    ///
    /// Parent directories are created if absent. An existing file is
    /// re-extended (or truncated) to exactly `capacity`; its previous
    /// contents are re-mapped but nothing is read back — index recovery is
    /// not part of this layer.
    pub fn create<P: AsRef<Path>>(path: P, capacity: u64) -> Result<Self> {
        Self::with_segment_size(path, capacity, SEGMENT_LIMIT)
    }

    /// Create an allocator with an explicit segment size
    ///
    /// `segment_size` bounds the span of a single mapping and therefore the
    /// largest possible allocation. Production use wants the default
    /// [`SEGMENT_LIMIT`]; tests use small values to exercise the
    /// multi-segment path cheaply.
    pub fn with_segment_size<P: AsRef<Path>>(
        path: P,
        capacity: u64,
        segment_size: u64,
    ) -> Result<Self> {
        let path = path.as_ref();

        if capacity == 0 {
            return Err(ArenaError::Config(
                "capacity must be positive".to_string(),
            ));
        }
        if segment_size == 0 {
            return Err(ArenaError::Config(
                "segment size must be positive".to_string(),
            ));
        }

        // Step 1: make sure the parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Step 2: open and pre-extend the backing file
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        file.set_len(capacity)?;

        // Step 3: map each segment read-write and record its base address
        let segment_count = ((capacity + segment_size - 1) / segment_size) as usize;
        let mut segments = Vec::with_capacity(segment_count);
        let mut bases = Vec::with_capacity(segment_count);

        let mut offset = 0u64;
        let mut remaining = capacity;
        for _ in 0..segment_count {
            let len = remaining.min(segment_size);

            // SAFETY: map_mut is unsafe because a mapped file can be
            // modified externally. The file was just created or re-extended
            // by this process, is held open for the mapping's lifetime, and
            // every access goes through addresses handed out by `allocate`,
            // which stay inside [offset, offset + len).
            let mut segment = unsafe {
                MmapOptions::new()
                    .offset(offset)
                    .len(len as usize)
                    .map_mut(&file)?
            };

            bases.push(segment.as_mut_ptr() as usize);
            segments.push(segment);

            offset += len;
            remaining -= len;
        }

        tracing::debug!(
            "Mapped {} as {} segment(s), {} bytes total",
            path.display(),
            segment_count,
            capacity
        );

        Ok(Self {
            path: path.to_path_buf(),
            capacity,
            segment_size,
            bases,
            cursor: AtomicU64::new(0),
            state: Mutex::new(Some(MappedState {
                segments,
                _file: file,
            })),
            closed: AtomicBool::new(false),
            remove_on_close: false,
        })
    }

    /// Remove the backing file when the allocator is closed
    ///
    /// Used for temporary maps whose file path came from
    /// [`crate::util::temp`].
    pub fn delete_on_close(mut self) -> Self {
        self.remove_on_close = true;
        self
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Capacity (and on-disk file length) in bytes
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Number of mapped segments
    pub fn segment_count(&self) -> usize {
        self.bases.len()
    }

    /// Configured segment size in bytes
    pub fn segment_size(&self) -> u64 {
        self.segment_size
    }

    /// Translate a logical offset to the native address inside its segment
    fn translate(&self, offset: u64) -> u64 {
        let segment = (offset / self.segment_size) as usize;
        let local = offset % self.segment_size;
        self.bases[segment] as u64 + local
    }
}

impl Allocator for MmapAllocator {
    fn allocate(&self, size: usize) -> Result<u64> {
        if size == 0 {
            return Err(ArenaError::InvalidArgument(
                "allocation size must be positive".to_string(),
            ));
        }
        let size = size as u64;
        if size > self.segment_size {
            return Err(ArenaError::InvalidArgument(format!(
                "allocation of {} bytes exceeds segment size {}",
                size, self.segment_size
            )));
        }
        if self.closed.load(Ordering::Acquire) {
            return Err(ArenaError::Closed);
        }

        let backoff = Backoff::new();

        loop {
            let current = self.cursor.load(Ordering::Acquire);

            // The range must lie within one segment; otherwise skip the
            // segment tail and start at the next boundary
            let mut offset = current;
            if offset / self.segment_size != (offset + size - 1) / self.segment_size {
                offset = (offset / self.segment_size + 1) * self.segment_size;
            }

            let new_offset = match offset.checked_add(size) {
                Some(n) if n <= self.capacity => n,
                // Out of space: report the sentinel, leave the cursor alone
                _ => return Ok(NULL_ADDRESS),
            };

            match self.cursor.compare_exchange(
                current,
                new_offset,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(self.translate(offset)),
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

    /// Force every segment to durable storage
    ///
    /// Only affects bytes already written; concurrent `allocate` calls are
    /// not blocked (they never take the state lock).
    fn flush(&self) -> Result<()> {
        let state = self.state.lock();
        let state = state.as_ref().ok_or(ArenaError::Closed)?;

        for segment in &state.segments {
            segment.flush()?;
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let mut flush_error = None;

        if let Some(state) = self.state.lock().take() {
            // Flush every segment even if one fails, then release them all
            for segment in &state.segments {
                if let Err(e) = segment.flush() {
                    tracing::warn!("Failed to flush segment of {}: {}", self.path.display(), e);
                    flush_error.get_or_insert(e);
                }
            }
            drop(state);
        }

        if self.remove_on_close {
            if let Err(e) = fs::remove_file(&self.path) {
                tracing::warn!(
                    "Failed to remove temporary file {}: {}",
                    self.path.display(),
                    e
                );
            }
        }

        tracing::debug!("Closed mapped file {}", self.path.display());

        match flush_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

impl Drop for MmapAllocator {
    fn drop(&mut self) {
        // Best-effort: flush, unmap and (in temporary mode) delete even if
        // the caller never called close
        let _ = self.close();
    }
}
