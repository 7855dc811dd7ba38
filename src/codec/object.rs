//! Generic object codec
//!
//! Serializes any `serde` type through `bincode`. Serialization happens
//! once, inside `calculate_size`; the bytes are parked in a per-thread
//! scratch slot and consumed by the following `encode`, so a value is
//! never serialized twice on the size-then-encode path.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ArenaError, Result};

use super::{
    read_frame, write_frame, write_null_frame, Codec, ScratchCache, LENGTH_PREFIX_SIZE,
};

/// Codec for arbitrary `Serialize + DeserializeOwned` values
pub struct BincodeCodec<T> {
    /// Bytes produced by `calculate_size`, keyed by thread
    scratch: ScratchCache,
    _marker: PhantomData<fn() -> T>,
}

impl<T> BincodeCodec<T> {
    pub fn new() -> Self {
        Self {
            scratch: ScratchCache::default(),
            _marker: PhantomData,
        }
    }
}

impl<T> Default for BincodeCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn codec_error(e: bincode::Error) -> ArenaError {
    ArenaError::Codec(e.to_string())
}

impl<T: Serialize + DeserializeOwned> Codec<T> for BincodeCodec<T> {
    fn calculate_size(&self, value: Option<&T>) -> Result<usize> {
        match value {
            None => Ok(LENGTH_PREFIX_SIZE),
            Some(v) => {
                let bytes = bincode::serialize(v).map_err(codec_error)?;
                let size = LENGTH_PREFIX_SIZE + bytes.len();
                self.scratch.store(bytes);
                Ok(size)
            }
        }
    }

    unsafe fn encode(&self, address: u64, value: Option<&T>) -> Result<usize> {
        match value {
            None => {
                // Clear any leftover from an abandoned size/encode sequence
                self.scratch.take();
                Ok(write_null_frame(address))
            }
            Some(v) => {
                // Reuse the bytes cached by calculate_size; recompute if a
                // caller skipped the sizing step
                let bytes = match self.scratch.take() {
                    Some(bytes) => bytes,
                    None => bincode::serialize(v).map_err(codec_error)?,
                };
                Ok(write_frame(address, &bytes))
            }
        }
    }

    unsafe fn decode(&self, address: u64) -> Result<Option<T>> {
        match read_frame(address) {
            None => Ok(None),
            Some(payload) => bincode::deserialize(&payload)
                .map(Some)
                .map_err(codec_error),
        }
    }
}
