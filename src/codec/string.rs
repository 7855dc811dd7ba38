//! String codec
//!
//! UTF-8 payload, no scratch state: sizing a string is free, so `encode`
//! simply re-reads the bytes instead of caching them.

use crate::error::{ArenaError, Result};

use super::{read_frame, write_frame, write_null_frame, Codec, LENGTH_PREFIX_SIZE};

/// Codec for `String` values (UTF-8 payload)
#[derive(Debug, Default, Clone, Copy)]
pub struct StringCodec;

impl Codec<String> for StringCodec {
    fn calculate_size(&self, value: Option<&String>) -> Result<usize> {
        Ok(match value {
            Some(s) => LENGTH_PREFIX_SIZE + s.len(),
            None => LENGTH_PREFIX_SIZE,
        })
    }

    unsafe fn encode(&self, address: u64, value: Option<&String>) -> Result<usize> {
        Ok(match value {
            Some(s) => write_frame(address, s.as_bytes()),
            None => write_null_frame(address),
        })
    }

    unsafe fn decode(&self, address: u64) -> Result<Option<String>> {
        match read_frame(address) {
            None => Ok(None),
            Some(payload) => String::from_utf8(payload)
                .map(Some)
                .map_err(|e| ArenaError::Codec(format!("invalid UTF-8 payload: {}", e))),
        }
    }
}
