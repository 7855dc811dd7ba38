//! Raw byte-vector codec

use crate::error::Result;

use super::{read_frame, write_frame, write_null_frame, Codec, LENGTH_PREFIX_SIZE};

/// Passthrough codec for `Vec<u8>` values
///
/// Note the wire-level leniency: an empty vector encodes as a zero-length
/// frame, which decodes as `None`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BytesCodec;

impl Codec<Vec<u8>> for BytesCodec {
    fn calculate_size(&self, value: Option<&Vec<u8>>) -> Result<usize> {
        Ok(match value {
            Some(data) => LENGTH_PREFIX_SIZE + data.len(),
            None => LENGTH_PREFIX_SIZE,
        })
    }

    unsafe fn encode(&self, address: u64, value: Option<&Vec<u8>>) -> Result<usize> {
        Ok(match value {
            Some(data) => write_frame(address, data),
            None => write_null_frame(address),
        })
    }

    unsafe fn decode(&self, address: u64) -> Result<Option<Vec<u8>>> {
        Ok(read_frame(address))
    }
}
