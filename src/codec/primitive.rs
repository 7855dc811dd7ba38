//! Fixed-width numeric codecs
//!
//! Each codec frames the little-endian byte representation of one numeric
//! type. The payload width is validated on decode, so a frame written by
//! one width cannot be silently misread by another.

use crate::error::{ArenaError, Result};

use super::{read_frame, write_frame, write_null_frame, Codec, LENGTH_PREFIX_SIZE};

macro_rules! fixed_width_codec {
    ($(#[$meta:meta])* $name:ident, $ty:ty) => {
        $(#[$meta])*
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $name;

        impl Codec<$ty> for $name {
            fn calculate_size(&self, value: Option<&$ty>) -> Result<usize> {
                Ok(match value {
                    Some(_) => LENGTH_PREFIX_SIZE + std::mem::size_of::<$ty>(),
                    None => LENGTH_PREFIX_SIZE,
                })
            }

            unsafe fn encode(&self, address: u64, value: Option<&$ty>) -> Result<usize> {
                Ok(match value {
                    Some(v) => write_frame(address, &v.to_le_bytes()),
                    None => write_null_frame(address),
                })
            }

            unsafe fn decode(&self, address: u64) -> Result<Option<$ty>> {
                match read_frame(address) {
                    None => Ok(None),
                    Some(payload) => {
                        let bytes: [u8; std::mem::size_of::<$ty>()] =
                            payload.as_slice().try_into().map_err(|_| {
                                ArenaError::Codec(format!(
                                    "expected {} payload bytes for {}, got {}",
                                    std::mem::size_of::<$ty>(),
                                    stringify!($ty),
                                    payload.len()
                                ))
                            })?;
                        Ok(Some(<$ty>::from_le_bytes(bytes)))
                    }
                }
            }
        }
    };
}

fixed_width_codec!(
    /// Codec for `i32` values
    I32Codec,
    i32
);
fixed_width_codec!(
    /// Codec for `i64` values
    I64Codec,
    i64
);
fixed_width_codec!(
    /// Codec for `u32` values
    U32Codec,
    u32
);
fixed_width_codec!(
    /// Codec for `u64` values
    U64Codec,
    u64
);
fixed_width_codec!(
    /// Codec for `f32` values
    F32Codec,
    f32
);
fixed_width_codec!(
    /// Codec for `f64` values
    F64Codec,
    f64
);
