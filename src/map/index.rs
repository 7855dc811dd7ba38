//! Key index structures
//!
//! The in-heap side of the map: a hash-keyed structure resolving a key to
//! the stored byte range of its current value. Entry data itself stays
//! off-heap; the index only holds addresses, lengths, and (for the
//! primitive strategy) the native key.

use std::collections::HashMap;
use std::hash::Hash;

use crate::config::IndexStrategy;

/// Index entry of the generic (codec-backed) strategy
///
/// Tracks the off-heap key bytes alongside the value range: a hash match
/// is only accepted after the stored key compares equal to the query key,
/// since the arena never reclaims space the key bytes can always be read
/// back for that check.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EntrySlot {
    pub key_address: u64,
    pub key_length: usize,
    pub value_address: u64,
    pub value_length: usize,
}

/// Index entry of the primitive (fixed-width key) strategy
#[derive(Debug, Clone, Copy)]
pub(crate) struct ValueSlot {
    pub address: u64,
    pub length: usize,
}

/// Hash index from key to stored byte range
///
/// Two strategies, fixed at construction:
/// - `Generic`: buckets keyed by the 64-bit hash of the typed key; hash
///   collisions share a bucket and are resolved by full-key verification.
/// - `Primitive`: the key itself is the `HashMap` key — hashed and
///   compared as its native value, never routed through a codec.
pub(crate) enum KeyIndex<K> {
    Generic {
        buckets: HashMap<u64, Vec<EntrySlot>>,
        len: usize,
    },
    Primitive {
        slots: HashMap<K, ValueSlot>,
    },
}

impl<K: Hash + Eq> KeyIndex<K> {
    pub fn new(strategy: IndexStrategy) -> Self {
        match strategy {
            IndexStrategy::Generic => Self::Generic {
                buckets: HashMap::new(),
                len: 0,
            },
            IndexStrategy::Primitive => Self::Primitive {
                slots: HashMap::new(),
            },
        }
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        match self {
            Self::Generic { len, .. } => *len,
            Self::Primitive { slots } => slots.len(),
        }
    }
}
