//! Map Module
//!
//! The public map type composing one allocator, one storage engine, a key
//! codec, a value codec, and a hash index.
//!
//! ## Responsibilities
//! - Resolve keys to stored byte ranges through the index
//! - Drive the size → allocate → encode write path
//! - Honor the "return previous value" contract on overwrite and remove
//!
//! ## Concurrency Model
//!
//! - **Allocation**: lock-free (the allocator's CAS cursor); performed
//!   outside the index lock, as is the value encode into the freshly
//!   reserved range — no other thread can hold that address yet.
//! - **Index**: one map-wide `RwLock`. Lookups (`get`, `contains_key`,
//!   `len`) share a read lock; mutations (`put`, `remove`) take the write
//!   lock for the whole lookup+mutate step so two same-key writers can
//!   never interleave into a torn or lost update.
//! - **Close**: `close(self)` consumes the map, so exclusive access at
//!   teardown is enforced by the type system.

mod builder;
mod index;

pub use builder::MapBuilder;

use std::collections::hash_map::{Entry, RandomState};
use std::hash::{BuildHasher, Hash};

use parking_lot::RwLock;

use crate::codec::Codec;
use crate::config::IndexStrategy;
use crate::error::{ArenaError, Result};
use crate::memory::NULL_ADDRESS;
use crate::storage::StorageEngine;

use index::{EntrySlot, KeyIndex, ValueSlot};

/// Hash-indexed key-value map over an off-heap or memory-mapped arena
///
/// All entry data lives outside the managed heap; the index holds only
/// addresses and lengths (plus native keys under the primitive strategy).
/// Superseded and removed entries are retired from the index but their
/// bytes are never reclaimed — the arena is monotonic for the map's
/// lifetime.
pub struct ArenaMap<K, V> {
    /// Byte engine owning the allocator
    storage: StorageEngine,

    /// Codec for key bytes (generic index strategy only)
    key_codec: Box<dyn Codec<K>>,

    /// Codec for value bytes
    value_codec: Box<dyn Codec<V>>,

    /// Key → stored range; one map-wide lock serializes mutation
    index: RwLock<KeyIndex<K>>,

    /// Hasher for the generic strategy's 64-bit key hashes
    hash_builder: RandomState,
}

impl<K, V> ArenaMap<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Start building a map
    pub fn builder() -> MapBuilder<K, V> {
        MapBuilder::new()
    }

    pub(crate) fn from_parts(
        storage: StorageEngine,
        key_codec: Box<dyn Codec<K>>,
        value_codec: Box<dyn Codec<V>>,
        strategy: IndexStrategy,
    ) -> Self {
        Self {
            storage,
            key_codec,
            value_codec,
            index: RwLock::new(KeyIndex::new(strategy)),
            hash_builder: RandomState::new(),
        }
    }

    // =========================================================================
    // Core Operations
    // =========================================================================

    /// Insert or overwrite `key`, returning the previous value if any
    ///
    /// Steps:
    /// 1. Size and allocate the value range (lock-free)
    /// 2. Encode the value at the returned address
    /// 3. Lock the index; on overwrite decode the previous value *before*
    ///    replacing the slot, on insert store the key bytes off-heap
    ///
    /// Fails with [`ArenaError::OutOfSpace`] when the arena cannot fit the
    /// encoded value (or, on first insert, the encoded key).
    pub fn put(&self, key: &K, value: &V) -> Result<Option<V>> {
        let value_size = self.value_codec.calculate_size(Some(value))?;
        let value_address = self.storage.allocator().allocate(value_size)?;
        if value_address == NULL_ADDRESS {
            return Err(ArenaError::OutOfSpace {
                requested: value_size,
            });
        }

        // SAFETY: value_address was just handed out with value_size bytes
        // reserved, and no other thread can hold it
        let value_length = unsafe { self.value_codec.encode(value_address, Some(value))? };

        let mut index = self.index.write();
        match &mut *index {
            KeyIndex::Primitive { slots } => {
                let slot = ValueSlot {
                    address: value_address,
                    length: value_length,
                };
                match slots.entry(key.clone()) {
                    Entry::Occupied(mut occupied) => {
                        let old = *occupied.get();
                        // Decode before the slot is overwritten
                        // SAFETY: old.address holds a frame encoded by put
                        let previous = unsafe { self.value_codec.decode(old.address)? };
                        occupied.insert(slot);
                        self.storage.delete(old.address, old.length);
                        Ok(previous)
                    }
                    Entry::Vacant(vacant) => {
                        vacant.insert(slot);
                        Ok(None)
                    }
                }
            }
            KeyIndex::Generic { buckets, len } => {
                let hash = self.hash_builder.hash_one(key);

                if let Some(bucket) = buckets.get_mut(&hash) {
                    for slot in bucket.iter_mut() {
                        // SAFETY: slot addresses hold frames encoded by put
                        if unsafe { self.stored_key_matches(slot.key_address, key)? } {
                            let old_address = slot.value_address;
                            let old_length = slot.value_length;
                            let previous = unsafe { self.value_codec.decode(old_address)? };
                            slot.value_address = value_address;
                            slot.value_length = value_length;
                            self.storage.delete(old_address, old_length);
                            return Ok(previous);
                        }
                    }
                }

                // New key: store its encoded bytes so later lookups can
                // confirm hash matches against the real key
                let key_size = self.key_codec.calculate_size(Some(key))?;
                let key_address = self.storage.allocator().allocate(key_size)?;
                if key_address == NULL_ADDRESS {
                    // The value bytes just written stay orphaned; the
                    // arena never reclaims
                    return Err(ArenaError::OutOfSpace { requested: key_size });
                }
                // SAFETY: key_address was just handed out with key_size
                // bytes reserved
                let key_length = unsafe { self.key_codec.encode(key_address, Some(key))? };

                buckets.entry(hash).or_default().push(EntrySlot {
                    key_address,
                    key_length,
                    value_address,
                    value_length,
                });
                *len += 1;
                Ok(None)
            }
        }
    }

    /// Look up `key`, returning its current value if present
    pub fn get(&self, key: &K) -> Result<Option<V>> {
        let index = self.index.read();
        match &*index {
            KeyIndex::Primitive { slots } => match slots.get(key) {
                None => Ok(None),
                // SAFETY: slot.address holds a frame encoded by put
                Some(slot) => unsafe { self.value_codec.decode(slot.address) },
            },
            KeyIndex::Generic { buckets, .. } => {
                match self.find_verified(buckets, key)? {
                    None => Ok(None),
                    // SAFETY: slot addresses hold frames encoded by put
                    Some(slot) => unsafe { self.value_codec.decode(slot.value_address) },
                }
            }
        }
    }

    /// Remove `key`, returning the value it held
    ///
    /// The index entry is dropped; the stored bytes are retired through
    /// [`StorageEngine::delete`] but not reclaimed.
    pub fn remove(&self, key: &K) -> Result<Option<V>> {
        let mut index = self.index.write();
        match &mut *index {
            KeyIndex::Primitive { slots } => match slots.remove(key) {
                None => Ok(None),
                Some(slot) => {
                    // SAFETY: slot.address holds a frame encoded by put
                    let previous = unsafe { self.value_codec.decode(slot.address)? };
                    self.storage.delete(slot.address, slot.length);
                    Ok(previous)
                }
            },
            KeyIndex::Generic { buckets, len } => {
                let hash = self.hash_builder.hash_one(key);

                let Some(bucket) = buckets.get_mut(&hash) else {
                    return Ok(None);
                };

                let mut found = None;
                for (position, slot) in bucket.iter().enumerate() {
                    // SAFETY: slot addresses hold frames encoded by put
                    if unsafe { self.stored_key_matches(slot.key_address, key)? } {
                        found = Some(position);
                        break;
                    }
                }

                let Some(position) = found else {
                    return Ok(None);
                };

                let slot = bucket.swap_remove(position);
                let bucket_empty = bucket.is_empty();
                if bucket_empty {
                    buckets.remove(&hash);
                }
                *len -= 1;

                // SAFETY: the removed slot's addresses still hold their
                // frames; the arena never reclaims
                let previous = unsafe { self.value_codec.decode(slot.value_address)? };
                self.storage.delete(slot.value_address, slot.value_length);
                self.storage.delete(slot.key_address, slot.key_length);
                Ok(previous)
            }
        }
    }

    /// Whether `key` is present, without decoding its value
    pub fn contains_key(&self, key: &K) -> Result<bool> {
        let index = self.index.read();
        match &*index {
            KeyIndex::Primitive { slots } => Ok(slots.contains_key(key)),
            KeyIndex::Generic { buckets, .. } => {
                Ok(self.find_verified(buckets, key)?.is_some())
            }
        }
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // Capacity & Lifecycle
    // =========================================================================

    /// Total capacity of the backing address space in bytes
    pub fn capacity(&self) -> u64 {
        self.storage.capacity()
    }

    /// Bytes of the address space handed out so far
    pub fn used(&self) -> u64 {
        self.storage.used()
    }

    /// Force written bytes to durable storage (mapped-file mode)
    pub fn flush(&self) -> Result<()> {
        self.storage.flush()
    }

    /// Flush and release the address space
    ///
    /// Consumes the map: no operation can race with teardown, and no
    /// previously returned address can be used afterwards.
    pub fn close(self) -> Result<()> {
        self.storage.close()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Find the bucket slot whose stored key equals `key`, if any
    fn find_verified<'a>(
        &self,
        buckets: &'a std::collections::HashMap<u64, Vec<EntrySlot>>,
        key: &K,
    ) -> Result<Option<&'a EntrySlot>> {
        let hash = self.hash_builder.hash_one(key);

        let Some(bucket) = buckets.get(&hash) else {
            return Ok(None);
        };

        for slot in bucket {
            // SAFETY: slot.key_address holds a frame encoded by put
            if unsafe { self.stored_key_matches(slot.key_address, key)? } {
                return Ok(Some(slot));
            }
        }
        Ok(None)
    }

    /// Compare the key stored at `key_address` against the query key
    ///
    /// Hash equality is not key equality; every hash match is confirmed
    /// here before it is trusted.
    ///
    /// # Safety
    ///
    /// `key_address` must hold a frame written by this map's key codec.
    unsafe fn stored_key_matches(&self, key_address: u64, key: &K) -> Result<bool> {
        let stored = self.key_codec.decode(key_address)?;
        Ok(stored.as_ref() == Some(key))
    }
}
