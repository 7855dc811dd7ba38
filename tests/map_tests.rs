//! Tests for ArenaMap
//!
//! These tests verify:
//! - The put/get/remove/contains_key/len contract over both backings
//! - Previous-value semantics on overwrite and remove
//! - The primitive-key index fast path
//! - Builder validation and capacity exhaustion

use arenakv::codec::{BincodeCodec, I64Codec, StringCodec};
use arenakv::{ArenaError, ArenaMap};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn string_map(capacity: u64) -> ArenaMap<String, String> {
    ArenaMap::builder()
        .off_heap()
        .allocate_size(capacity)
        .key_codec(StringCodec)
        .value_codec(StringCodec)
        .build()
        .unwrap()
}

fn key(s: &str) -> String {
    s.to_string()
}

// =============================================================================
// End-to-End Scenario
// =============================================================================

#[test]
fn test_end_to_end_off_heap_scenario() {
    let map = string_map(1024 * 1024);

    assert_eq!(map.put(&key("a"), &key("1")).unwrap(), None);
    assert_eq!(map.put(&key("a"), &key("2")).unwrap(), Some(key("1")));
    assert_eq!(map.get(&key("a")).unwrap(), Some(key("2")));
    assert_eq!(map.len(), 1);
    assert_eq!(map.remove(&key("a")).unwrap(), Some(key("2")));
    assert_eq!(map.get(&key("a")).unwrap(), None);
    assert_eq!(map.len(), 0);
}

// =============================================================================
// Basic Operations
// =============================================================================

#[test]
fn test_get_absent_key() {
    let map = string_map(64 * 1024);
    assert_eq!(map.get(&key("missing")).unwrap(), None);
}

#[test]
fn test_put_many_and_get_all() {
    let map = string_map(4 * 1024 * 1024);

    for i in 0..1000 {
        let k = format!("key{}", i);
        let v = format!("value{}", i);
        assert_eq!(map.put(&k, &v).unwrap(), None);
    }
    assert_eq!(map.len(), 1000);

    for i in 0..1000 {
        let k = format!("key{}", i);
        assert_eq!(map.get(&k).unwrap(), Some(format!("value{}", i)));
    }
}

#[test]
fn test_overwrite_returns_previous_value() {
    let map = string_map(64 * 1024);

    assert_eq!(map.put(&key("k"), &key("v1")).unwrap(), None);
    assert_eq!(map.put(&key("k"), &key("v2")).unwrap(), Some(key("v1")));
    assert_eq!(map.put(&key("k"), &key("v3")).unwrap(), Some(key("v2")));

    // Overwrites never grow the entry count
    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&key("k")).unwrap(), Some(key("v3")));
}

#[test]
fn test_overwrite_orphans_old_bytes() {
    let map = string_map(64 * 1024);

    map.put(&key("k"), &key("first")).unwrap();
    let used_after_first = map.used();

    map.put(&key("k"), &key("second")).unwrap();

    // The arena only grows: the superseded value's bytes stay behind
    assert!(map.used() > used_after_first);
}

#[test]
fn test_remove_absent_key() {
    let map = string_map(64 * 1024);

    map.put(&key("present"), &key("v")).unwrap();
    assert_eq!(map.remove(&key("absent")).unwrap(), None);
    assert_eq!(map.len(), 1);
}

#[test]
fn test_remove_then_reinsert() {
    let map = string_map(64 * 1024);

    map.put(&key("k"), &key("v1")).unwrap();
    assert_eq!(map.remove(&key("k")).unwrap(), Some(key("v1")));

    // A removed key behaves exactly like a never-inserted one
    assert_eq!(map.put(&key("k"), &key("v2")).unwrap(), None);
    assert_eq!(map.get(&key("k")).unwrap(), Some(key("v2")));
}

#[test]
fn test_contains_key() {
    let map = string_map(64 * 1024);

    map.put(&key("here"), &key("v")).unwrap();

    assert!(map.contains_key(&key("here")).unwrap());
    assert!(!map.contains_key(&key("gone")).unwrap());
}

#[test]
fn test_len_and_is_empty() {
    let map = string_map(64 * 1024);
    assert!(map.is_empty());

    map.put(&key("a"), &key("1")).unwrap();
    map.put(&key("b"), &key("2")).unwrap();
    assert_eq!(map.len(), 2);

    map.remove(&key("a")).unwrap();
    assert_eq!(map.len(), 1);
    assert!(!map.is_empty());
}

// =============================================================================
// Primitive Index
// =============================================================================

#[test]
fn test_primitive_index_basic_operations() {
    let map: ArenaMap<i64, String> = ArenaMap::builder()
        .off_heap()
        .allocate_size(1024 * 1024)
        .primitive_index()
        .key_codec(I64Codec)
        .value_codec(StringCodec)
        .build()
        .unwrap();

    assert_eq!(map.put(&1, &key("Hello")).unwrap(), None);
    assert_eq!(map.put(&2, &key("World")).unwrap(), None);

    assert_eq!(map.get(&1).unwrap(), Some(key("Hello")));
    assert_eq!(map.get(&2).unwrap(), Some(key("World")));
    assert_eq!(map.len(), 2);

    assert_eq!(map.put(&1, &key("Replaced")).unwrap(), Some(key("Hello")));
    assert_eq!(map.remove(&2).unwrap(), Some(key("World")));
    assert_eq!(map.len(), 1);
}

#[test]
fn test_primitive_index_stores_no_key_bytes() {
    let generic: ArenaMap<i64, i64> = ArenaMap::builder()
        .off_heap()
        .allocate_size(1024 * 1024)
        .key_codec(I64Codec)
        .value_codec(I64Codec)
        .build()
        .unwrap();
    let primitive: ArenaMap<i64, i64> = ArenaMap::builder()
        .off_heap()
        .allocate_size(1024 * 1024)
        .primitive_index()
        .key_codec(I64Codec)
        .value_codec(I64Codec)
        .build()
        .unwrap();

    for i in 0..100 {
        generic.put(&i, &i).unwrap();
        primitive.put(&i, &i).unwrap();
    }

    // The fast path skips the off-heap key copies entirely
    assert!(primitive.used() < generic.used());
}

// =============================================================================
// Structured Values
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Account {
    owner: String,
    balance: f64,
    flags: Vec<u32>,
}

#[test]
fn test_bincode_values() {
    let map: ArenaMap<String, Account> = ArenaMap::builder()
        .off_heap()
        .allocate_size(1024 * 1024)
        .key_codec(StringCodec)
        .value_codec(BincodeCodec::new())
        .build()
        .unwrap();

    let account = Account {
        owner: "ada".to_string(),
        balance: 99.25,
        flags: vec![1, 2, 3],
    };

    map.put(&key("acct"), &account).unwrap();
    assert_eq!(map.get(&key("acct")).unwrap(), Some(account));
}

// =============================================================================
// Mapped-File Backing
// =============================================================================

#[test]
fn test_mapped_file_map_operations() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.map");

    let map: ArenaMap<String, String> = ArenaMap::builder()
        .persistent(&path)
        .allocate_size(10 * 1024 * 1024)
        .key_codec(StringCodec)
        .value_codec(StringCodec)
        .build()
        .unwrap();

    assert!(path.exists());
    assert_eq!(
        std::fs::metadata(&path).unwrap().len(),
        10 * 1024 * 1024
    );

    assert_eq!(map.put(&key("k1"), &key("v1")).unwrap(), None);
    assert_eq!(map.put(&key("k1"), &key("v2")).unwrap(), Some(key("v1")));
    assert_eq!(map.get(&key("k1")).unwrap(), Some(key("v2")));

    map.flush().unwrap();
    map.close().unwrap();
    assert!(path.exists());
}

#[test]
fn test_temporary_map_removes_file_on_close() {
    let map: ArenaMap<i64, String> = ArenaMap::builder()
        .temporary()
        .allocate_size(1024 * 1024)
        .primitive_index()
        .key_codec(I64Codec)
        .value_codec(StringCodec)
        .build()
        .unwrap();

    map.put(&1, &key("Hello")).unwrap();
    map.put(&2, &key("World")).unwrap();
    assert_eq!(map.get(&1).unwrap(), Some(key("Hello")));

    map.close().unwrap();
}

// =============================================================================
// Capacity Exhaustion
// =============================================================================

#[test]
fn test_put_out_of_space() {
    let map = string_map(64);

    let oversized = "x".repeat(128);
    let result = map.put(&key("k"), &oversized);
    assert!(matches!(result, Err(ArenaError::OutOfSpace { .. })));

    // The failed insert left no index entry behind
    assert_eq!(map.len(), 0);
    assert_eq!(map.get(&key("k")).unwrap(), None);
}

#[test]
fn test_puts_fail_once_arena_is_full() {
    let map = string_map(256);

    let mut stored = 0;
    for i in 0..100 {
        match map.put(&format!("key{}", i), &format!("value{}", i)) {
            Ok(None) => stored += 1,
            Err(ArenaError::OutOfSpace { .. }) => break,
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    assert!(stored > 0);
    assert_eq!(map.len(), stored);

    // Entries stored before exhaustion remain readable
    assert_eq!(map.get(&key("key0")).unwrap(), Some(key("value0")));
}

// =============================================================================
// Builder Validation
// =============================================================================

#[test]
fn test_builder_requires_codecs() {
    let result: arenakv::Result<ArenaMap<String, String>> = ArenaMap::builder()
        .off_heap()
        .allocate_size(1024)
        .build();
    assert!(matches!(result, Err(ArenaError::Config(_))));
}

#[test]
fn test_builder_rejects_zero_capacity() {
    let result: arenakv::Result<ArenaMap<String, String>> = ArenaMap::builder()
        .off_heap()
        .allocate_size(0)
        .key_codec(StringCodec)
        .value_codec(StringCodec)
        .build();
    assert!(matches!(result, Err(ArenaError::Config(_))));
}

#[test]
fn test_builder_rejects_empty_path() {
    // Mapped-file mode without a resolvable path fails before any
    // allocation is attempted
    let result: arenakv::Result<ArenaMap<String, String>> = ArenaMap::builder()
        .persistent("")
        .allocate_size(1024)
        .key_codec(StringCodec)
        .value_codec(StringCodec)
        .build();
    assert!(matches!(result, Err(ArenaError::Config(_))));
}
