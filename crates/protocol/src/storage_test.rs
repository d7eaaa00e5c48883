//! Tests for StorageKey

use crate::storage::StorageKey;
use std::collections::{BTreeMap, HashMap};

#[test]
fn test_storage_key_new() {
    let key = StorageKey::new("errors");
    assert_eq!(key.as_str(), "errors");

    let key = StorageKey::new(String::from("transactions"));
    assert_eq!(key.as_str(), "transactions");
}

#[test]
fn test_storage_key_from() {
    let key: StorageKey = "events".into();
    assert_eq!(key.as_str(), "events");

    let key: StorageKey = String::from("spans").into();
    assert_eq!(key.as_ref(), "spans");
}

#[test]
fn test_storage_key_display() {
    let key = StorageKey::new("errors_v2");
    assert_eq!(key.to_string(), "errors_v2");
    assert_eq!(format!("{}", key), "errors_v2");
}

#[test]
fn test_storage_key_hashmap_lookup_by_str() {
    let mut map = HashMap::new();
    map.insert(StorageKey::new("errors"), 1);
    map.insert(StorageKey::new("transactions"), 2);

    assert_eq!(map.get("errors"), Some(&1));
    assert_eq!(map.get("transactions"), Some(&2));
    assert_eq!(map.get("missing"), None);
}

#[test]
fn test_storage_key_ordering() {
    let mut map = BTreeMap::new();
    map.insert(StorageKey::new("b"), ());
    map.insert(StorageKey::new("a"), ());
    map.insert(StorageKey::new("c"), ());

    let keys: Vec<_> = map.keys().map(StorageKey::as_str).collect();
    assert_eq!(keys, vec!["a", "b", "c"]);
}

#[test]
fn test_storage_key_serde_transparent() {
    let key = StorageKey::new("errors");
    let json = serde_json::to_string(&key).unwrap();
    assert_eq!(json, "\"errors\"");

    let back: StorageKey = serde_json::from_str(&json).unwrap();
    assert_eq!(back, key);
}
