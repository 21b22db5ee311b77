//! Store Tests
//!
//! Tests verify:
//! - Basic CRUD operations
//! - Size tracking
//! - Pattern listings in key order
//! - Concurrent access patterns

use std::sync::Arc;
use std::thread;

use tiny_mp_cache::store::{GlobPattern, Store};

fn keys(store: &Store, pattern: &str) -> Vec<String> {
    store.keys_matching(&GlobPattern::new(pattern))
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_store_is_empty() {
    let store = Store::new();
    assert_eq!(store.len(), 0);
    assert_eq!(store.size(), 0);
    assert!(store.is_empty());
}

#[test]
fn test_insert_and_get() {
    let store = Store::new();

    assert_eq!(store.insert("key1".to_string(), b"value1".to_vec()), None);

    assert_eq!(store.get("key1"), Some(b"value1".to_vec()));
    assert!(store.contains("key1"));
    assert_eq!(store.get("nonexistent"), None);
}

#[test]
fn test_insert_overwrites_existing() {
    let store = Store::new();

    store.insert("key".to_string(), b"old".to_vec());
    let previous = store.insert("key".to_string(), b"new".to_vec());

    assert_eq!(previous, Some(b"old".to_vec()));
    assert_eq!(store.get("key"), Some(b"new".to_vec()));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_remove() {
    let store = Store::new();
    store.insert("key".to_string(), b"value".to_vec());

    assert_eq!(store.remove("key"), Some(b"value".to_vec()));
    assert_eq!(store.remove("key"), None);
    assert!(!store.contains("key"));
    assert!(store.is_empty());
}

#[test]
fn test_empty_key_and_value_are_valid() {
    let store = Store::new();
    store.insert(String::new(), Vec::new());

    assert_eq!(store.get(""), Some(Vec::new()));
    assert_eq!(store.len(), 1);
}

// =============================================================================
// Size Tracking Tests
// =============================================================================

#[test]
fn test_size_tracking() {
    let store = Store::new();

    store.insert("abc".to_string(), b"12345".to_vec());
    assert_eq!(store.size(), 8);

    store.insert("abc".to_string(), b"1".to_vec());
    assert_eq!(store.size(), 4);

    store.insert("de".to_string(), b"xy".to_vec());
    assert_eq!(store.size(), 8);

    store.remove("abc");
    assert_eq!(store.size(), 4);

    store.remove("de");
    assert_eq!(store.size(), 0);
    assert!(store.is_empty());
}

// =============================================================================
// Pattern Listing Tests
// =============================================================================

#[test]
fn test_keys_matching_prefix() {
    let store = Store::new();
    for key in ["job:1", "job:2", "job:10", "jobs", "user:1", "jo"] {
        store.insert(key.to_string(), b"v".to_vec());
    }

    assert_eq!(keys(&store, "job:*"), vec!["job:1", "job:10", "job:2"]);
    assert_eq!(keys(&store, "job:?"), vec!["job:1", "job:2"]);
    assert_eq!(keys(&store, "user:*"), vec!["user:1"]);
    assert!(keys(&store, "zzz*").is_empty());
}

#[test]
fn test_keys_matching_all_sorted() {
    let store = Store::new();
    for key in ["c", "a", "b"] {
        store.insert(key.to_string(), Vec::new());
    }

    assert_eq!(keys(&store, "*"), vec!["a", "b", "c"]);
}

#[test]
fn test_keys_matching_exact() {
    let store = Store::new();
    store.insert("exact".to_string(), Vec::new());
    store.insert("exactly".to_string(), Vec::new());

    assert_eq!(keys(&store, "exact"), vec!["exact"]);
    assert!(keys(&store, "exac").is_empty());

    // Escaped wildcards are literal
    store.insert("a*".to_string(), Vec::new());
    store.insert("ab".to_string(), Vec::new());
    assert_eq!(keys(&store, r"a\*"), vec!["a*"]);
}

#[test]
fn test_keys_matching_leading_wildcard() {
    let store = Store::new();
    for key in ["a:done", "b:done", "c:pending"] {
        store.insert(key.to_string(), Vec::new());
    }

    assert_eq!(keys(&store, "*:done"), vec!["a:done", "b:done"]);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_readers_and_writer() {
    let store = Arc::new(Store::new());
    for i in 0..100 {
        store.insert(format!("key{:03}", i), b"initial".to_vec());
    }

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..100 {
                store.insert(format!("key{:03}", i), b"updated".to_vec());
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..100 {
                    let value = store.get(&format!("key{:03}", i)).unwrap();
                    assert!(value == b"initial" || value == b"updated");
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(store.len(), 100);
    assert_eq!(store.get("key042"), Some(b"updated".to_vec()));
}

#[test]
fn test_concurrent_removes_hand_out_each_value_once() {
    let store = Arc::new(Store::new());
    for i in 0..200 {
        store.insert(format!("k{}", i), vec![1]);
    }

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || (0..200).filter(|i| store.remove(&format!("k{}", i)).is_some()).count())
        })
        .collect();

    let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(total, 200);
    assert!(store.is_empty());
}
