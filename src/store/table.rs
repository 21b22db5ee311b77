//! Store implementation
//!
//! BTreeMap-based table with RwLock for concurrency.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use super::GlobPattern;

/// In-memory table holding every live entry
pub struct Store {
    data: RwLock<BTreeMap<String, Vec<u8>>>,

    /// Approximate size in bytes (keys + values), updated under the write lock
    size: AtomicUsize,
}

impl Store {
    /// Create a new empty Store
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            size: AtomicUsize::new(0),
        }
    }

    /// Get a copy of the value for a key (read lock)
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.data.read().get(key).cloned()
    }

    /// Whether the key is present (read lock)
    pub fn contains(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// Insert or overwrite a key (write lock)
    ///
    /// Returns the previous value, if any.
    pub fn insert(&self, key: String, value: Vec<u8>) -> Option<Vec<u8>> {
        let mut data = self.data.write();
        let added = key.len() + value.len();
        let key_len = key.len();

        let previous = data.insert(key, value);
        match &previous {
            Some(old) => {
                self.size.fetch_add(added, Ordering::Relaxed);
                self.size.fetch_sub(key_len + old.len(), Ordering::Relaxed);
            }
            None => {
                self.size.fetch_add(added, Ordering::Relaxed);
            }
        }
        previous
    }

    /// Remove a key, returning its value (write lock)
    pub fn remove(&self, key: &str) -> Option<Vec<u8>> {
        let mut data = self.data.write();
        let removed = data.remove(key);
        if let Some(value) = &removed {
            self.size.fetch_sub(key.len() + value.len(), Ordering::Relaxed);
        }
        removed
    }

    /// All keys matching a glob pattern, in key order (read lock)
    ///
    /// Only the range of keys sharing the pattern's literal prefix is scanned.
    /// The whole listing comes from one read-locked pass, so it is a
    /// snapshot of the Store at the time of the call.
    pub fn keys_matching(&self, pattern: &GlobPattern) -> Vec<String> {
        let data = self.data.read();
        let prefix = pattern.literal_prefix();

        // A pattern without wildcards names at most one key
        if !pattern.has_wildcards() {
            return data
                .get_key_value(prefix)
                .map(|(key, _)| key.clone())
                .into_iter()
                .collect();
        }

        data.range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .filter(|(key, _)| pattern.matches(key))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Get entry count
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
