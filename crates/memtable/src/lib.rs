//! # Memtable
//!
//! An in-memory, sorted, mutable write buffer for the RiptideKV storage engine.
//!
//! The memtable is the first point of contact for every write operation. It
//! buffers recent `PUT` and `DELETE` operations in a sorted structure
//! (`BTreeMap`) before they are flushed to an immutable on-disk component.
//!
//! ## Key properties
//! - **Sorted order**: entries are always in ascending key order (required for
//!   component flush).
//! - **In-band tombstones**: deletes are recorded as ordinary string values
//!   equal to [`TOMBSTONE`]. This is a known design limitation inherited from
//!   the original prototype this engine is based on -- see the engine crate's
//!   design notes.
//! - **Count-based capacity**: the engine asks for a flush once the entry
//!   count reaches a configured threshold `L`.
//!
//! ## Example
//! ```rust
//! use memtable::Memtable;
//!
//! let mut m = Memtable::new(1000);
//! m.put("hello".to_string(), "world".to_string());
//! assert_eq!(m.get("hello"), Some("world".to_string()));
//!
//! m.delete("hello".to_string());
//! assert_eq!(m.get("hello"), None);
//! ```

use std::collections::BTreeMap;
use std::ops::Bound::Included;

/// Reserved value marking a deleted key. A genuine value equal to this
/// string cannot be stored -- callers are expected to reject it at the
/// engine boundary before it ever reaches the memtable.
pub const TOMBSTONE: &str = "<DELETED>";

/// An ordered, in-memory write buffer backed by a `BTreeMap<String, String>`.
///
/// Capacity is tracked purely by entry count: `put` reports once `len() >=
/// capacity` so the caller can trigger a flush. The memtable itself performs
/// no I/O and holds no lock; the owning table wraps it in a mutex per the
/// engine's concurrency model.
#[derive(Debug)]
pub struct Memtable {
    map: BTreeMap<String, String>,
    capacity: usize,
}

impl Memtable {
    /// Creates a new, empty memtable with the given flush-trigger capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            map: BTreeMap::new(),
            capacity,
        }
    }

    /// Inserts or overwrites a key-value pair.
    ///
    /// Returns `true` if the memtable's size is now at or above its
    /// configured capacity, signaling the caller should flush.
    pub fn put(&mut self, key: String, value: String) -> bool {
        self.map.insert(key, value);
        self.map.len() >= self.capacity
    }

    /// Records a tombstone for the given key. Equivalent to
    /// `put(key, TOMBSTONE.to_string())`.
    pub fn delete(&mut self, key: String) -> bool {
        self.put(key, TOMBSTONE.to_string())
    }

    /// Returns the live value for `key`, or `None` if absent or tombstoned.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).and_then(|v| {
            if v == TOMBSTONE {
                None
            } else {
                Some(v.clone())
            }
        })
    }

    /// Returns the raw entry for `key`, including tombstones, distinguishing
    /// "not present" (`None`) from "present but deleted" (`Some(TOMBSTONE)`).
    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    /// Returns every `(key, value)` pair with `start <= key <= end`, live
    /// values and tombstones alike, in ascending key order.
    ///
    /// Returns empty for `start > end` rather than panicking: `BTreeMap::range`
    /// requires `start <= end` of its bound, which a caller-supplied pair
    /// isn't guaranteed to satisfy.
    #[must_use]
    pub fn range(&self, start: &str, end: &str) -> Vec<(String, String)> {
        if start > end {
            return Vec::new();
        }
        self.map
            .range((Included(start.to_string()), Included(end.to_string())))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Drains all entries in ascending key order and empties the memtable.
    pub fn flush(&mut self) -> Vec<(String, String)> {
        std::mem::take(&mut self.map).into_iter().collect()
    }

    /// Returns the number of entries (including tombstones).
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the memtable contains zero entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the configured flush-trigger capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` if the memtable holds an entry (live or tombstone) for
    /// `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }
}
