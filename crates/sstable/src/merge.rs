//! Merge iterator over multiple [`DiskComponent`]s.
//!
//! Produces `(key, value)` pairs in ascending key order. Sources are fed in
//! from newest to oldest; when the same key appears in more than one
//! source, the newest one's value wins and every later duplicate for that
//! key is discarded.
//!
//! This is the core primitive for compaction: walk every component in a
//! level in sorted order, collapse duplicates by recency, and hand the
//! result to the writer.

use anyhow::Result;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::DiskComponent;

/// A pending key from one component, used for heap-based merge ordering.
struct HeapEntry {
    key: String,
    value: String,
    /// Index into `components`. Lower index = newer component.
    source: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.source == other.source
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; we want the smallest key first, and on a
        // tie the entry from the lowest (i.e. newest) source index first.
        other
            .key
            .cmp(&self.key)
            .then_with(|| other.source.cmp(&self.source))
    }
}

/// Merges multiple components, newest first, into a single sorted,
/// deduplicated stream.
///
/// Generic over `C: Borrow<DiskComponent>` so callers can feed it either a
/// plain `&[DiskComponent]` (as the reader tests do) or a `&[Arc<DiskComponent>]`
/// (as a live level's component list is stored by the engine) without an
/// intermediate copy.
pub struct MergeIterator<'a, C> {
    components: &'a [C],
    /// Per-component: remaining (key, value) pairs to feed the heap.
    item_iters: Vec<std::vec::IntoIter<(String, String)>>,
    heap: BinaryHeap<HeapEntry>,
}

impl<'a, C: Borrow<DiskComponent>> MergeIterator<'a, C> {
    /// Creates a new merge iterator. `components` must be ordered
    /// newest-first — that ordering is what gives the tie-break its
    /// "newer wins" semantics.
    pub fn new(components: &'a [C]) -> Result<Self> {
        let mut item_iters = Vec::with_capacity(components.len());
        let mut heap = BinaryHeap::new();

        for (i, component) in components.iter().enumerate() {
            let items = component.borrow().iter_items()?;
            let mut iter = items.into_iter();
            if let Some((key, value)) = iter.next() {
                heap.push(HeapEntry {
                    key,
                    value,
                    source: i,
                });
            }
            item_iters.push(iter);
        }

        Ok(Self {
            components,
            item_iters,
            heap,
        })
    }

    /// Returns the next `(key, value)` in sorted order, or `None` once every
    /// source is exhausted.
    pub fn next_entry(&mut self) -> Option<(String, String)> {
        let top = self.heap.pop()?;
        self.advance(top.source);

        let winning_key = top.key;
        let winning_value = top.value;

        // Discard every subsequent heap entry carrying the same key: they
        // come from older sources (by construction, any still-equal key at
        // the top after this pop is from a higher source index) and are
        // shadowed by the value just emitted.
        while let Some(peek) = self.heap.peek() {
            if peek.key != winning_key {
                break;
            }
            let dup = self.heap.pop().expect("peeked entry exists");
            self.advance(dup.source);
        }

        Some((winning_key, winning_value))
    }

    fn advance(&mut self, source: usize) {
        if let Some((key, value)) = self.item_iters[source].next() {
            self.heap.push(HeapEntry {
                key,
                value,
                source,
            });
        }
    }

    /// Collects all remaining entries into a `Vec`.
    pub fn collect_all(&mut self) -> Vec<(String, String)> {
        let mut result = Vec::new();
        while let Some(pair) = self.next_entry() {
            result.push(pair);
        }
        result
    }

    /// Number of source components being merged.
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.components.len()
    }
}
