//! Read path: `get` and `range`.
//!
//! Both queries walk the same precedence order: memtable first, then each
//! level in increasing index, newest component first within a level. The
//! first hit wins — a tombstone at any layer shadows every older version of
//! the same key.

use std::collections::BTreeMap;

use config::TOMBSTONE;

use crate::{Engine, Error, Result};

impl Engine {
    /// Looks up `key`, returning `Some(value)` if a live (non-tombstoned)
    /// record is found anywhere in the table, `None` if the key is absent
    /// or its freshest record is a tombstone.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        if let Some(raw) = self.memtable.lock().get_raw(key) {
            return Ok(live_value(raw));
        }

        for level in self.levels.read().iter() {
            let components = level.components.lock();
            for component in components.iter() {
                match component.get(key).map_err(|e| Error::component(component.path(), e))? {
                    Some(value) => return Ok(live_value(&value)),
                    None => continue,
                }
            }
        }

        Ok(None)
    }

    /// Returns every live, non-tombstoned `(key, value)` pair with
    /// `start <= key <= end`, sorted ascending by key.
    ///
    /// Sources are visited in the same precedence order as `get`, and the
    /// *first* occurrence of each key is kept — first meaning freshest,
    /// because sources are visited newest-to-oldest.
    pub fn range(&self, start: &str, end: &str) -> Result<Vec<(String, String)>> {
        let mut seen: BTreeMap<String, String> = BTreeMap::new();

        for (key, value) in self.memtable.lock().range(start, end) {
            seen.entry(key).or_insert(value);
        }

        for level in self.levels.read().iter() {
            let components = level.components.lock();
            for component in components.iter() {
                let hits = component
                    .range(start, end)
                    .map_err(|e| Error::component(component.path(), e))?;
                for (key, value) in hits {
                    seen.entry(key).or_insert(value);
                }
            }
        }

        Ok(seen
            .into_iter()
            .filter(|(_, value)| value != TOMBSTONE)
            .collect())
    }
}

/// Interprets a raw stored value: `None` if it's the tombstone marker,
/// `Some(value.to_string())` otherwise.
fn live_value(raw: &str) -> Option<String> {
    if raw == TOMBSTONE {
        None
    } else {
        Some(raw.to_string())
    }
}
