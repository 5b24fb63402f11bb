//! Write path: `insert`, `delete`, and `flush`.
//!
//! A write only ever touches the memtable directly; flushing to a new
//! level-0 component and any resulting cascade of merges happen out of
//! line, triggered by the memtable crossing its capacity or by an explicit
//! `flush()` call.

use std::sync::Arc;

use config::TOMBSTONE;
use sstable::{ComponentWriter, DiskComponent};
use tracing::info;

use crate::{Engine, Error, Result};

impl Engine {
    /// Inserts or overwrites `key` with `value`.
    ///
    /// Fails with [`Error::InvalidValue`] if `value` is the reserved
    /// tombstone marker — a genuine value can never be stored under that
    /// sentinel. Triggers a flush if the memtable is now at capacity.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        if value == TOMBSTONE {
            return Err(Error::InvalidValue { marker: TOMBSTONE });
        }

        let should_flush = self.memtable.lock().put(key.into(), value);
        if should_flush {
            self.flush()?;
        }
        Ok(())
    }

    /// Logically deletes `key`. Equivalent to `insert(key, "<DELETED>")`,
    /// except the tombstone marker is written directly rather than through
    /// the `insert` validation path.
    pub fn delete(&self, key: impl Into<String>) -> Result<()> {
        let should_flush = self.memtable.lock().delete(key.into());
        if should_flush {
            self.flush()?;
        }
        Ok(())
    }

    /// Forces the current memtable to disk, even if under capacity.
    ///
    /// A no-op if the memtable is empty: no file is produced in that case.
    /// The drain and the snapshot it produces happen
    /// under the memtable's mutex, so the flush always reflects a
    /// consistent prefix of observed writes.
    pub fn flush(&self) -> Result<()> {
        let snapshot = self.memtable.lock().flush();
        if snapshot.is_empty() {
            return Ok(());
        }

        let level0 = self.level(0)?;
        let mut components = level0.components.lock();

        let comp_id = next_component_id(&level0.dir)?;
        let path = level0.dir.join(format!("comp_{comp_id}.dat"));
        let entries = snapshot.len();

        ComponentWriter::write(&path, snapshot.into_iter())
            .map_err(|e| Error::component(&path, e))?;
        let component =
            DiskComponent::open(&path).map_err(|e| Error::component(&path, e))?;

        components.insert(0, Arc::new(component));
        info!(comp_id, entries, "flushed memtable to level0");
        drop(components);

        self.check_overflow(0)
    }
}

/// Assigns the next component id within `dir` as the current count of
/// `.dat` files there — not required to be gap-free after merges.
pub(crate) fn next_component_id(dir: &std::path::Path) -> Result<u64> {
    let count = std::fs::read_dir(dir)
        .map_err(|e| Error::io(dir, e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map(|ext| ext == "dat").unwrap_or(false))
        .count();
    Ok(count as u64)
}
