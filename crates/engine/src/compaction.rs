//! Cascading per-level merge (compaction).
//!
//! After a flush (or a merge one level down) adds a component to level `N`,
//! `check_overflow` merges level `N` into `N+1` while it still holds more
//! than `R` components, then recurses upward. A merge holds both level
//! `N`'s and level `N+1`'s `components` locks at once — never the other
//! way around, so two concurrent merges can't deadlock against each other —
//! and never holds a level's `components` lock while acquiring the
//! top-level `levels` `RwLock`: level `N+1` is materialized (creating it, if
//! this is the first merge to reach that depth) *before* level `N`'s lock is
//! taken, so a reader holding `levels.read()` while waiting on a level mutex
//! can never be blocked behind a merge that is itself waiting on
//! `levels.write()`.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

use config::TOMBSTONE;
use sstable::{ComponentWriter, DiskComponent, MergeIterator};
use tracing::info;

use crate::{Engine, Error, Level, Result};

impl Engine {
    /// While `level[index]` holds more than `fanout` components, merges it
    /// into `level[index + 1]` and checks the next level for overflow.
    pub(crate) fn check_overflow(&self, mut index: usize) -> Result<()> {
        loop {
            let level = self.level(index)?;
            let needs_merge = level.components.lock().len() > self.fanout();
            if !needs_merge {
                return Ok(());
            }
            self.merge_level(&level)?;
            index += 1;
        }
    }

    /// Merges every component currently in `level` into a single new
    /// component prepended to `level.index + 1`, then empties `level`.
    ///
    /// `level.index + 1` is materialized first — which may briefly take the
    /// top-level `levels` `RwLock` in write mode if this is the first merge
    /// to reach that depth — strictly *before* either level's `components`
    /// mutex is taken. A reader only ever holds `levels.read()` while
    /// acquiring a level's `components` lock, never the other way around,
    /// so this ordering rules out the deadlock where a merge waits on
    /// `levels.write()` while holding a level mutex a reader is blocked on.
    fn merge_level(&self, level: &Arc<Level>) -> Result<()> {
        let next = self.level(level.index + 1)?;

        let mut components = level.components.lock();
        if components.is_empty() {
            return Ok(());
        }

        let mut merge =
            MergeIterator::new(&components).map_err(|e| Error::component(&level.dir, e))?;
        let merged: Vec<(String, String)> = merge.collect_all();
        drop(merge);

        let mut next_components = next.components.lock();

        let comp_id = crate::write::next_component_id(&next.dir)?;
        let path = next.dir.join(format!("comp_{comp_id}.dat"));
        let entry_count = merged.len();
        let tombstones = merged.iter().filter(|(_, v)| v == TOMBSTONE).count();

        // entries is already sorted/deduplicated by the merge iterator.
        ComponentWriter::write(&path, merged.into_iter())
            .map_err(|e| Error::component(&path, e))?;

        let input_paths: Vec<PathBuf> =
            components.iter().map(|c: &Arc<DiskComponent>| c.path().to_path_buf()).collect();

        let new_component =
            DiskComponent::open(&path).map_err(|e| Error::component(&path, e))?;

        // Close and unlink one input at a time, oldest-processed-first. The
        // handle for each component is dropped immediately before its own
        // file is unlinked (required on platforms that forbid deleting a
        // file with an open handle), but components not yet reached are put
        // back into `level`'s list if a later removal fails, rather than the
        // whole level silently going empty on a partial failure.
        let mut remaining: VecDeque<Arc<DiskComponent>> =
            std::mem::take(&mut *components).into();
        for input_path in &input_paths {
            let component = remaining.pop_front().expect("one component per input path");
            drop(component);
            if let Err(e) = std::fs::remove_file(input_path) {
                *components = remaining.into();
                return Err(Error::io(input_path, e));
            }
        }

        next_components.insert(0, Arc::new(new_component));

        info!(
            from_level = level.index,
            to_level = next.index,
            inputs = input_paths.len(),
            entries = entry_count,
            tombstones,
            comp_id,
            "merged level"
        );

        Ok(())
    }
}
