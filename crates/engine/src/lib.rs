//! # Engine — RiptideKV LSM Storage Engine
//!
//! The central orchestrator tying together the [`memtable`] write buffer and
//! the [`sstable`] crate's on-disk components into a complete ordered
//! key-value store.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   |
//!   v
//! ┌────────────────────────────────────────────────┐
//! │                     ENGINE                      │
//! │                                                 │
//! │ insert/delete → Memtable                        │
//! │                   |                             │
//! │                   | (len >= L?)                │
//! │                   v                             │
//! │                flush() → new level0 component   │
//! │                   |                             │
//! │                   | (|level N| > R?)            │
//! │                   v                             │
//! │                merge() → level N+1, cascading   │
//! │                                                 │
//! │ get/range → Memtable → level0 → level1 → ...    │
//! │              (newest match wins)                │
//! └────────────────────────────────────────────────┘
//! ```
//!
//! ## Module responsibilities
//!
//! | Module       | Purpose                                               |
//! |--------------|--------------------------------------------------------|
//! | [`lib.rs`]   | `Engine` struct, constructor, `Level`, accessors       |
//! | [`error`]    | Typed `Error` (`InvalidValue`, `Io`, `Corruption`)     |
//! | [`recovery`] | Directory-driven startup: load every `level<N>` dir    |
//! | [`write`]    | `insert`, `delete`, `flush`                            |
//! | [`read`]     | `get`, `range`                                         |
//! | [`compaction`] | Cascading per-level merge                            |
//!
//! ## Durability
//!
//! There is no write-ahead log: flush and merge are the only durability
//! events, and both write through a temp-file-then-rename sequence so a
//! crash mid-write never leaves a visible truncated component. See
//! `DESIGN.md` for the reasoning.

mod compaction;
pub mod error;
mod read;
mod recovery;
mod write;

pub use error::{Error, Result};

use config::TableConfig;
use memtable::Memtable;
use parking_lot::{Mutex, RwLock};
use sstable::DiskComponent;
use std::path::PathBuf;
use std::sync::Arc;

/// One level of the tree: an ordered (newest-first) list of disk
/// components, each on disk under `<root>/level<index>/`.
pub struct Level {
    pub index: usize,
    pub dir: PathBuf,
    pub components: Mutex<Vec<Arc<DiskComponent>>>,
}

impl Level {
    fn new(index: usize, dir: PathBuf, components: Vec<Arc<DiskComponent>>) -> Self {
        Self {
            index,
            dir,
            components: Mutex::new(components),
        }
    }
}

/// The central LSM table: owns the memtable and the per-level component
/// lists, and orchestrates flush, merge, and reads across them.
///
/// One mutex guards the memtable. A `RwLock` guards the level *list* itself
/// (only taken briefly, to grow it when a merge needs a new level); each
/// individual level has its own mutex, held for the duration of a merge
/// into it and for the duration of a reader's scan of its components.
pub struct Engine {
    memtable: Mutex<Memtable>,
    levels: RwLock<Vec<Arc<Level>>>,
    directory: PathBuf,
    fanout: usize,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let levels = self.levels.read();
        f.debug_struct("Engine")
            .field("directory", &self.directory)
            .field("fanout", &self.fanout)
            .field("memtable_len", &self.memtable.lock().len())
            .field(
                "level_sizes",
                &levels
                    .iter()
                    .map(|l| l.components.lock().len())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Engine {
    /// Opens (or creates) a table at `config.directory`, loading every
    /// `level<N>` directory found on disk. See [`recovery`] for the
    /// directory-driven startup algorithm.
    pub fn open(config: &TableConfig) -> Result<Self> {
        let directory = config.directory.clone();
        std::fs::create_dir_all(&directory)
            .map_err(|e| Error::io(&directory, e))?;

        let levels = recovery::load_levels(&directory)?;

        Ok(Self {
            memtable: Mutex::new(Memtable::new(config.memtable_capacity)),
            levels: RwLock::new(levels),
            directory,
            fanout: config.fanout,
        })
    }

    /// Closes the table, dropping every open component file handle.
    ///
    /// Any data still buffered in the memtable at close time is lost — the
    /// caller should `flush()` first if that data must survive. This
    /// mirrors the engine's no-WAL durability model: only flush and merge
    /// are durability events.
    pub fn close(self) {
        // Dropping `self` releases every `Arc<DiskComponent>` (and thus
        // every open file handle) once the last reference goes away.
    }

    /// Returns the table's root directory.
    #[must_use]
    pub fn directory(&self) -> &std::path::Path {
        &self.directory
    }

    /// Returns the configured level fanout `R`.
    #[must_use]
    pub fn fanout(&self) -> usize {
        self.fanout
    }

    /// Returns the number of entries currently buffered in the memtable.
    #[must_use]
    pub fn memtable_len(&self) -> usize {
        self.memtable.lock().len()
    }

    /// Returns the number of components at each level, outermost (level 0)
    /// first. Intended for the `STATS` CLI command and tests.
    #[must_use]
    pub fn level_sizes(&self) -> Vec<usize> {
        self.levels
            .read()
            .iter()
            .map(|l| l.components.lock().len())
            .collect()
    }

    /// Returns the `Arc<Level>` for `index`, creating it (and its on-disk
    /// directory) if it doesn't exist yet.
    ///
    /// Takes the level-list's `RwLock` briefly: a read lock first (the
    /// common case, once the level already exists), escalating to a write
    /// lock only to push a newly created level.
    fn level(&self, index: usize) -> Result<Arc<Level>> {
        if let Some(level) = self.levels.read().get(index) {
            return Ok(Arc::clone(level));
        }

        let mut levels = self.levels.write();
        while levels.len() <= index {
            let i = levels.len();
            let dir = self.directory.join(format!("level{i}"));
            std::fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
            levels.push(Arc::new(Level::new(i, dir, Vec::new())));
        }
        Ok(Arc::clone(&levels[index]))
    }
}

#[cfg(test)]
mod tests;
