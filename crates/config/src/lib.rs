//! # Config
//!
//! Configuration for an LSM table, sourced from explicit values or
//! environment variables with documented defaults. Shared by the `engine`
//! crate (as the constructor argument) and the `cli` crate (as the source
//! of its REPL startup settings).

use std::path::PathBuf;

/// Default level fanout: a level merges into the next once it holds more
/// than this many components.
pub const DEFAULT_FANOUT: usize = 10;

/// Default memtable capacity: flush is triggered once the memtable holds
/// this many entries.
pub const DEFAULT_MEMTABLE_CAPACITY: usize = 1000;

/// Target false-positive rate for every component's bloom filter.
pub const BLOOM_FALSE_POSITIVE_RATE: f64 = 0.01;

/// Reserved value marking a deleted key; re-exported here so callers that
/// only depend on `config` can still name it.
pub const TOMBSTONE: &str = memtable::TOMBSTONE;

/// Table configuration: where it lives on disk and the thresholds that
/// drive flush and merge.
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Filesystem root containing `level0/`, `level1/`, ...
    pub directory: PathBuf,
    /// Level fanout `R`: max components per level before merge.
    pub fanout: usize,
    /// Memtable capacity `L`: entry count that triggers a flush.
    pub memtable_capacity: usize,
}

impl TableConfig {
    /// Builds a config with the given directory and default thresholds.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            fanout: DEFAULT_FANOUT,
            memtable_capacity: DEFAULT_MEMTABLE_CAPACITY,
        }
    }

    /// Builds a config from environment variables, falling back to
    /// defaults for anything unset or unparsable:
    ///
    /// ```text
    /// RIPTIDE_LSM_DIR   table root directory      (default: "data/lsm")
    /// RIPTIDE_LSM_R     level fanout              (default: 10)
    /// RIPTIDE_LSM_L     memtable capacity         (default: 1000)
    /// ```
    pub fn from_env() -> Self {
        let directory = env_or("RIPTIDE_LSM_DIR", "data/lsm");
        let fanout = env_or("RIPTIDE_LSM_R", &DEFAULT_FANOUT.to_string())
            .parse()
            .unwrap_or(DEFAULT_FANOUT);
        let memtable_capacity = env_or("RIPTIDE_LSM_L", &DEFAULT_MEMTABLE_CAPACITY.to_string())
            .parse()
            .unwrap_or(DEFAULT_MEMTABLE_CAPACITY);

        Self {
            directory: PathBuf::from(directory),
            fanout,
            memtable_capacity,
        }
    }

    pub fn with_fanout(mut self, fanout: usize) -> Self {
        self.fanout = fanout;
        self
    }

    pub fn with_memtable_capacity(mut self, capacity: usize) -> Self {
        self.memtable_capacity = capacity;
        self
    }
}

/// Reads a configuration value from the environment, falling back to
/// `default`.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
