//! # Disk Component
//!
//! Immutable, on-disk storage files for the RiptideKV storage engine.
//!
//! When the in-memory [`memtable::Memtable`] reaches its capacity the engine
//! flushes it to disk as a new component; merges combine a level's worth of
//! components into one. Components are *write-once, read-many* — once
//! created they are never modified, only replaced wholesale during a merge.
//!
//! ## File layout
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ header (8 bytes): num_keys, bloom_size   │
//! ├──────────────────────────────────────────┤
//! │ offset table (num_keys * 8 bytes)        │
//! ├──────────────────────────────────────────┤
//! │ payload: key_len | key | value_len | val │
//! ├──────────────────────────────────────────┤
//! │ bloom trailer: m, k, seeds, bits         │
//! └──────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. See [`format`] for the exact byte
//! layout and [`reader::DiskComponent`] for the read path.

mod format;
mod merge;
mod reader;
mod writer;

pub use format::Header;
pub use merge::MergeIterator;
pub use reader::DiskComponent;
pub use writer::ComponentWriter;

#[cfg(test)]
mod tests;
