use anyhow::Result;
use bloom::BloomFilter;
use byteorder::{LittleEndian, WriteBytesExt};
use std::fs::{rename, OpenOptions};
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use crate::format::{write_record, Header};

/// Default bloom filter false positive rate (1%).
const BLOOM_FPR: f64 = 0.01;

/// Writes an ordered stream of `(key, value)` pairs to disk as a new,
/// immutable component file.
///
/// The write is crash-safe: data is written to a temporary file, fsynced,
/// then atomically renamed to the final path. If the process crashes
/// mid-write the partially written temp file is left behind and ignored on
/// recovery — the final path never shows a truncated component.
pub struct ComponentWriter {}

impl ComponentWriter {
    /// Writes `entries` (already sorted ascending by key, deduplicated) to a
    /// new component file at `path`.
    ///
    /// Returns `Ok(false)` without creating a file if `entries` is empty —
    /// flush/merge skip writing a component when there is nothing to write.
    pub fn write<I>(path: &Path, entries: I) -> Result<bool>
    where
        I: ExactSizeIterator<Item = (String, String)>,
    {
        let num_keys = entries.len();
        if num_keys == 0 {
            return Ok(false);
        }

        let tmp_path = path.with_extension("dat.tmp");
        let raw_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        let mut file = BufWriter::new(raw_file);

        let bloom = BloomFilter::new(num_keys, BLOOM_FPR);

        // Reserve space for header + offset table; the offsets aren't known
        // until the payload is written, so backfill them after the fact.
        file.write_u32::<LittleEndian>(num_keys as u32)?;
        file.write_u32::<LittleEndian>(0)?; // bloom_size, backfilled below
        for _ in 0..num_keys {
            file.write_u64::<LittleEndian>(0)?; // offset placeholder
        }

        let mut offsets = Vec::with_capacity(num_keys);
        for (key, value) in entries {
            let offset = file.stream_position()?;
            offsets.push(offset);
            write_record(&mut file, &key, &value)?;
            bloom.add(key.as_bytes());
        }

        let bloom_trailer_offset = file.stream_position()?;
        bloom.write_to(&mut file)?;
        let bloom_size = file.stream_position()? - bloom_trailer_offset;

        // Backfill the header's bloom_size and the offset table now that
        // both are known.
        file.seek(std::io::SeekFrom::Start(4))?;
        file.write_u32::<LittleEndian>(bloom_size as u32)?;
        file.seek(std::io::SeekFrom::Start(Header::SIZE_BYTES))?;
        for offset in &offsets {
            file.write_u64::<LittleEndian>(*offset)?;
        }

        file.flush()?;
        file.into_inner()?.sync_all()?;

        rename(&tmp_path, path)?;

        if let Some(parent) = path.parent() {
            if let Ok(dir) = std::fs::File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        Ok(true)
    }
}
