use anyhow::{bail, Result};
use bloom::BloomFilter;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::format::{read_record, Header};

/// Maximum key/value size we'll allocate while reading (16 MiB). Guards
/// against OOM on a corrupt file rather than any real protocol limit.
const MAX_FIELD_BYTES: u32 = 16 * 1024 * 1024;

/// An immutable on-disk component: a sorted run of key/value records plus a
/// bloom filter, backing point lookups and range scans for one piece of a
/// level.
///
/// Unlike an in-memory index, `get` performs a literal binary search over
/// the file's offset table, seeking and reading each probed record. This
/// keeps the reader's memory footprint at O(1) in the number of keys (aside
/// from the bloom filter and a small `Vec<u64>` of offsets), trading a few
/// extra seeks for it.
pub struct DiskComponent {
    path: PathBuf,
    offsets: Vec<u64>,
    bloom: BloomFilter,
    file: Mutex<BufReader<File>>,
}

impl DiskComponent {
    /// Opens a component file, loading its offset table and bloom filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is too small, the header's `num_keys`
    /// does not agree with the offset table, or the bloom trailer cannot be
    /// parsed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        let mut f = File::open(&path_buf)?;
        let filesize = f.metadata()?.len();

        if filesize < 8 {
            bail!("component file too small for header: {:?}", path_buf);
        }

        f.seek(SeekFrom::Start(0))?;
        let header = Header::read_from(&mut f)?;

        let offsets_end = Header::SIZE_BYTES + header.num_keys as u64 * 8;
        if offsets_end > filesize {
            bail!("component offset table runs past end of file: {:?}", path_buf);
        }

        let bloom_start = filesize
            .checked_sub(header.bloom_size as u64)
            .ok_or_else(|| anyhow::anyhow!("bloom_size exceeds file size: {:?}", path_buf))?;
        if bloom_start < offsets_end {
            bail!("bloom trailer overlaps payload: {:?}", path_buf);
        }

        let mut offsets = Vec::with_capacity(header.num_keys as usize);
        for _ in 0..header.num_keys {
            let mut buf = [0u8; 8];
            f.read_exact(&mut buf)?;
            offsets.push(u64::from_le_bytes(buf));
        }

        f.seek(SeekFrom::Start(bloom_start))?;
        let bloom = BloomFilter::read_from(&mut f)?;

        f.seek(SeekFrom::Start(0))?;

        Ok(Self {
            path: path_buf,
            offsets,
            bloom,
            file: Mutex::new(BufReader::new(f)),
        })
    }

    /// Returns the path this component was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bloom-gated binary search for `key` over the offset table.
    ///
    /// Returns `Ok(Some(value))` if present (the value may be the tombstone
    /// marker), `Ok(None)` if definitely absent.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        if !self.bloom.contains(key.as_bytes()) {
            return Ok(None);
        }

        let mut file = self
            .file
            .lock()
            .map_err(|e| anyhow::anyhow!("lock poisoned: {e}"))?;

        let mut lo = 0usize;
        let mut hi = self.offsets.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let (found_key, found_value) = Self::read_at(&mut file, self.offsets[mid])?;
            match found_key.as_str().cmp(key) {
                std::cmp::Ordering::Equal => return Ok(Some(found_value)),
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
            }
        }
        Ok(None)
    }

    /// Full linear scan, collecting every record with `start <= key <= end`.
    pub fn range(&self, start: &str, end: &str) -> Result<Vec<(String, String)>> {
        let mut file = self
            .file
            .lock()
            .map_err(|e| anyhow::anyhow!("lock poisoned: {e}"))?;

        let mut out = Vec::new();
        for &offset in &self.offsets {
            let (key, value) = Self::read_at(&mut file, offset)?;
            if key.as_str() >= start && key.as_str() <= end {
                out.push((key, value));
            }
        }
        Ok(out)
    }

    /// Yields every record in stored (ascending key) order.
    pub fn iter_items(&self) -> Result<Vec<(String, String)>> {
        let mut file = self
            .file
            .lock()
            .map_err(|e| anyhow::anyhow!("lock poisoned: {e}"))?;

        self.offsets
            .iter()
            .map(|&offset| Self::read_at(&mut file, offset))
            .collect()
    }

    /// Returns the number of keys in this component.
    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    fn read_at(file: &mut BufReader<File>, offset: u64) -> Result<(String, String)> {
        file.seek(SeekFrom::Start(offset))?;
        Ok(read_record(file, MAX_FIELD_BYTES)?)
    }
}
