///! # Bloom Filter
///!
///! A space-efficient probabilistic data structure for set membership testing.
///!
///! A bloom filter can tell you with certainty that a key is **not** in the set
///! (no false negatives), but may occasionally report that a key **is** in the
///! set when it isn't (false positives). The false positive rate depends on the
///! number of bits and hash functions used.
///!
///! ## Usage in RiptideKV
///!
///! Each disk component embeds a bloom filter built from its keys. During point
///! lookups the engine checks the bloom filter first -- if it says "not
///! present", the component is skipped entirely, avoiding a binary search and
///! the disk seeks that come with it.
///!
///! ## Example
///!
///! ```rust,no_run
///! use bloom::BloomFilter;
///!
///! let mut bf = BloomFilter::new(1000, 0.01);
///! bf.add(b"hello");
///! assert!(bf.contains(b"hello"));
///! ```
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicU8, Ordering};

use blake2::Blake2bMac;
use digest::{consts::U8, Mac};

/// Seed stride used to derive deterministic hash seeds: `seeds[i] = i * SEED_STRIDE + SEED_OFFSET`.
const SEED_STRIDE: u64 = 179179;
const SEED_OFFSET: u64 = 179;

/// A bloom filter backed by an atomic bit array with `k` independent keyed hashes.
///
/// Each hash is a keyed BLAKE2b digest (8-byte output) with the seed's little-endian
/// bytes as the MAC key, taken modulo the bit count to select a position. Bits are
/// stored as `AtomicU8` so `add` (`fetch_or`) never races with a concurrent `contains`
/// (`load`): since `add` only ever turns bits on, any interleaving still satisfies the
/// no-false-negative invariant.
pub struct BloomFilter {
    bits: Vec<AtomicU8>,
    num_bits: u64,
    num_hashes: u32,
    seeds: Vec<u64>,
}

impl BloomFilter {
    /// Creates a new bloom filter sized for `expected_items` with the given
    /// target `false_positive_rate`, using the deterministic seed sequence.
    ///
    /// # Panics
    ///
    /// Panics if `expected_items` is 0 or `false_positive_rate` is not in `(0, 1)`.
    pub fn new(expected_items: usize, false_positive_rate: f64) -> Self {
        assert!(expected_items > 0, "expected_items must be > 0");
        assert!(
            false_positive_rate > 0.0 && false_positive_rate < 1.0,
            "false_positive_rate must be in (0, 1)"
        );

        let n = expected_items as f64;
        // m = ceil(-n * ln(p) / ln(2)^2)
        let m = (-n * false_positive_rate.ln() / std::f64::consts::LN_2.powi(2)).ceil() as u64;
        let m = m.max(8);

        // k = floor(m/n * ln(2)) + 1
        let k = ((m as f64 / n) * std::f64::consts::LN_2).floor() as u32 + 1;

        let seeds = default_seeds(k);
        Self::with_seeds(m, seeds)
    }

    /// Builds a filter with explicit bit count and seed list (used by `merge`
    /// compatibility checks and deserialization).
    fn with_seeds(num_bits: u64, seeds: Vec<u64>) -> Self {
        let byte_len = ((num_bits + 7) / 8) as usize;
        let bits = (0..byte_len).map(|_| AtomicU8::new(0)).collect();
        Self {
            bits,
            num_bits,
            num_hashes: seeds.len() as u32,
            seeds,
        }
    }

    /// Adds a key to the filter.
    pub fn add(&self, key: &[u8]) {
        for &seed in &self.seeds {
            let idx = self.bit_index(seed, key);
            self.set_bit(idx);
        }
    }

    /// Returns `true` if the key **might** be in the set, `false` if it is
    /// **definitely not** in the set.
    #[must_use]
    pub fn contains(&self, key: &[u8]) -> bool {
        self.seeds
            .iter()
            .all(|&seed| self.get_bit(self.bit_index(seed, key)))
    }

    /// Returns the number of bits in the filter (`m`).
    #[must_use]
    pub fn num_bits(&self) -> u64 {
        self.num_bits
    }

    /// Returns the number of hash functions (`k`).
    #[must_use]
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Returns the deterministic seed list.
    #[must_use]
    pub fn seeds(&self) -> &[u64] {
        &self.seeds
    }

    /// Returns the size of the serialized trailer in bytes: `m`, `k`, seeds, bits.
    #[must_use]
    pub fn serialized_size(&self) -> usize {
        4 + 4 + 8 * self.seeds.len() + self.bits.len()
    }

    /// Merges `other` into `self` by OR-ing their bit arrays in place.
    ///
    /// Both filters must share the same `(m, k, seeds)`; otherwise the merge
    /// would silently produce a filter that no longer matches its own hash
    /// parameters.
    pub fn merge(&self, other: &BloomFilter) -> Result<(), MergeError> {
        if self.num_bits != other.num_bits || self.seeds != other.seeds {
            return Err(MergeError::Incompatible);
        }
        for (mine, theirs) in self.bits.iter().zip(other.bits.iter()) {
            let theirs = theirs.load(Ordering::Relaxed);
            if theirs != 0 {
                mine.fetch_or(theirs, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Serializes the trailer per the on-disk component format:
    /// `[bloom_m: u32][bloom_k: u32][seeds: u64 * k][bits]`.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&(self.num_bits as u32).to_le_bytes())?;
        w.write_all(&self.num_hashes.to_le_bytes())?;
        for &seed in &self.seeds {
            w.write_all(&seed.to_le_bytes())?;
        }
        for byte in &self.bits {
            w.write_all(&[byte.load(Ordering::Relaxed)])?;
        }
        Ok(())
    }

    /// Deserializes a trailer written by [`write_to`](Self::write_to).
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf4 = [0u8; 4];
        let mut buf8 = [0u8; 8];

        r.read_exact(&mut buf4)?;
        let m = u32::from_le_bytes(buf4) as u64;

        r.read_exact(&mut buf4)?;
        let k = u32::from_le_bytes(buf4);

        const MAX_HASHES: u32 = 64;
        if k == 0 || k > MAX_HASHES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("implausible bloom hash count: {k}"),
            ));
        }

        let mut seeds = Vec::with_capacity(k as usize);
        for _ in 0..k {
            r.read_exact(&mut buf8)?;
            seeds.push(u64::from_le_bytes(buf8));
        }

        const MAX_BLOOM_BYTES: u64 = 128 * 1024 * 1024;
        let byte_len = (m + 7) / 8;
        if byte_len > MAX_BLOOM_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("bloom filter too large: {m} bits"),
            ));
        }

        let mut raw = vec![0u8; byte_len as usize];
        r.read_exact(&mut raw)?;
        let bits = raw.into_iter().map(AtomicU8::new).collect();

        Ok(Self {
            bits,
            num_bits: m,
            num_hashes: k,
            seeds,
        })
    }

    fn bit_index(&self, seed: u64, key: &[u8]) -> u64 {
        keyed_hash(seed, key) % self.num_bits
    }

    fn set_bit(&self, idx: u64) {
        let byte_idx = (idx / 8) as usize;
        let mask = 1u8 << (idx % 8) as u8;
        self.bits[byte_idx].fetch_or(mask, Ordering::Relaxed);
    }

    fn get_bit(&self, idx: u64) -> bool {
        let byte_idx = (idx / 8) as usize;
        let mask = 1u8 << (idx % 8) as u8;
        self.bits[byte_idx].load(Ordering::Relaxed) & mask != 0
    }
}

impl std::fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomFilter")
            .field("num_bits", &self.num_bits)
            .field("num_hashes", &self.num_hashes)
            .field("bytes", &self.bits.len())
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("bloom filters have incompatible parameters (m, k, or seeds differ)")]
    Incompatible,
}

/// `seeds[i] = i * 179179 + 179`, reproducing the deterministic seed sequence
/// so a deserialized filter's seeds never need to be stored separately from
/// its hash semantics being reconstructible.
fn default_seeds(k: u32) -> Vec<u64> {
    (0..k as u64).map(|i| i * SEED_STRIDE + SEED_OFFSET).collect()
}

/// Keyed BLAKE2b with an 8-byte digest, the seed's little-endian bytes as the
/// MAC key. Matches the original prototype's `hashlib.blake2b(key=seed, digest_size=8)`.
fn keyed_hash(seed: u64, key: &[u8]) -> u64 {
    let mut mac = Blake2bMac::<U8>::new_from_slice(&seed.to_le_bytes())
        .expect("8-byte key is always valid for Blake2bMac<U8>");
    mac.update(key);
    let digest = mac.finalize().into_bytes();
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&digest);
    u64::from_le_bytes(buf)
}

#[cfg(test)]
mod tests;
