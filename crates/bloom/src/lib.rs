//! # Bloom filter
//!
//! A space-efficient probabilistic set used to skip SSTables during point
//! lookups. The filter can say with certainty that a key is **not** present
//! (no false negatives) but may occasionally claim presence for a key that
//! was never added (false positives).
//!
//! Each SSTable embeds one filter built from its key set, sized at
//! [`BLOOM_BITS_PER_KEY`] bits per key with [`BLOOM_NUM_HASHES`] probes per
//! key, which keeps the false positive rate around 1%. Probes use double
//! hashing, `idx_i = (h1 + i * h2) mod nbits`, with `h1` and `h2` drawn from
//! the engine's two content-hash contracts.
//!
//! An empty filter (zero bits) is the disabled state: tables with no entries
//! serialize `nbits = 0`, and readers treat such a filter as passing every
//! key through.

use common::checksum::{hash32, hash64};
use common::constants::{BLOOM_BITS_PER_KEY, BLOOM_NUM_HASHES};

/// Bit-vector bloom filter with double-hash probing.
#[derive(Debug, Clone, Default)]
pub struct BloomFilter {
    bits: Vec<bool>,
}

impl BloomFilter {
    /// An empty, disabled filter. [`contains`](Self::contains) answers `true`
    /// for every key.
    pub fn new() -> Self {
        Self { bits: Vec::new() }
    }

    /// A cleared filter sized for `num_keys` insertions
    /// ([`BLOOM_BITS_PER_KEY`] bits each). Zero keys yields the disabled
    /// filter.
    pub fn with_capacity(num_keys: usize) -> Self {
        Self {
            bits: vec![false; num_keys * BLOOM_BITS_PER_KEY],
        }
    }

    /// Reconstructs a filter from a deserialized bit vector.
    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// Sets the probe positions for `key`. No-op on a disabled filter.
    pub fn add(&mut self, key: &[u8]) {
        let nbits = self.bits.len() as u64;
        if nbits == 0 {
            return;
        }
        let (h1, h2) = probe_hashes(key);
        for i in 0..BLOOM_NUM_HASHES as u64 {
            let idx = h1.wrapping_add(i.wrapping_mul(h2)) % nbits;
            self.bits[idx as usize] = true;
        }
    }

    /// `true` if `key` **might** have been added, `false` if it definitely
    /// was not. A disabled filter always answers `true`.
    #[must_use]
    pub fn contains(&self, key: &[u8]) -> bool {
        let nbits = self.bits.len() as u64;
        if nbits == 0 {
            return true;
        }
        let (h1, h2) = probe_hashes(key);
        (0..BLOOM_NUM_HASHES as u64).all(|i| {
            let idx = h1.wrapping_add(i.wrapping_mul(h2)) % nbits;
            self.bits[idx as usize]
        })
    }

    /// The raw bit vector, for serialization.
    #[must_use]
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// `true` when the filter is disabled (zero bits).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
}

fn probe_hashes(key: &[u8]) -> (u64, u64) {
    (hash64(key), hash32(key) as u64)
}
