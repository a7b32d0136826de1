//! Content hashes for record integrity and bloom probing.
//!
//! Both functions are pure and deterministic across processes and versions:
//! the WAL and SSTable formats store `hash32` outputs, and bloom filter bit
//! positions are derived from both, so neither implementation can change
//! without invalidating existing files.

/// 32-bit content hash (CRC32). Used as the per-record integrity checksum in
/// the WAL and in SSTable DATA entries, and as the second bloom probe hash.
pub fn hash32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// 64-bit content hash (XXH3). Used as the first bloom probe hash.
pub fn hash64(data: &[u8]) -> u64 {
    xxhash_rust::xxh3::xxh3_64(data)
}
