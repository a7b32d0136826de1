//! Engine-wide constants. These values are baked into the on-disk format and
//! the flush/compaction behavior; changing them invalidates existing files.

/// MemTable byte-size threshold (key + value bytes) that triggers a flush.
pub const MEMTABLE_FLUSH_THRESHOLD: usize = 1 << 12;

/// Number of live SSTables that triggers a pairwise compaction pass.
pub const COMPACTION_TRIGGER: usize = 12;

/// One sparse-index anchor is recorded every this many DATA entries.
///
/// Shared by flush and compaction: a point lookup that seeks to an anchor
/// never scans more than this many records.
pub const INDEX_STRIDE: usize = 16;

/// Bloom filter bits allocated per key.
pub const BLOOM_BITS_PER_KEY: usize = 10;

/// Bloom filter hash probes per key. At 10 bits/key this keeps the false
/// positive rate around 1%.
pub const BLOOM_NUM_HASHES: usize = 7;

/// Sentinel closing every SSTable footer.
pub const SSTABLE_MAGIC: u64 = 0xDEAD_BEEF;
