//! In-memory sorted table at the top of the LSM tree.
//!
//! All writes land here first (after the WAL append). Keys iterate in
//! lexicographic order, which is exactly the order a flush streams them into
//! an SSTable. The table tracks the summed byte size of its keys and values;
//! once that passes the flush threshold the engine persists it and resets it.
//!
//! Not internally synchronized — the engine mutates it only under exclusive
//! access.

use std::collections::BTreeMap;
use std::path::Path;

use bloom::BloomFilter;
use common::constants::{INDEX_STRIDE, MEMTABLE_FLUSH_THRESHOLD};
use common::StorageError;
use sstable::{Footer, Header, SsTable};
use wal::WalReader;

#[derive(Debug)]
pub struct MemTable {
    map: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Sum of key and value byte lengths over all entries.
    size: usize,
    flush_threshold: usize,
}

impl MemTable {
    pub fn new() -> Self {
        Self::with_threshold(MEMTABLE_FLUSH_THRESHOLD)
    }

    /// A table with a non-default flush threshold (tuning and tests).
    pub fn with_threshold(flush_threshold: usize) -> Self {
        Self {
            map: BTreeMap::new(),
            size: 0,
            flush_threshold,
        }
    }

    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.map.get(key).map(Vec::as_slice)
    }

    /// Inserts or overwrites. On overwrite only the value-length delta is
    /// accounted; a fresh key adds both key and value lengths.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        match self.map.get(&key) {
            Some(old) => {
                assert!(self.size >= old.len());
                self.size -= old.len();
                self.size += value.len();
            }
            None => {
                self.size += key.len() + value.len();
            }
        }
        self.map.insert(key, value);
    }

    /// `true` once the byte size exceeds the flush threshold.
    #[must_use]
    pub fn should_flush(&self) -> bool {
        self.size > self.flush_threshold
    }

    /// Empties the map and resets the size counter.
    pub fn clear(&mut self) {
        self.map.clear();
        self.size = 0;
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Rebuilds the table from a WAL, applying records oldest-first so the
    /// final state matches the pre-crash one. Missing file means a fresh
    /// start.
    pub fn restore_from_wal(&mut self, wal_path: &Path) -> Result<(), StorageError> {
        if !wal_path.exists() {
            return Ok(());
        }
        let mut reader = WalReader::open(wal_path)?;
        reader.replay(|key, value| self.put(key, value))
    }

    /// Streams the table into `sst` as a complete file: header, bloom filter
    /// over the key set, DATA in ascending key order with a sparse-index
    /// anchor every [`INDEX_STRIDE`] entries, then index and footer.
    ///
    /// An empty table still produces a valid file: empty key range, disabled
    /// bloom, no DATA, no index.
    pub fn flush_to_sstable(&self, sst: &mut SsTable) -> Result<(), StorageError> {
        let (min_key, max_key) = match (self.map.keys().next(), self.map.keys().next_back()) {
            (Some(min), Some(max)) => (min.clone(), max.clone()),
            _ => (Vec::new(), Vec::new()),
        };
        let mut offset = sst.write_header(Header::new(min_key, max_key))?;

        let mut filter = BloomFilter::with_capacity(self.map.len());
        for key in self.map.keys() {
            filter.add(key);
        }
        offset += sst.write_bloom(filter)?;

        for (i, (key, value)) in self.map.iter().enumerate() {
            if i % INDEX_STRIDE == 0 {
                sst.push_index(key.clone(), offset);
            }
            offset += sst.write_entry(key, value)?;
        }

        let index_offset = offset;
        let index_size = sst.write_index()?;
        let num_index_entries = sst.index().len() as u64;
        sst.write_footer(Footer::new(index_offset, index_size, num_index_entries))
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}
