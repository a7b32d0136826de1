//! Read path: point lookups under shared access.
//!
//! Order of probing is recency order — memtable first, then the live tables
//! newest to oldest, stopping at the first hit. That gives read-your-writes
//! across flushes and across compacted tables without version tags on
//! entries.

use std::time::Instant;

use common::StorageError;

use crate::{Engine, State};

impl Engine {
    /// Looks up `key`, returning its most recent value.
    ///
    /// Multiple `get`s run concurrently; none overlaps a `put`. Never
    /// mutates durable state.
    ///
    /// # Errors
    ///
    /// A failed SSTable read (I/O error or checksum mismatch) is returned to
    /// the caller rather than treated as a miss, so corruption stays visible.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let start = Instant::now();
        let result = {
            let state = self.state.read();
            state.lookup(key)
        };
        self.stats.record_get(start.elapsed().as_micros() as u64);
        result
    }
}

impl State {
    fn lookup(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        if let Some(value) = self.memtable.get(key) {
            return Ok(Some(value.to_vec()));
        }
        for table in self.tables.iter().rev() {
            if let Some(value) = table.get(key)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}
