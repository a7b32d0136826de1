//! Write path: `put()` and the memtable flush.
//!
//! Every mutation is appended to the WAL and fsynced before it touches the
//! memtable — a crash after the append replays the record on the next open,
//! a crash before it loses only the unacknowledged call. Flush ordering is
//! manifest entry, then table contents, then WAL truncation, then memtable
//! reset; a crash between the first two leaves a manifest entry pointing at
//! a partial file, which reopening detects.

use std::time::Instant;

use common::StorageError;
use sstable::SsTable;

use crate::{manifest, Engine, State};

impl Engine {
    /// Inserts or overwrites `key`. Durable on return; may flush the
    /// memtable and run a compaction pass before returning.
    ///
    /// # Errors
    ///
    /// Any I/O failure along the path — WAL append, flush, manifest update,
    /// compaction — is fatal to the call and surfaced unchanged. If the WAL
    /// append fails the memtable is untouched.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let start = Instant::now();
        {
            let mut state = self.state.write();
            state.wal.append(key, value)?;
            state.memtable.put(key.to_vec(), value.to_vec());
            if state.memtable.should_flush() {
                state.flush_memtable()?;
            }
            state.maybe_compact()?;
        }
        self.stats.record_put(start.elapsed().as_micros() as u64);
        Ok(())
    }
}

impl State {
    /// Persists the memtable as a new SSTable and resets it.
    pub(crate) fn flush_memtable(&mut self) -> Result<(), StorageError> {
        let entries = self.memtable.len();
        let mut sst = SsTable::create_in(&self.dir)?;

        manifest::append(&self.dir, manifest::file_name(sst.path()))?;
        self.memtable.flush_to_sstable(&mut sst)?;
        self.wal.clear()?;
        self.memtable.clear();

        tracing::debug!(
            file = %sst.path().display(),
            entries,
            "flushed memtable to sstable"
        );
        self.tables.push(sst);
        Ok(())
    }
}
