//! # Engine — DriftKV storage engine
//!
//! The orchestrator tying the [`memtable`], [`wal`], and [`sstable`] crates
//! into an embeddable LSM-tree key-value store.
//!
//! ```text
//! put ──► WAL append + fsync ──► MemTable insert
//!                                     │ size > threshold?
//!                                     ▼
//!                              flush ──► new SSTable, WAL truncated
//!                                     │ live tables >= trigger?
//!                                     ▼
//!                              pairwise compaction
//!
//! get ──► MemTable ──► SSTables newest-to-oldest, first hit wins
//! ```
//!
//! ## Module responsibilities
//!
//! | Module         | Purpose                                            |
//! |----------------|----------------------------------------------------|
//! | `lib.rs`       | `Engine` struct, open, accessors                   |
//! | [`recovery`]   | WAL replay, manifest load, SSTable opening         |
//! | [`read`]       | `get()` under shared access                        |
//! | [`write`]      | `put()` under exclusive access, memtable flush     |
//! | [`compaction`] | pairwise merge pass, retired-file unlinking        |
//! | [`manifest`]   | `lsm.meta` append and atomic rewrite               |
//! | [`stats`]      | lock-free operation counters                       |
//!
//! ## Concurrency
//!
//! A single reader/writer lock guards the mutable state (memtable, WAL
//! handle, live table list): `get` takes shared access, `put` exclusive, and
//! flush and compaction run inline inside `put`. Latency counters are
//! relaxed atomics updated outside the lock. A value acknowledged by `put`
//! is visible to every subsequent `get` on any thread, and survives restart
//! — the WAL is fsynced before the memtable insert is acknowledged.

mod compaction;
mod manifest;
mod read;
mod recovery;
mod stats;
mod write;

use std::path::{Path, PathBuf};

use common::constants::MEMTABLE_FLUSH_THRESHOLD;
use common::StorageError;
use memtable::MemTable;
use parking_lot::RwLock;
use sstable::SsTable;
use wal::Wal;

pub use stats::Stats;
use stats::StatsRecorder;

/// Write-ahead log filename inside the engine directory.
pub const WAL_FILENAME: &str = "lsm.wal";
/// Manifest filename inside the engine directory.
pub const META_FILENAME: &str = "lsm.meta";

/// The embeddable LSM-tree engine. Safe to share across threads (`&self`
/// operations behind a reader/writer lock); all files live in the directory
/// given at open.
pub struct Engine {
    state: RwLock<State>,
    stats: StatsRecorder,
}

/// Mutable engine state, guarded by the engine's reader/writer lock.
pub(crate) struct State {
    pub(crate) dir: PathBuf,
    pub(crate) memtable: MemTable,
    pub(crate) wal: Wal,
    /// Live tables in creation order: oldest at the front, newest at the
    /// back. Reads walk this back-to-front; compaction relies on the same
    /// order for its newer-wins tie-break.
    pub(crate) tables: Vec<SsTable>,
}

impl Engine {
    /// Opens (or creates) an engine rooted at `dir`: replays `lsm.wal` into
    /// a fresh memtable, then opens every SSTable the manifest lists.
    ///
    /// # Errors
    ///
    /// Fails if the WAL replay or any SSTable open fails — including a
    /// manifest entry pointing at a missing or partially written file.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::open_with_flush_threshold(dir, MEMTABLE_FLUSH_THRESHOLD)
    }

    /// [`open`](Self::open) with a non-default memtable flush threshold.
    pub fn open_with_flush_threshold(
        dir: impl AsRef<Path>,
        flush_threshold: usize,
    ) -> Result<Self, StorageError> {
        let state = recovery::recover(dir.as_ref(), flush_threshold)?;
        Ok(Self {
            state: RwLock::new(state),
            stats: StatsRecorder::default(),
        })
    }

    /// Snapshot of the operation counters. Reads atomics only; never blocks
    /// on the engine lock.
    pub fn stats(&self) -> Stats {
        self.stats.snapshot()
    }

    /// Number of live SSTables.
    pub fn sstable_count(&self) -> usize {
        self.state.read().tables.len()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("Engine")
            .field("dir", &state.dir)
            .field("memtable_entries", &state.memtable.len())
            .field("memtable_bytes", &state.memtable.size())
            .field("sstables", &state.tables.len())
            .finish()
    }
}

#[cfg(test)]
mod tests;
