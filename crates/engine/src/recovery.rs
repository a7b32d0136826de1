//! Cold-start recovery: replay the WAL into a fresh memtable, then open the
//! SSTables the manifest lists.

use std::fs;
use std::path::Path;

use common::StorageError;
use memtable::MemTable;
use sstable::SsTable;
use wal::Wal;

use crate::{manifest, State, WAL_FILENAME};

/// Builds the engine state from the files in `dir`, creating the directory
/// if needed.
///
/// Replay runs before the WAL writer opens, and any error — WAL corruption,
/// a missing SSTable, a table that fails to parse — aborts recovery rather
/// than silently dropping data.
pub(crate) fn recover(dir: &Path, flush_threshold: usize) -> Result<State, StorageError> {
    fs::create_dir_all(dir).map_err(|e| StorageError::file_open(dir, e))?;

    let wal_path = dir.join(WAL_FILENAME);
    let mut memtable = MemTable::with_threshold(flush_threshold);
    memtable.restore_from_wal(&wal_path)?;

    let wal = Wal::open(&wal_path)?;

    let names = manifest::load(dir)?;
    let mut tables = Vec::with_capacity(names.len());
    for name in &names {
        tables.push(SsTable::open(dir.join(name))?);
    }

    tracing::info!(
        dir = %dir.display(),
        replayed_entries = memtable.len(),
        sstables = tables.len(),
        "storage engine recovered"
    );

    Ok(State {
        dir: dir.to_path_buf(),
        memtable,
        wal,
        tables,
    })
}
