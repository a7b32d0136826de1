//! Compaction: pairwise merge of the live tables.
//!
//! Each pass walks the live list in ascending index pairs (0,1), (2,3), …
//! and merges every pair into one new table; a trailing odd table is carried
//! forward unchanged. One pass reads and writes each input byte exactly
//! once and halves the table count. Consumed inputs are marked for deletion
//! and unlinked once the manifest rewrite replaces the live list.
//!
//! Runs inline under the writer's exclusive access.

use std::fs;

use common::constants::COMPACTION_TRIGGER;
use common::StorageError;
use sstable::{merge_pair, SsTable};

use crate::{manifest, Engine, State};

impl Engine {
    /// Runs one pairwise compaction pass regardless of the trigger. A no-op
    /// with fewer than two live tables.
    pub fn compact(&self) -> Result<(), StorageError> {
        self.state.write().compact()
    }
}

impl State {
    /// Compacts when the live-table count has reached [`COMPACTION_TRIGGER`].
    pub(crate) fn maybe_compact(&mut self) -> Result<(), StorageError> {
        if self.tables.len() < COMPACTION_TRIGGER {
            return Ok(());
        }
        self.compact()
    }

    pub(crate) fn compact(&mut self) -> Result<(), StorageError> {
        if self.tables.len() < 2 {
            return Ok(());
        }
        tracing::info!(live = self.tables.len(), "compacting sstables pairwise");

        // Merge each (older, newer) pair into a fresh output table. The live
        // list is only restructured after every merge has succeeded, so a
        // failed pass leaves the engine state usable and the partial output
        // abandoned on disk.
        let mut outputs = Vec::with_capacity(self.tables.len() / 2);
        let mut consumed = 0;
        while consumed + 1 < self.tables.len() {
            let mut out = SsTable::create_in(&self.dir)?;
            let (left, right) = self.tables.split_at_mut(consumed + 1);
            merge_pair(&mut left[consumed], &mut right[0], &mut out)?;
            outputs.push(out);
            consumed += 2;
        }

        for table in &mut self.tables[..consumed] {
            table.mark_for_delete();
        }
        let retired: Vec<SsTable> = self.tables.drain(..consumed).collect();

        // Outputs replace their pairs in position; the odd tail (still in
        // `self.tables`, still newest) stays last, preserving recency order.
        let mut live = outputs;
        live.append(&mut self.tables);
        self.tables = live;

        for table in retired {
            if table.is_marked_for_delete() {
                let path = table.path().to_path_buf();
                drop(table); // release descriptor and mapping before unlink
                if let Err(e) = fs::remove_file(&path) {
                    tracing::warn!(
                        file = %path.display(),
                        error = %e,
                        "failed to unlink retired sstable"
                    );
                }
            }
        }

        manifest::rewrite(&self.dir, &self.tables)?;
        tracing::info!(live = self.tables.len(), "compaction complete");
        Ok(())
    }
}
