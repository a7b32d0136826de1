//! The manifest: `lsm.meta`, a UTF-8 text file naming the live SSTables one
//! filename per line, oldest first. Flush appends a line; compaction rewrites
//! the whole file through a sibling (`lsm.meta.new` + fsync + rename + dir
//! fsync) so a crash mid-rewrite never leaves a half-written manifest.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use common::StorageError;
use sstable::SsTable;

use crate::META_FILENAME;

const META_TMP_FILENAME: &str = "lsm.meta.new";

/// Reads the manifest, returning the listed filenames in file order. A
/// missing manifest is an empty database.
pub(crate) fn load(dir: &Path) -> Result<Vec<String>, StorageError> {
    let path = dir.join(META_FILENAME);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(&path).map_err(|e| StorageError::file_open(&path, e))?;
    let reader = BufReader::new(file);

    let mut names = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|e| StorageError::file_read(&path, e))?;
        let name = line.trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

/// Appends one filename. Called before the table's contents are written, so
/// a crash in between leaves a manifest entry pointing at a partial file —
/// detected (and surfaced) when the engine reopens.
pub(crate) fn append(dir: &Path, name: &str) -> Result<(), StorageError> {
    let path = dir.join(META_FILENAME);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| StorageError::file_open(&path, e))?;
    writeln!(file, "{name}").map_err(|e| StorageError::file_write(&path, e))?;
    Ok(())
}

/// Replaces the manifest with the given live list, atomically: sibling file,
/// fsync, rename over the old manifest, fsync the directory.
pub(crate) fn rewrite(dir: &Path, tables: &[SsTable]) -> Result<(), StorageError> {
    let tmp_path = dir.join(META_TMP_FILENAME);
    let path = dir.join(META_FILENAME);

    {
        let mut file = File::create(&tmp_path).map_err(|e| StorageError::file_open(&tmp_path, e))?;
        for table in tables {
            writeln!(file, "{}", file_name(table.path()))
                .map_err(|e| StorageError::file_write(&tmp_path, e))?;
        }
        file.sync_all()
            .map_err(|e| StorageError::file_write(&tmp_path, e))?;
    }

    fs::rename(&tmp_path, &path).map_err(|e| StorageError::file_write(&path, e))?;

    match File::open(dir) {
        Ok(dir_handle) => {
            if let Err(e) = dir_handle.sync_all() {
                tracing::warn!(dir = %dir.display(), error = %e, "directory fsync after manifest rename failed");
            }
        }
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "could not open directory for fsync");
        }
    }
    Ok(())
}

/// Basename of a table path as it appears in the manifest. Table paths are
/// always `<digits>.sst` under the engine directory.
pub(crate) fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}
