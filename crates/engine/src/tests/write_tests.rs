use super::{manifest_lines, sst_files};
use crate::{Engine, WAL_FILENAME};
use anyhow::Result;
use common::checksum::hash32;
use std::fs;
use tempfile::tempdir;

#[test]
fn put_writes_one_framed_wal_record() -> Result<()> {
    let dir = tempdir()?;
    let engine = Engine::open(dir.path())?;
    engine.put(b"foo", b"bar")?;
    assert_eq!(engine.get(b"foo")?, Some(b"bar".to_vec()));

    let wal = fs::read(dir.path().join(WAL_FILENAME))?;
    assert_eq!(wal.len(), 4 + 4 + 3 + 3 + 4);
    assert_eq!(u32::from_le_bytes(wal[0..4].try_into().unwrap()), 3);
    assert_eq!(u32::from_le_bytes(wal[4..8].try_into().unwrap()), 3);
    assert_eq!(&wal[8..11], b"foo");
    assert_eq!(&wal[11..14], b"bar");
    let stored = u32::from_le_bytes(wal[14..18].try_into().unwrap());
    assert_eq!(stored, hash32(&wal[0..14]));
    Ok(())
}

#[test]
fn flush_creates_sstable_and_manifest_entry() -> Result<()> {
    let dir = tempdir()?;
    let engine = Engine::open_with_flush_threshold(dir.path(), 64)?;
    for i in 0..20u32 {
        engine.put(format!("key{:02}", i).as_bytes(), b"some-value")?;
    }

    assert!(engine.sstable_count() >= 1);
    let files = sst_files(dir.path());
    assert!(!files.is_empty());

    let lines = manifest_lines(dir.path());
    assert_eq!(lines.len(), files.len());
    for file in &files {
        let name = file.file_name().unwrap().to_str().unwrap();
        assert!(lines.iter().any(|l| l == name), "{} not in manifest", name);
    }
    Ok(())
}

#[test]
fn wal_is_truncated_after_flush() -> Result<()> {
    let dir = tempdir()?;
    // Every put exceeds the threshold and flushes immediately.
    let engine = Engine::open_with_flush_threshold(dir.path(), 1)?;
    engine.put(b"key", b"value")?;

    assert_eq!(engine.sstable_count(), 1);
    assert_eq!(fs::metadata(dir.path().join(WAL_FILENAME))?.len(), 0);

    // The flushed value is still readable from the SSTable.
    assert_eq!(engine.get(b"key")?, Some(b"value".to_vec()));
    Ok(())
}

#[test]
fn four_thousand_entries_with_default_threshold() -> Result<()> {
    let dir = tempdir()?;
    let engine = Engine::open(dir.path())?;
    for i in 0..4096u32 {
        engine.put(
            format!("key{}", i).as_bytes(),
            format!("value{}", i).as_bytes(),
        )?;
    }

    // 4 KiB threshold with ~14-byte entries forces several flushes.
    assert!(engine.sstable_count() >= 1);
    assert!(!sst_files(dir.path()).is_empty());
    assert!(!manifest_lines(dir.path()).is_empty());

    assert_eq!(engine.get(b"key0")?, Some(b"value0".to_vec()));
    assert_eq!(engine.get(b"key4095")?, Some(b"value4095".to_vec()));
    assert_eq!(engine.get(b"missing")?, None);
    Ok(())
}

#[test]
fn memtable_resets_after_flush() -> Result<()> {
    let dir = tempdir()?;
    let engine = Engine::open_with_flush_threshold(dir.path(), 10)?;
    engine.put(b"long-enough-key", b"long-enough-value")?;

    let state = engine.state.read();
    assert!(state.memtable.is_empty());
    assert_eq!(state.memtable.size(), 0);
    Ok(())
}

#[test]
fn values_larger_than_threshold_round_trip() -> Result<()> {
    let dir = tempdir()?;
    let engine = Engine::open_with_flush_threshold(dir.path(), 64)?;
    let big = vec![b'x'; 10_000];
    engine.put(b"big", &big)?;
    assert_eq!(engine.get(b"big")?, Some(big));
    Ok(())
}
