//! # WAL — Write-ahead log
//!
//! Crash-safe durability for the storage engine. Every mutation is appended
//! to the WAL and fsynced **before** the corresponding MemTable update, so a
//! crash at any point loses at most the one write that was never
//! acknowledged. On restart the log is replayed to rebuild the MemTable.
//!
//! ## Record format
//!
//! ```text
//! [keylen: u32 LE][vallen: u32 LE][key bytes][value bytes][checksum: u32 LE]
//! ```
//!
//! The checksum is `hash32` over everything before it (both length fields,
//! then key, then value, exactly as serialized). Each record is written with
//! a single `write_all` call followed by fsync; `append` returns only after
//! the bytes have reached the device.
//!
//! After a successful MemTable flush the engine truncates the log to zero
//! with [`Wal::clear`], reclaiming space without a segment mechanism.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};
use common::checksum::hash32;
use common::StorageError;

/// Append-only WAL writer. Owns the file handle; mutated only under the
/// engine's exclusive access.
pub struct Wal {
    file: File,
    path: PathBuf,
}

impl Wal {
    /// Opens (or creates) the log in append mode.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StorageError::file_open(&path, e))?;
        Ok(Self { file, path })
    }

    /// Serializes one record and appends it durably.
    ///
    /// The full frame is issued as a single write so a crash can only leave
    /// a trailing partial record, never an interleaved one. Fsyncs before
    /// returning.
    pub fn append(&mut self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let mut buf = Vec::with_capacity(8 + key.len() + value.len() + 4);
        buf.write_u32::<LittleEndian>(key.len() as u32)
            .map_err(|e| StorageError::file_write(&self.path, e))?;
        buf.write_u32::<LittleEndian>(value.len() as u32)
            .map_err(|e| StorageError::file_write(&self.path, e))?;
        buf.extend_from_slice(key);
        buf.extend_from_slice(value);
        let checksum = hash32(&buf);
        buf.write_u32::<LittleEndian>(checksum)
            .map_err(|e| StorageError::file_write(&self.path, e))?;

        self.file
            .write_all(&buf)
            .map_err(|e| StorageError::file_write(&self.path, e))?;
        self.sync()
    }

    /// Forces outstanding bytes to disk.
    pub fn sync(&self) -> Result<(), StorageError> {
        self.file
            .sync_all()
            .map_err(|e| StorageError::file_write(&self.path, e))
    }

    /// Truncates the log to zero length. Called only after the MemTable
    /// contents are durable in an SSTable.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.file
            .set_len(0)
            .map_err(|e| StorageError::file_write(&self.path, e))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Sequential reader over an existing WAL, used during recovery.
pub struct WalReader {
    reader: BufReader<File>,
    path: PathBuf,
}

impl WalReader {
    /// Opens an existing log for replay. Fails with `FileOpen` if the file
    /// cannot be opened (callers check for existence first).
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let file = File::open(&path).map_err(|e| StorageError::file_open(&path, e))?;
        Ok(Self {
            reader: BufReader::new(file),
            path,
        })
    }

    /// Replays every record in order, calling `apply(key, value)` for each.
    ///
    /// Termination:
    /// - a zero-byte read at the first length field is clean EOF, `Ok(())`;
    /// - a short read of any later field is a truncated record, `FileRead`;
    /// - a checksum mismatch aborts replay with `Corruption`.
    pub fn replay<F>(&mut self, mut apply: F) -> Result<(), StorageError>
    where
        F: FnMut(Vec<u8>, Vec<u8>),
    {
        loop {
            let keylen = match self.read_first_len()? {
                Some(len) => len,
                None => return Ok(()),
            };
            let vallen = self.read_exact_u32("record truncated in value length")?;

            let mut key = vec![0u8; keylen as usize];
            self.read_exact(&mut key, "record truncated in key bytes")?;
            let mut value = vec![0u8; vallen as usize];
            self.read_exact(&mut value, "record truncated in value bytes")?;

            let stored = self.read_exact_u32("record truncated in checksum")?;

            let mut frame = Vec::with_capacity(8 + key.len() + value.len());
            frame.extend_from_slice(&keylen.to_le_bytes());
            frame.extend_from_slice(&vallen.to_le_bytes());
            frame.extend_from_slice(&key);
            frame.extend_from_slice(&value);
            if hash32(&frame) != stored {
                return Err(StorageError::corruption(
                    &self.path,
                    "WAL record checksum mismatch",
                ));
            }

            apply(key, value);
        }
    }

    /// Reads the leading length field of the next record. `Ok(None)` only
    /// when the log ends exactly on a record boundary.
    fn read_first_len(&mut self) -> Result<Option<u32>, StorageError> {
        let mut buf = [0u8; 4];
        let mut filled = 0;
        while filled < buf.len() {
            let n = self
                .reader
                .read(&mut buf[filled..])
                .map_err(|e| StorageError::file_read(&self.path, e))?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(StorageError::file_read(
                    &self.path,
                    "record truncated in key length",
                ));
            }
            filled += n;
        }
        Ok(Some(u32::from_le_bytes(buf)))
    }

    fn read_exact_u32(&mut self, context: &str) -> Result<u32, StorageError> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf, context)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn read_exact(&mut self, buf: &mut [u8], context: &str) -> Result<(), StorageError> {
        self.reader.read_exact(buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                StorageError::file_read(&self.path, context)
            } else {
                StorageError::file_read(&self.path, e)
            }
        })
    }
}
