//! # SSTable — Sorted String Table
//!
//! Immutable on-disk tables for the storage engine. A table is produced
//! exactly once — by a memtable flush or a compaction merge — and never
//! modified afterwards; readers map the whole file and decode from the
//! mapping.
//!
//! ## File layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ HEADER   [min_len: u32][min_key][max_len: u32][max_key]      │
//! ├──────────────────────────────────────────────────────────────┤
//! │ BLOOM    [nbits: u64][nbits bytes, one bool per bit]         │
//! ├──────────────────────────────────────────────────────────────┤
//! │ DATA     repeated, strictly ascending by key:                │
//! │          [klen: u32][vlen: u32][key][value][checksum: u32]   │
//! ├──────────────────────────────────────────────────────────────┤
//! │ INDEX    every INDEX_STRIDE-th DATA entry:                   │
//! │          [klen: u32][key][file_offset: u64]                  │
//! ├──────────────────────────────────────────────────────────────┤
//! │ FOOTER   [index_offset: u64][index_size: u64]                │
//! │          [num_index_entries: u64][magic: u64]                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers little-endian. The per-record checksum is `hash32` over the
//! record bytes preceding it. The sparse index bounds every point lookup to
//! one seek plus a forward scan of at most `INDEX_STRIDE` records.

mod format;
mod merge;

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use bloom::BloomFilter;
use byteorder::{LittleEndian, WriteBytesExt};
use common::checksum::hash32;
use common::constants::{INDEX_STRIDE, SSTABLE_MAGIC};
use common::StorageError;
use memmap2::Mmap;

pub use format::{Footer, Header, IndexEntry};
pub use merge::merge_pair;

/// One on-disk table: the owning file handle, the read mapping once the file
/// is complete, and cached copies of the framing structures.
///
/// Move-only by construction — the handle and mapping have a single owner,
/// and both are released on drop. `get` works through `&self` and is safe
/// under the engine's shared read access; `next` is a cursor for compaction
/// and requires exclusive access.
pub struct SsTable {
    path: PathBuf,
    file: File,
    mmap: Option<Mmap>,
    header: Header,
    footer: Footer,
    index: Vec<IndexEntry>,
    bloom: BloomFilter,
    cursor: u64,
    /// Set by compaction once this table's contents live in a merged output;
    /// consumed by the manifest rewrite, which unlinks the backing file.
    marked_for_delete: bool,
}

impl std::fmt::Debug for SsTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsTable")
            .field("path", &self.path)
            .field("index_entries", &self.index.len())
            .field("marked_for_delete", &self.marked_for_delete)
            .finish()
    }
}

impl SsTable {
    /// Creates a new table in `dir` with a generated filename (a monotonic
    /// clock reading; uniqueness is all that matters, ordering lives in the
    /// manifest).
    pub fn create_in(dir: &Path) -> Result<Self, StorageError> {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| StorageError::file_open(dir, e))?
            .as_nanos();
        Self::create_at(dir.join(format!("{nanos}.sst")))
    }

    /// Creates a new, empty table file at `path`, open for writing. No
    /// mapping exists until [`write_footer`](Self::write_footer) seals it.
    pub fn create_at(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| StorageError::file_open(&path, e))?;
        Ok(Self {
            path,
            file,
            mmap: None,
            header: Header::default(),
            footer: Footer::default(),
            index: Vec::new(),
            bloom: BloomFilter::new(),
            cursor: 0,
            marked_for_delete: false,
        })
    }

    /// Opens an existing table: maps the file and parses header, bloom,
    /// footer, and index.
    ///
    /// # Errors
    ///
    /// `FileOpen` if the descriptor cannot be acquired; `FileRead` for an
    /// undersized or structurally invalid file, including a wrong footer
    /// magic (the signature of a partially written table).
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| StorageError::file_open(&path, e))?;
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| StorageError::file_read(&path, e))?;

        let mut table = Self {
            path,
            file,
            mmap: Some(mmap),
            header: Header::default(),
            footer: Footer::default(),
            index: Vec::new(),
            bloom: BloomFilter::new(),
            cursor: 0,
            marked_for_delete: false,
        };
        table.read_header()?;
        table.read_bloom()?;
        table.read_footer()?;
        table.read_index()?;
        table.cursor = table.data_start();
        Ok(table)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn footer(&self) -> &Footer {
        &self.footer
    }

    pub fn index(&self) -> &[IndexEntry] {
        &self.index
    }

    pub fn mark_for_delete(&mut self) {
        self.marked_for_delete = true;
    }

    pub fn is_marked_for_delete(&self) -> bool {
        self.marked_for_delete
    }

    // ---- Read path ----

    /// Point lookup.
    ///
    /// Filters in order of cheapness: key range, bloom filter (skipped when
    /// the stored filter is empty), then a sparse-index seek followed by a
    /// forward scan of at most [`INDEX_STRIDE`] records. Every scanned
    /// record is checksum-verified.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        if key < self.header.min_key.as_slice() || key > self.header.max_key.as_slice() {
            return Ok(None);
        }
        if !self.bloom.is_empty() && !self.bloom.contains(key) {
            return Ok(None);
        }

        // Greatest anchor with key <= target; fall back to the start of DATA
        // when the target precedes the first anchor.
        let mut pos = self.data_start();
        let upper = self.index.partition_point(|e| e.key.as_slice() <= key);
        if upper > 0 {
            pos = self.index[upper - 1].offset;
        }

        for _ in 0..INDEX_STRIDE {
            match self.read_entry_at(pos)? {
                None => return Ok(None),
                Some((entry_key, value, len)) => {
                    if entry_key == key {
                        return Ok(Some(value));
                    }
                    if entry_key.as_slice() > key {
                        return Ok(None);
                    }
                    pos += len;
                }
            }
        }
        Ok(None)
    }

    /// Sequential DATA iteration for compaction. Yields the next entry and
    /// advances the cursor; `None` once the cursor reaches the index.
    ///
    /// Not safe to interleave with `get` on the same instance from another
    /// thread; compaction holds exclusive access.
    pub fn next(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>, StorageError> {
        let data_start = self.data_start();
        if self.cursor < data_start {
            self.cursor = data_start;
        }
        match self.read_entry_at(self.cursor)? {
            None => Ok(None),
            Some((key, value, len)) => {
                self.cursor += len;
                Ok(Some((key, value)))
            }
        }
    }

    /// Resets the iteration cursor to the start of DATA.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    // ---- Write path ----
    //
    // Called in this order, exactly once per file: header, bloom, entries,
    // index, footer. Each op returns the bytes it appended; callers keep the
    // running offset to place sparse-index anchors and the footer.

    /// Writes the key-range header and records it on the table.
    pub fn write_header(&mut self, header: Header) -> Result<u64, StorageError> {
        let buf = header.encode();
        self.header = header;
        self.append(&buf)
    }

    /// Serializes the bloom filter (`[nbits: u64][one byte per bit]`) and
    /// stores it for the read path.
    pub fn write_bloom(&mut self, bloom: BloomFilter) -> Result<u64, StorageError> {
        let bits = bloom.bits();
        let mut buf = Vec::with_capacity(8 + bits.len());
        buf.write_u64::<LittleEndian>(bits.len() as u64)
            .map_err(|e| StorageError::file_write(&self.path, e))?;
        buf.extend(bits.iter().map(|&b| b as u8));
        self.bloom = bloom;
        self.append(&buf)
    }

    /// Appends one DATA record with its trailing checksum.
    pub fn write_entry(&mut self, key: &[u8], value: &[u8]) -> Result<u64, StorageError> {
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
        self.append(&buf)
    }

    /// Records a sparse-index anchor for the entry about to be written at
    /// `offset`.
    pub fn push_index(&mut self, key: Vec<u8>, offset: u64) {
        self.index.push(IndexEntry { key, offset });
    }

    /// Serializes the accumulated sparse index.
    pub fn write_index(&mut self) -> Result<u64, StorageError> {
        let mut buf = Vec::new();
        for entry in &self.index {
            entry.encode_into(&mut buf);
        }
        self.append(&buf)
    }

    /// Writes the footer, fsyncs, and maps the now-complete file so the
    /// table is immediately readable.
    pub fn write_footer(&mut self, footer: Footer) -> Result<(), StorageError> {
        let buf = footer.encode();
        self.footer = footer;
        self.append(&buf)?;
        self.file
            .sync_all()
            .map_err(|e| StorageError::file_write(&self.path, e))?;
        let mmap =
            unsafe { Mmap::map(&self.file) }.map_err(|e| StorageError::file_read(&self.path, e))?;
        self.mmap = Some(mmap);
        self.cursor = self.data_start();
        Ok(())
    }

    // ---- Internals ----

    fn append(&mut self, buf: &[u8]) -> Result<u64, StorageError> {
        self.file
            .write_all(buf)
            .map_err(|e| StorageError::file_write(&self.path, e))?;
        Ok(buf.len() as u64)
    }

    fn mapped(&self) -> Result<&[u8], StorageError> {
        match &self.mmap {
            Some(m) => Ok(&m[..]),
            None => Err(StorageError::file_read(
                &self.path,
                "table is not mapped for reads",
            )),
        }
    }

    /// First byte of the DATA section: header then bloom.
    fn data_start(&self) -> u64 {
        self.header.serialized_size() + 8 + self.bloom.bits().len() as u64
    }

    /// Decodes the DATA record at `pos`, verifying its checksum. `None` once
    /// `pos` reaches the index. The third tuple field is the record's full
    /// byte length.
    fn read_entry_at(&self, pos: u64) -> Result<Option<(Vec<u8>, Vec<u8>, u64)>, StorageError> {
        let data = self.mapped()?;
        let data_end = self.footer.index_offset as usize;
        let at = pos as usize;
        if at >= data_end {
            return Ok(None);
        }
        let (klen, vlen) = match (format::le_u32(data, at), format::le_u32(data, at + 4)) {
            (Some(k), Some(v)) => (k as usize, v as usize),
            _ => {
                return Err(StorageError::file_read(
                    &self.path,
                    "record lengths extend past data region",
                ))
            }
        };
        let payload_end = at + 8 + klen + vlen;
        let record_end = payload_end + 4;
        if record_end > data_end {
            return Err(StorageError::file_read(
                &self.path,
                "record extends past data region",
            ));
        }
        let stored = match format::le_u32(data, payload_end) {
            Some(v) => v,
            None => {
                return Err(StorageError::file_read(
                    &self.path,
                    "record checksum extends past data region",
                ))
            }
        };
        if hash32(&data[at..payload_end]) != stored {
            return Err(StorageError::corruption(
                &self.path,
                "DATA record checksum mismatch",
            ));
        }
        let key = data[at + 8..at + 8 + klen].to_vec();
        let value = data[at + 8 + klen..payload_end].to_vec();
        Ok(Some((key, value, (record_end - at) as u64)))
    }

    fn read_header(&mut self) -> Result<(), StorageError> {
        let data = self.mapped()?;
        self.header = Header::decode(data)
            .ok_or_else(|| StorageError::file_read(&self.path, "header extends past end of file"))?;
        Ok(())
    }

    fn read_bloom(&mut self) -> Result<(), StorageError> {
        let data = self.mapped()?;
        let at = self.header.serialized_size() as usize;
        let nbits = format::le_u64(data, at)
            .ok_or_else(|| StorageError::file_read(&self.path, "bloom size extends past end of file"))?
            as usize;
        if nbits == 0 {
            self.bloom = BloomFilter::new();
            return Ok(());
        }
        let raw = data
            .get(at + 8..at + 8 + nbits)
            .ok_or_else(|| StorageError::file_read(&self.path, "bloom bits extend past end of file"))?;
        self.bloom = BloomFilter::from_bits(raw.iter().map(|&b| b != 0).collect());
        Ok(())
    }

    fn read_footer(&mut self) -> Result<(), StorageError> {
        let data = self.mapped()?;
        let size = data.len();
        if (size as u64) < Footer::SIZE {
            return Err(StorageError::file_read(
                &self.path,
                "file too small to hold a footer",
            ));
        }
        let footer = Footer::decode(data, size - Footer::SIZE as usize)
            .ok_or_else(|| StorageError::file_read(&self.path, "unreadable footer"))?;
        if footer.magic != SSTABLE_MAGIC {
            return Err(StorageError::file_read(
                &self.path,
                "invalid magic number in footer",
            ));
        }
        let data_limit = size as u64 - Footer::SIZE;
        let index_end = footer.index_offset.checked_add(footer.index_size);
        if !matches!(index_end, Some(end) if end <= data_limit) {
            return Err(StorageError::file_read(
                &self.path,
                "index region extends past footer",
            ));
        }
        // Index entries are at least 12 bytes each; a larger count than the
        // region can hold means a corrupt footer.
        if footer.num_index_entries > footer.index_size / 12 {
            return Err(StorageError::file_read(
                &self.path,
                "index entry count inconsistent with index size",
            ));
        }
        self.footer = footer;
        Ok(())
    }

    fn read_index(&mut self) -> Result<(), StorageError> {
        let data = self.mapped()?;
        let mut at = self.footer.index_offset as usize;
        let mut index = Vec::with_capacity(self.footer.num_index_entries as usize);
        while (index.len() as u64) < self.footer.num_index_entries {
            let (entry, next_at) = IndexEntry::decode(data, at).ok_or_else(|| {
                StorageError::file_read(&self.path, "index entry extends past end of file")
            })?;
            index.push(entry);
            at = next_at;
        }
        self.index = index;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
