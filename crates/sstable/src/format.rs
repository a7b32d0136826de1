//! On-disk structures framing the DATA section: header, sparse index entry,
//! and footer. All integers are little-endian.

use common::constants::SSTABLE_MAGIC;

/// Key range of the table: `min_key` is the first DATA key, `max_key` the
/// last. Both empty for a table with no entries.
///
/// Layout: `[min_len: u32][min_key][max_len: u32][max_key]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub min_key: Vec<u8>,
    pub max_key: Vec<u8>,
}

impl Header {
    pub fn new(min_key: Vec<u8>, max_key: Vec<u8>) -> Self {
        Self { min_key, max_key }
    }

    /// Serialized byte size; the bloom section starts at this offset.
    pub fn serialized_size(&self) -> u64 {
        (4 + self.min_key.len() + 4 + self.max_key.len()) as u64
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.serialized_size() as usize);
        buf.extend_from_slice(&(self.min_key.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.min_key);
        buf.extend_from_slice(&(self.max_key.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.max_key);
        buf
    }

    /// Decodes a header from the start of `data`. `None` if `data` is too
    /// short for the lengths it declares.
    pub fn decode(data: &[u8]) -> Option<Self> {
        let min_len = le_u32(data, 0)? as usize;
        let min_key = data.get(4..4 + min_len)?.to_vec();
        let at = 4 + min_len;
        let max_len = le_u32(data, at)? as usize;
        let max_key = data.get(at + 4..at + 4 + max_len)?.to_vec();
        Some(Self { min_key, max_key })
    }
}

/// One sparse-index anchor: a DATA key and the file offset of its record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub key: Vec<u8>,
    pub offset: u64,
}

impl IndexEntry {
    /// Layout: `[key_len: u32][key][offset: u64]`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&(self.key.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.key);
        buf.extend_from_slice(&self.offset.to_le_bytes());
    }

    /// Decodes one entry at `at`, returning it with the offset just past it.
    pub fn decode(data: &[u8], at: usize) -> Option<(Self, usize)> {
        let key_len = le_u32(data, at)? as usize;
        let key = data.get(at + 4..at + 4 + key_len)?.to_vec();
        let offset = le_u64(data, at + 4 + key_len)?;
        Some((Self { key, offset }, at + 4 + key_len + 8))
    }
}

/// Fixed-size trailer locating the index. Layout:
/// `[index_offset: u64][index_size: u64][num_index_entries: u64][magic: u64]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    pub index_offset: u64,
    pub index_size: u64,
    pub num_index_entries: u64,
    pub magic: u64,
}

impl Footer {
    pub const SIZE: u64 = 32;

    pub fn new(index_offset: u64, index_size: u64, num_index_entries: u64) -> Self {
        Self {
            index_offset,
            index_size,
            num_index_entries,
            magic: SSTABLE_MAGIC,
        }
    }

    pub fn encode(&self) -> [u8; Self::SIZE as usize] {
        let mut buf = [0u8; Self::SIZE as usize];
        buf[0..8].copy_from_slice(&self.index_offset.to_le_bytes());
        buf[8..16].copy_from_slice(&self.index_size.to_le_bytes());
        buf[16..24].copy_from_slice(&self.num_index_entries.to_le_bytes());
        buf[24..32].copy_from_slice(&self.magic.to_le_bytes());
        buf
    }

    /// Decodes the 32 bytes at `at`. The magic sentinel is the caller's check.
    pub fn decode(data: &[u8], at: usize) -> Option<Self> {
        Some(Self {
            index_offset: le_u64(data, at)?,
            index_size: le_u64(data, at + 8)?,
            num_index_entries: le_u64(data, at + 16)?,
            magic: le_u64(data, at + 24)?,
        })
    }
}

impl Default for Footer {
    fn default() -> Self {
        Self::new(0, 0, 0)
    }
}

pub(crate) fn le_u32(data: &[u8], at: usize) -> Option<u32> {
    let bytes = data.get(at..at + 4)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

pub(crate) fn le_u64(data: &[u8], at: usize) -> Option<u64> {
    let bytes = data.get(at..at + 8)?;
    Some(u64::from_le_bytes(bytes.try_into().ok()?))
}
