mod merge_tests;

use std::path::Path;

use bloom::BloomFilter;
use common::constants::INDEX_STRIDE;

use crate::{Footer, Header, SsTable};

/// Lays out a complete table from pre-sorted entries, the way a flush does.
fn build_table(path: &Path, entries: &[(&[u8], &[u8])]) -> SsTable {
    let mut sst = SsTable::create_at(path).unwrap();

    let (min_key, max_key) = match (entries.first(), entries.last()) {
        (Some((min, _)), Some((max, _))) => (min.to_vec(), max.to_vec()),
        _ => (Vec::new(), Vec::new()),
    };
    let mut offset = sst.write_header(Header::new(min_key, max_key)).unwrap();

    let mut bloom = BloomFilter::with_capacity(entries.len());
    for (key, _) in entries {
        bloom.add(key);
    }
    offset += sst.write_bloom(bloom).unwrap();

    for (i, (key, value)) in entries.iter().enumerate() {
        if i % INDEX_STRIDE == 0 {
            sst.push_index(key.to_vec(), offset);
        }
        offset += sst.write_entry(key, value).unwrap();
    }

    let index_size = sst.write_index().unwrap();
    let num_index_entries = sst.index().len() as u64;
    sst.write_footer(Footer::new(offset, index_size, num_index_entries))
        .unwrap();
    sst
}

/// `("key000", "value000")`-style sorted entries; zero-padded so the
/// lexicographic order matches the numeric one.
fn numbered_entries(n: usize) -> Vec<(Vec<u8>, Vec<u8>)> {
    (0..n)
        .map(|i| {
            (
                format!("key{:03}", i).into_bytes(),
                format!("value{:03}", i).into_bytes(),
            )
        })
        .collect()
}

fn as_slices(entries: &[(Vec<u8>, Vec<u8>)]) -> Vec<(&[u8], &[u8])> {
    entries
        .iter()
        .map(|(k, v)| (k.as_slice(), v.as_slice()))
        .collect()
}
