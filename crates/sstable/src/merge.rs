//! Pairwise merge of two SSTables into one, the unit of a compaction pass.
//!
//! Entries stream from both inputs through their sequential cursors and are
//! emitted in ascending key order. When the same key appears in both inputs
//! the right (newer) table's value is kept — the live list is ordered oldest
//! to newest, so within any pair the right table strictly postdates the left.

use std::cmp;

use bloom::BloomFilter;
use common::constants::INDEX_STRIDE;
use common::StorageError;

use crate::{Footer, Header, SsTable};

/// Merges `left` (older) and `right` (newer) into `out`, a freshly created
/// table.
///
/// The output header's key range is the union of the input headers' ranges —
/// an over-approximation that is exact when the inputs' headers are, since
/// the merge emits the union of both key sets. The output carries an empty
/// (disabled) bloom section: sizing a filter would need a second pass over
/// the inputs, and a compaction pass reads each input byte exactly once.
///
/// Every `INDEX_STRIDE`-th emitted entry gets a sparse-index anchor, the same
/// stride a flush uses. Both inputs are rewound first, so a pass retried
/// after an error never resumes mid-stream.
pub fn merge_pair(
    left: &mut SsTable,
    right: &mut SsTable,
    out: &mut SsTable,
) -> Result<(), StorageError> {
    let min_key = cmp::min(
        left.header().min_key.as_slice(),
        right.header().min_key.as_slice(),
    )
    .to_vec();
    let max_key = cmp::max(
        left.header().max_key.as_slice(),
        right.header().max_key.as_slice(),
    )
    .to_vec();

    let mut offset = out.write_header(Header::new(min_key, max_key))?;
    offset += out.write_bloom(BloomFilter::new())?;

    left.rewind();
    right.rewind();
    let mut lhs = left.next()?;
    let mut rhs = right.next()?;
    let mut emitted = 0usize;

    loop {
        let take_left = match (&lhs, &rhs) {
            (None, None) => break,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (Some((lk, _)), Some((rk, _))) => {
                if lk == rk {
                    // Overwrite: drop the older entry, emit the newer one.
                    lhs = left.next()?;
                    false
                } else {
                    lk < rk
                }
            }
        };

        let current = if take_left { lhs.take() } else { rhs.take() };
        if let Some((key, value)) = current {
            if emitted % INDEX_STRIDE == 0 {
                out.push_index(key.clone(), offset);
            }
            offset += out.write_entry(&key, &value)?;
            emitted += 1;
            if take_left {
                lhs = left.next()?;
            } else {
                rhs = right.next()?;
            }
        }
    }

    let index_size = out.write_index()?;
    let num_index_entries = out.index().len() as u64;
    out.write_footer(Footer::new(offset, index_size, num_index_entries))
}
