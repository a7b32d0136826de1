use super::*;
use crate::merge_pair;
use tempfile::tempdir;

fn collect(sst: &mut SsTable) -> Vec<(Vec<u8>, Vec<u8>)> {
    sst.rewind();
    let mut out = Vec::new();
    while let Some(entry) = sst.next().unwrap() {
        out.push(entry);
    }
    out
}

#[test]
fn disjoint_inputs_interleave_sorted() {
    let dir = tempdir().unwrap();
    let mut left = build_table(&dir.path().join("l.sst"), &[(b"a", b"1"), (b"c", b"3")]);
    let mut right = build_table(&dir.path().join("r.sst"), &[(b"b", b"2"), (b"d", b"4")]);
    let mut out = SsTable::create_at(dir.path().join("out.sst")).unwrap();

    merge_pair(&mut left, &mut right, &mut out).unwrap();

    assert_eq!(
        collect(&mut out),
        vec![
            (b"a".to_vec(), b"1".to_vec()),
            (b"b".to_vec(), b"2".to_vec()),
            (b"c".to_vec(), b"3".to_vec()),
            (b"d".to_vec(), b"4".to_vec()),
        ]
    );
}

#[test]
fn equal_keys_keep_the_newer_value() {
    let dir = tempdir().unwrap();
    let mut left = build_table(
        &dir.path().join("l.sst"),
        &[(b"k1", b"old1"), (b"k2", b"old2"), (b"k3", b"only-left")],
    );
    let mut right = build_table(
        &dir.path().join("r.sst"),
        &[(b"k1", b"new1"), (b"k2", b"new2")],
    );
    let mut out = SsTable::create_at(dir.path().join("out.sst")).unwrap();

    merge_pair(&mut left, &mut right, &mut out).unwrap();

    assert_eq!(
        collect(&mut out),
        vec![
            (b"k1".to_vec(), b"new1".to_vec()),
            (b"k2".to_vec(), b"new2".to_vec()),
            (b"k3".to_vec(), b"only-left".to_vec()),
        ]
    );
}

#[test]
fn header_range_is_union_of_inputs() {
    let dir = tempdir().unwrap();
    let mut left = build_table(&dir.path().join("l.sst"), &[(b"d", b"4"), (b"m", b"13")]);
    let mut right = build_table(&dir.path().join("r.sst"), &[(b"a", b"1"), (b"f", b"6")]);
    let mut out = SsTable::create_at(dir.path().join("out.sst")).unwrap();

    merge_pair(&mut left, &mut right, &mut out).unwrap();

    assert_eq!(out.header().min_key, b"a");
    assert_eq!(out.header().max_key, b"m");
}

#[test]
fn merged_output_is_point_readable() {
    let dir = tempdir().unwrap();
    let left_entries = numbered_entries(30);
    let right_entries: Vec<(Vec<u8>, Vec<u8>)> = (15..45)
        .map(|i| {
            (
                format!("key{:03}", i).into_bytes(),
                format!("newer{:03}", i).into_bytes(),
            )
        })
        .collect();

    let mut left = build_table(&dir.path().join("l.sst"), &as_slices(&left_entries));
    let mut right = build_table(&dir.path().join("r.sst"), &as_slices(&right_entries));
    let mut out = SsTable::create_at(dir.path().join("out.sst")).unwrap();

    merge_pair(&mut left, &mut right, &mut out).unwrap();

    // 0..15 only in left, 15..30 overwritten by right, 30..45 only in right.
    for i in 0..15 {
        let key = format!("key{:03}", i);
        let want = format!("value{:03}", i);
        assert_eq!(out.get(key.as_bytes()).unwrap(), Some(want.into_bytes()));
    }
    for i in 15..45 {
        let key = format!("key{:03}", i);
        let want = format!("newer{:03}", i);
        assert_eq!(out.get(key.as_bytes()).unwrap(), Some(want.into_bytes()));
    }
    assert_eq!(out.get(b"key045").unwrap(), None);
}

#[test]
fn merged_output_reopens_cleanly() {
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("out.sst");
    {
        let mut left = build_table(&dir.path().join("l.sst"), &[(b"a", b"1")]);
        let mut right = build_table(&dir.path().join("r.sst"), &[(b"b", b"2")]);
        let mut out = SsTable::create_at(&out_path).unwrap();
        merge_pair(&mut left, &mut right, &mut out).unwrap();
    }

    let reopened = SsTable::open(&out_path).unwrap();
    assert_eq!(reopened.get(b"a").unwrap(), Some(b"1".to_vec()));
    assert_eq!(reopened.get(b"b").unwrap(), Some(b"2".to_vec()));
    assert_eq!(reopened.header().min_key, b"a");
    assert_eq!(reopened.header().max_key, b"b");
}

#[test]
fn stride_anchors_on_merge_output() {
    let dir = tempdir().unwrap();
    let left_entries = numbered_entries(20);
    let right_entries: Vec<(Vec<u8>, Vec<u8>)> = (20..40)
        .map(|i| {
            (
                format!("key{:03}", i).into_bytes(),
                format!("value{:03}", i).into_bytes(),
            )
        })
        .collect();

    let mut left = build_table(&dir.path().join("l.sst"), &as_slices(&left_entries));
    let mut right = build_table(&dir.path().join("r.sst"), &as_slices(&right_entries));
    let mut out = SsTable::create_at(dir.path().join("out.sst")).unwrap();

    merge_pair(&mut left, &mut right, &mut out).unwrap();

    // 40 merged entries at stride 16 -> anchors at entries 0, 16, 32.
    let index = out.index();
    assert_eq!(index.len(), 3);
    assert_eq!(index[0].key, b"key000");
    assert_eq!(index[1].key, b"key016");
    assert_eq!(index[2].key, b"key032");
}

#[test]
fn empty_input_passes_the_other_side_through() {
    let dir = tempdir().unwrap();
    let mut left = build_table(&dir.path().join("l.sst"), &[]);
    let mut right = build_table(&dir.path().join("r.sst"), &[(b"k", b"v")]);
    let mut out = SsTable::create_at(dir.path().join("out.sst")).unwrap();

    merge_pair(&mut left, &mut right, &mut out).unwrap();

    assert_eq!(collect(&mut out), vec![(b"k".to_vec(), b"v".to_vec())]);
}

#[test]
fn two_empty_inputs_produce_a_valid_empty_table() {
    let dir = tempdir().unwrap();
    let mut left = build_table(&dir.path().join("l.sst"), &[]);
    let mut right = build_table(&dir.path().join("r.sst"), &[]);
    let mut out = SsTable::create_at(dir.path().join("out.sst")).unwrap();

    merge_pair(&mut left, &mut right, &mut out).unwrap();

    assert_eq!(out.footer().num_index_entries, 0);
    assert_eq!(out.get(b"k").unwrap(), None);
    assert!(SsTable::open(out.path()).is_ok());
}
