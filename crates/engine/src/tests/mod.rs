mod write_tests;

use std::fs;
use std::path::Path;

/// `.sst` files currently in `dir`.
fn sst_files(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut files: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|x| x == "sst").unwrap_or(false))
        .collect();
    files.sort();
    files
}

/// Non-empty lines of `lsm.meta`.
fn manifest_lines(dir: &Path) -> Vec<String> {
    let path = dir.join(crate::META_FILENAME);
    if !path.exists() {
        return Vec::new();
    }
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.to_string())
        .collect()
}
