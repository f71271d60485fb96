use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary pages directory
pub fn create_test_pages_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Create a page file stored directly under its key
pub fn create_test_page(pages_dir: &TempDir, key: &str, markup: &str) -> PathBuf {
    let file_path = pages_dir.path().join(key);
    fs::write(&file_path, markup).unwrap();
    file_path
}
