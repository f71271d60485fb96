use crate::page::PageKey;
use relative_path::RelativePath;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid pages directory: {0}")]
    InvalidPagesDir(String),
}

/// Key-value text store holding page markup.
///
/// A missing key is a page that does not exist yet, not an error.
pub trait PageStore {
    fn load(&self, key: &PageKey) -> Result<Option<String>, IoError>;
    fn save(&mut self, key: &PageKey, markup: &str) -> Result<(), IoError>;
    /// Returns whether something was removed.
    fn remove(&mut self, key: &PageKey) -> Result<bool, IoError>;
    /// Every stored key, sorted ascending.
    fn keys(&self) -> Result<Vec<String>, IoError>;
}

/// Read a page file, `None` if it does not exist
pub fn read_page(key: &PageKey, pages_root: &Path) -> Result<Option<String>, IoError> {
    let absolute_path = page_path(key, pages_root);
    if !absolute_path.is_file() {
        return Ok(None);
    }
    fs::read_to_string(&absolute_path)
        .map(Some)
        .map_err(IoError::Io)
}

/// Write markup to a page file
pub fn write_page(key: &PageKey, pages_root: &Path, markup: &str) -> Result<(), IoError> {
    let absolute_path = page_path(key, pages_root);

    // Create the pages directory if it was removed underneath us
    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    fs::write(&absolute_path, markup).map_err(IoError::Io)
}

/// Delete a page file, returning whether it existed
pub fn delete_page(key: &PageKey, pages_root: &Path) -> Result<bool, IoError> {
    let absolute_path = page_path(key, pages_root);
    if !absolute_path.is_file() {
        return Ok(false);
    }
    fs::remove_file(&absolute_path).map_err(IoError::Io)?;
    Ok(true)
}

/// List the page files in the pages directory, sorted by name
pub fn scan_pages(pages_root: &Path) -> Result<Vec<String>, IoError> {
    if !pages_root.exists() {
        return Err(IoError::InvalidPagesDir(
            "pages directory not found".to_string(),
        ));
    }

    let mut pages = Vec::new();
    for entry in fs::read_dir(pages_root).map_err(IoError::Io)? {
        let entry = entry.map_err(IoError::Io)?;
        if !entry.path().is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => pages.push(name),
            Err(name) => log::warn!("Skipping page file with non UTF-8 name: {name:?}"),
        }
    }

    pages.sort();
    Ok(pages)
}

pub fn validate_pages_dir(path: &Path) -> Result<(), IoError> {
    if !path.exists() || !path.is_dir() {
        return Err(IoError::InvalidPagesDir(
            "Directory does not exist".to_string(),
        ));
    }

    Ok(())
}

fn page_path(key: &PageKey, pages_root: &Path) -> PathBuf {
    // Keys never contain separators, so this is always a direct child
    RelativePath::new(key.as_str()).to_path(pages_root)
}

/// Pages stored as one file per key in a single directory.
#[derive(Debug, Clone)]
pub struct FsPageStore {
    root: PathBuf,
}

impl FsPageStore {
    /// Open a pages directory, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, IoError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(IoError::Io)?;
        validate_pages_dir(&root)?;
        log::debug!("Opened pages directory {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PageStore for FsPageStore {
    fn load(&self, key: &PageKey) -> Result<Option<String>, IoError> {
        read_page(key, &self.root)
    }

    fn save(&mut self, key: &PageKey, markup: &str) -> Result<(), IoError> {
        write_page(key, &self.root, markup)
    }

    fn remove(&mut self, key: &PageKey) -> Result<bool, IoError> {
        delete_page(key, &self.root)
    }

    fn keys(&self) -> Result<Vec<String>, IoError> {
        scan_pages(&self.root)
    }
}

/// In-memory pages, sorted by key.
#[derive(Debug, Clone, Default)]
pub struct MemoryPageStore {
    pages: BTreeMap<String, String>,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add pages in a batch, keyed by page name
    pub fn with_pages<'a>(pages: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut store = Self::new();
        for (name, markup) in pages {
            if let Some(key) = PageKey::from_name(name) {
                store.pages.insert(key.as_str().to_string(), markup.to_string());
            }
        }
        store
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl PageStore for MemoryPageStore {
    fn load(&self, key: &PageKey) -> Result<Option<String>, IoError> {
        Ok(self.pages.get(key.as_str()).cloned())
    }

    fn save(&mut self, key: &PageKey, markup: &str) -> Result<(), IoError> {
        self.pages
            .insert(key.as_str().to_string(), markup.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &PageKey) -> Result<bool, IoError> {
        Ok(self.pages.remove(key.as_str()).is_some())
    }

    fn keys(&self) -> Result<Vec<String>, IoError> {
        Ok(self.pages.keys().cloned().collect())
    }
}
