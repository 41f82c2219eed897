//! In-memory directory listings.
//!
//! Reference resolution asks the same question many times ("which files sit
//! next to this one?"). Rather than listing a directory per lookup, the index
//! lists it once and hands out the cached names until the caller refreshes it
//! after changing that directory. The filesystem remains the ground truth: a
//! stale listing is fixed by [`DirectoryIndex::refresh`], never by patching it.

use crate::error::{ErrorKind, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Cached, sorted file-name listings keyed by directory.
#[derive(Debug, Default)]
pub struct DirectoryIndex {
    listings: HashMap<PathBuf, Vec<String>>,
}
impl DirectoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the regular files in `directory`, in byte-wise order, listing
    /// the directory on first use.
    ///
    /// A directory that doesn't exist lists as empty.
    pub async fn listing(&mut self, directory: &Path) -> Result<&[String]> {
        if !self.listings.contains_key(directory) {
            self.refresh(directory).await?;
        }
        Ok(self.listings.get(directory).map(Vec::as_slice).unwrap_or_default())
    }

    /// Re-reads `directory` from disk, replacing any cached listing.
    pub async fn refresh(&mut self, directory: &Path) -> Result<()> {
        let names = read_file_names(directory).await?;
        tracing::trace!(directory = %directory.display(), files = names.len(), "Directory listing refreshed");
        self.listings.insert(directory.to_path_buf(), names);
        Ok(())
    }

    /// Drops the cached listing for `directory`; the next lookup re-reads it.
    pub fn invalidate(&mut self, directory: &Path) {
        self.listings.remove(directory);
    }

    /// Whether `name` is a file in `directory` according to the listing.
    pub async fn contains(&mut self, directory: &Path, name: &str) -> Result<bool> {
        Ok(self.listing(directory).await?.binary_search_by(|n| n.as_str().cmp(name)).is_ok())
    }

    /// Number of directories currently cached.
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

async fn read_file_names(directory: &Path) -> Result<Vec<String>> {
    let mut entries = match fs::read_dir(directory).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => exn::bail!(ErrorKind::io(e, directory)),
    };
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| ErrorKind::io(e, directory))? {
        let path = entry.path();
        // Follow symlinks; broken ones don't count as files.
        if !fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => tracing::debug!(name = ?name, "Ignoring non-UTF-8 file name"),
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{create_dir, remove_file, write};

    #[tokio::test]
    async fn test_listing_is_sorted_and_files_only() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path();
        write(dir.join("foo_CR.jpg"), b"cr").unwrap();
        write(dir.join("foo.PNG"), b"png").unwrap();
        write(dir.join("foo.jpg"), b"jpg").unwrap();
        create_dir(dir.join("foo.gif")).unwrap();
        let mut index = DirectoryIndex::new();
        assert_eq!(index.listing(dir).await.unwrap(), ["foo.PNG", "foo.jpg", "foo_CR.jpg"]);
    }

    #[tokio::test]
    async fn test_listing_is_cached_until_refreshed() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path();
        write(dir.join("a.jpg"), b"a").unwrap();
        let mut index = DirectoryIndex::new();
        assert!(index.contains(dir, "a.jpg").await.unwrap());

        remove_file(dir.join("a.jpg")).unwrap();
        write(dir.join("b.jpg"), b"b").unwrap();
        // Stale on purpose.
        assert!(index.contains(dir, "a.jpg").await.unwrap());
        assert!(!index.contains(dir, "b.jpg").await.unwrap());

        index.refresh(dir).await.unwrap();
        assert!(!index.contains(dir, "a.jpg").await.unwrap());
        assert!(index.contains(dir, "b.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn test_invalidate() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path();
        let mut index = DirectoryIndex::new();
        assert!(index.listing(dir).await.unwrap().is_empty());
        assert_eq!(index.len(), 1);
        write(dir.join("late.jpg"), b"x").unwrap();
        index.invalidate(dir);
        assert!(index.is_empty());
        assert!(index.contains(dir, "late.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_directory_lists_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut index = DirectoryIndex::new();
        assert!(index.listing(&temp_dir.path().join("missing")).await.unwrap().is_empty());
    }
}
