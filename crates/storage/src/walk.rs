//! Recursive discovery of media files.

use crate::error::{ErrorKind, Result};
use crate::media::MediaItem;
use async_stream::stream;
use futures::{Stream, TryStreamExt};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::fs;

pub type MediaStream<'a> = Pin<Box<dyn Stream<Item = Result<MediaItem>> + Send + 'a>>;

enum WalkEntry {
    File(PathBuf),
    Descend(PathBuf),
    Skip,
}

/// Streams a [`MediaItem`] for every regular file below each of `roots`.
///
/// Roots are walked one after the other. Within a directory, files are
/// yielded in file-name order before any subdirectory is entered, so the
/// order of the stream is stable for an unchanged tree. Symlinks to files
/// are yielded under the link's own path; symlinks to directories are not
/// descended into, and broken ones are silently dropped.
///
/// Errors for individual entries are yielded without ending the stream.
pub fn walk<'a>(roots: &'a [PathBuf]) -> MediaStream<'a> {
    Box::pin(stream! {
        for root in roots {
            if !root.is_absolute() {
                yield Err(exn::Exn::from(ErrorKind::InvalidPath(root.clone())));
                continue;
            }
            let mut stack = vec![root.clone()];
            'dirs: while let Some(current) = stack.pop() {
                let mut entries = match read_sorted(&current).await {
                    Ok(entries) => entries,
                    Err(e) => { yield Err(e); continue 'dirs; },
                };
                let mut descend = Vec::new();
                for entry in entries.drain(..) {
                    match classify_entry(entry).await {
                        Ok(WalkEntry::File(path)) => yield MediaItem::new(path),
                        Ok(WalkEntry::Descend(dir)) => descend.push(dir),
                        Ok(WalkEntry::Skip) => {},
                        Err(e) => yield Err(e),
                    }
                }
                // Reversed so the stack pops subdirectories in name order.
                stack.extend(descend.into_iter().rev());
            }
        }
    })
}

/// Collects [`walk`] into a [`Vec`], failing on the first error.
pub async fn scan(roots: &[PathBuf]) -> Result<Vec<MediaItem>> {
    walk(roots).try_collect().await
}

async fn read_sorted(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(directory).await.map_err(|e| ErrorKind::io(e, directory))?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| ErrorKind::io(e, directory))? {
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

async fn classify_entry(path: PathBuf) -> Result<WalkEntry> {
    let metadata = match fs::symlink_metadata(&path).await {
        Ok(metadata) => metadata,
        // Removed since the directory was read.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(WalkEntry::Skip),
        Err(e) => exn::bail!(ErrorKind::io(e, &path)),
    };
    if metadata.is_symlink() {
        // Linked files are followed, linked directories are not: a link back
        // up the tree would otherwise be walked until the OS gives up.
        return match fs::metadata(&path).await {
            Ok(target) if target.is_file() => Ok(WalkEntry::File(path)),
            Ok(_) => {
                tracing::debug!(path = %path.display(), "Not following symlink to a non-file");
                Ok(WalkEntry::Skip)
            },
            // Broken, or a loop of links.
            Err(e) => {
                tracing::trace!(path = %path.display(), error = %e, "Skipping unresolvable symlink");
                Ok(WalkEntry::Skip)
            },
        };
    }
    if metadata.is_dir() {
        return Ok(WalkEntry::Descend(path));
    }
    if metadata.is_file() {
        return Ok(WalkEntry::File(path));
    }
    Ok(WalkEntry::Skip)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs::{create_dir_all, write};

    fn names(items: &[MediaItem], root: &Path) -> Vec<String> {
        items.iter().map(|i| i.path().strip_prefix(root).unwrap().display().to_string()).collect()
    }

    #[tokio::test]
    async fn test_scan_orders_files_before_subdirectories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        create_dir_all(root.join("b")).unwrap();
        create_dir_all(root.join("a/inner")).unwrap();
        write(root.join("z_CR.jpg"), b"z").unwrap();
        write(root.join("m.jpg"), b"m").unwrap();
        write(root.join("b/two.png"), b"2").unwrap();
        write(root.join("a/one_CR.png"), b"1").unwrap();
        write(root.join("a/inner/deep.gif"), b"d").unwrap();

        let items = scan(&[root.to_path_buf()]).await.unwrap();
        assert_eq!(names(&items, root), vec!["m.jpg", "z_CR.jpg", "a/one_CR.png", "a/inner/deep.gif", "b/two.png"]);
    }

    #[tokio::test]
    async fn test_scan_empty_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let items = scan(&[temp_dir.path().to_path_buf()]).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_scan_missing_root() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = scan(&[temp_dir.path().join("missing")]).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_scan_relative_root() {
        let err = scan(&[PathBuf::from("relative/dir")]).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_scan_skips_broken_symlinks() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        write(root.join("real_CR.jpg"), b"x").unwrap();
        std::os::unix::fs::symlink(root.join("gone.jpg"), root.join("dangling_CR.jpg")).unwrap();
        let items = scan(&[root.to_path_buf()]).await.unwrap();
        assert_eq!(names(&items, root), vec!["real_CR.jpg"]);
    }

    #[tokio::test]
    async fn test_scan_symlink_cycle() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        create_dir_all(root.join("sub")).unwrap();
        write(root.join("a_CR.jpg"), b"a").unwrap();
        write(root.join("sub/b.jpg"), b"b").unwrap();
        std::os::unix::fs::symlink(root, root.join("loop")).unwrap();
        std::os::unix::fs::symlink(root.join("sub"), root.join("sub/back")).unwrap();
        let items = scan(&[root.to_path_buf()]).await.unwrap();
        assert_eq!(names(&items, root), vec!["a_CR.jpg", "sub/b.jpg"]);
    }

    #[tokio::test]
    async fn test_scan_follows_file_symlinks() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        write(root.join("real.jpg"), b"x").unwrap();
        std::os::unix::fs::symlink(root.join("real.jpg"), root.join("linked_CR.jpg")).unwrap();
        std::os::unix::fs::symlink(root.join("self.jpg"), root.join("self.jpg")).unwrap();
        let items = scan(&[root.to_path_buf()]).await.unwrap();
        assert_eq!(names(&items, root), vec!["linked_CR.jpg", "real.jpg"]);
    }

    #[tokio::test]
    async fn test_scan_multiple_roots() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write(first.path().join("a_CR.jpg"), b"a").unwrap();
        write(second.path().join("b_CR.jpg"), b"b").unwrap();
        let items = scan(&[first.path().to_path_buf(), second.path().to_path_buf()]).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].file_name(), "a_CR.jpg");
        assert_eq!(items[1].file_name(), "b_CR.jpg");
    }
}
