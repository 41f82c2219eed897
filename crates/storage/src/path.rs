//! Lexical path normalization.
//!
//! Media files are identified by absolute path. Two spellings of the same
//! path (`/a/./b.jpg`, `/a/c/../b.jpg`) must compare equal so that duplicate
//! candidate-region images can be detected without touching the filesystem.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Normalizes an absolute path by resolving `.` and `..` components.
///
/// > **Note:** This is purely lexical. Symlinks are **not** resolved, so two
/// >           different links to the same file remain distinct. Null bytes
/// >           are explicitly rejected.
///
/// # Returns
/// Returns the normalized path if valid, or [`InvalidPath`](crate::error::ErrorKind::InvalidPath)
/// if the path is relative or climbs above the root.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use mmbatch_storage::normalize_path;
/// assert_eq!(normalize_path("/data/./2013//foo_CR.jpg").unwrap(), Path::new("/data/2013/foo_CR.jpg"));
/// assert_eq!(normalize_path("/data/x/../foo_CR.jpg").unwrap(), Path::new("/data/foo_CR.jpg"));
/// assert!(normalize_path("data/foo_CR.jpg").is_err());
/// assert!(normalize_path("/../foo_CR.jpg").is_err());
/// ```
pub fn normalize(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    if !path.is_absolute() {
        exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
    }
    let mut prefix = PathBuf::new();
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls, so reject them explicitly.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
                }
                components.push(s)
            },
            Component::Prefix(p) => prefix.push(p.as_os_str()),
            Component::RootDir => prefix.push(Component::RootDir.as_os_str()),
            Component::CurDir => {},
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
                }
            },
        }
    }
    prefix.extend(components);
    Ok(prefix)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_unchanged_paths() {
        assert_eq!(normalize(Path::new("/data/foo_CR.jpg")).unwrap(), Path::new("/data/foo_CR.jpg"));
        assert_eq!(normalize(Path::new("/foo.jpg")).unwrap(), Path::new("/foo.jpg"));
    }

    #[test]
    fn test_path_normalization() {
        // Double slashes are normalized
        assert_eq!(normalize(Path::new("/a//b//c.jpg")).unwrap(), Path::new("/a/b/c.jpg"));
        // Current directory references removed
        assert_eq!(normalize(Path::new("/a/./b/./c.jpg")).unwrap(), Path::new("/a/b/c.jpg"));
        // Parent references are resolved lexically
        assert_eq!(normalize(Path::new("/a/b/../c.jpg")).unwrap(), Path::new("/a/c.jpg"));
    }

    #[test]
    fn test_trailing_slashes() {
        assert_eq!(normalize(Path::new("/data/")).unwrap(), Path::new("/data"));
        assert_eq!(normalize(Path::new("/")).unwrap(), Path::new("/"));
    }

    #[test]
    fn test_relative_paths() {
        assert!(normalize(Path::new("foo.jpg")).is_err());
        assert!(normalize(Path::new("./foo.jpg")).is_err());
        assert!(normalize(Path::new("")).is_err());
    }

    #[test]
    fn test_traversal_attempts() {
        assert!(normalize(Path::new("/..")).is_err());
        assert!(normalize(Path::new("/a/../../b")).is_err());
    }

    #[test]
    fn test_invalid_characters() {
        assert!(normalize(Path::new("/a\0b")).is_err());
    }
}
