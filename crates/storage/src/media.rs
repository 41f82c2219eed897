use crate::error::Result;
use crate::path::normalize;
use mmbatch_naming::{CandidateName, classify_path, is_image_extension};
use std::path::{Path, PathBuf};

/// What a media file is to the matcher, judged purely by its file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRole {
    /// A `<base>_CR.<ext>` candidate-region image.
    CandidateRegion(CandidateName),
    /// Any other accepted image; a potential reference ("ID") image.
    Image,
    /// Not an image the matcher cares about.
    Other,
}

/// One file taking part in a batch.
///
/// Only the persistence flag is mutable. It tells the surrounding application
/// whether the file should still be tracked as a standalone image once the
/// batch completes; candidate-region images are consumed by the batch and have
/// it cleared during discovery. Clearing the flag never deletes the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    path: PathBuf,
    role: MediaRole,
    persist: bool,
}
impl MediaItem {
    /// Creates a media item from an absolute path, normalizing it lexically.
    ///
    /// # Errors
    /// Returns [`InvalidPath`](crate::error::ErrorKind::InvalidPath) if the
    /// path is relative.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = normalize(path)?;
        let role = match classify_path(&path) {
            Some(name) => MediaRole::CandidateRegion(name),
            None if path.extension().and_then(|e| e.to_str()).is_some_and(is_image_extension) => MediaRole::Image,
            None => MediaRole::Other,
        };
        Ok(Self { path, role, persist: true })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The directory containing this file.
    pub fn directory(&self) -> &Path {
        // Normalized absolute paths to a file always have a parent.
        self.path.parent().unwrap_or(Path::new("/"))
    }

    /// The final path component, or an empty string if it isn't valid UTF-8.
    pub fn file_name(&self) -> &str {
        self.path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
    }

    /// The file name with its `_CR` marker (for candidate regions) and
    /// extension removed.
    pub fn base_name(&self) -> &str {
        match &self.role {
            MediaRole::CandidateRegion(name) => &name.base,
            _ => self.path.file_stem().and_then(|s| s.to_str()).unwrap_or_default(),
        }
    }

    pub fn role(&self) -> &MediaRole {
        &self.role
    }

    /// The parsed candidate-region name, if this is a CR image.
    pub fn candidate(&self) -> Option<&CandidateName> {
        match &self.role {
            MediaRole::CandidateRegion(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_candidate(&self) -> bool {
        self.candidate().is_some()
    }

    pub fn persist(&self) -> bool {
        self.persist
    }

    pub fn set_persist(&mut self, persist: bool) {
        self.persist = persist;
    }
}
