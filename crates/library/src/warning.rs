use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

/// Something that went wrong with a single item without stopping the batch.
///
/// Warnings are kept structured until they reach a user; the
/// [`Catalog`](crate::Catalog) turns them into text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// The same candidate-region file appeared in the input more than once.
    DuplicateFile { file: PathBuf },
    /// No reference image was found; the candidate region was matched
    /// against itself.
    NoReference { file: PathBuf },
    /// The reference already has a staged candidate region (from another
    /// image) or a complete match-set.
    Duplicate { file: PathBuf, reference: PathBuf },
    /// The resolved reference image has disappeared from disk.
    FileNotFound { file: PathBuf, reference: PathBuf },
    /// The matcher didn't produce every artifact.
    ProcessingFailed { file: PathBuf, reference: PathBuf },
}
impl Warning {
    /// Message catalog key for this kind of warning.
    pub fn key(&self) -> &'static str {
        match self {
            Self::DuplicateFile { .. } => "duplicate-file",
            Self::NoReference { .. } => "no-reference",
            Self::Duplicate { .. } => "duplicate",
            Self::FileNotFound { .. } => "file-not-found",
            Self::ProcessingFailed { .. } => "processing-failed",
        }
    }

    /// The candidate-region image the warning is about.
    pub fn file(&self) -> &Path {
        match self {
            Self::DuplicateFile { file }
            | Self::NoReference { file }
            | Self::Duplicate { file, .. }
            | Self::FileNotFound { file, .. }
            | Self::ProcessingFailed { file, .. } => file,
        }
    }

    /// The reference image involved, where there is one.
    pub fn other(&self) -> Option<&Path> {
        match self {
            Self::DuplicateFile { .. } | Self::NoReference { .. } => None,
            Self::Duplicate { reference, .. }
            | Self::FileNotFound { reference, .. }
            | Self::ProcessingFailed { reference, .. } => Some(reference),
        }
    }
}
impl Display for Warning {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.other() {
            Some(other) => write!(f, "{}: {} ({})", self.key(), self.file().display(), other.display()),
            None => write!(f, "{}: {}", self.key(), self.file().display()),
        }
    }
}
