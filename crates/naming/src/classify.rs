//! Candidate-region filename recognition.

use crate::consts::{CANDIDATE_REGION_REGEX, IMAGE_EXTENSIONS};
use crate::error::{ErrorKind, Result};
use std::path::Path;

/// The two halves of a `<base>_CR.<ext>` file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateName {
    /// Everything before the `_CR` marker.
    pub base: String,
    /// The image extension, with its original case preserved.
    pub extension: String,
}
impl CandidateName {
    /// File name of the reference image sharing this base and extension
    /// (`<base>.<ext>`).
    pub fn exact_reference(&self) -> String {
        format!("{}.{}", self.base, self.extension)
    }
}

/// Matches a file name against the candidate-region convention.
///
/// Returns `None` for anything else, which is not an error: files that aren't
/// CR images are simply excluded from the batch.
///
/// ```
/// use mmbatch_naming::classify;
///
/// let name = classify("manta 01_CR.JPG").unwrap();
/// assert_eq!(name.base, "manta 01");
/// assert_eq!(name.extension, "JPG");
/// assert!(classify("manta 01.jpg").is_none());
/// ```
pub fn classify(file_name: &str) -> Option<CandidateName> {
    let captures = CANDIDATE_REGION_REGEX.captures(file_name)?;
    Some(CandidateName {
        base: captures.get(1)?.as_str().to_string(),
        extension: captures.get(2)?.as_str().to_string(),
    })
}

/// Classifies the final component of `path`. Non-UTF-8 names never match.
pub fn classify_path(path: impl AsRef<Path>) -> Option<CandidateName> {
    path.as_ref().file_name().and_then(|name| name.to_str()).and_then(classify)
}

/// Like [`classify_path`], but treats a non-matching path as a contract
/// violation. Used where the caller has already established that the path is
/// a candidate-region image.
pub fn require_candidate(path: impl AsRef<Path>) -> Result<CandidateName> {
    let path = path.as_ref();
    match classify_path(path) {
        Some(name) => Ok(name),
        None => exn::bail!(ErrorKind::NotCandidateRegion(path.to_path_buf())),
    }
}

/// Returns `true` if `extension` (without the dot) is an accepted image extension.
pub fn is_image_extension(extension: &str) -> bool {
    IMAGE_EXTENSIONS.iter().any(|accepted| accepted.eq_ignore_ascii_case(extension))
}
