//! Finding the reference ("ID") image for a candidate region.
//!
//! Only the candidate region's own directory is searched, in three tiers:
//!
//! 1. `<base>.<ext>` with the candidate region's own extension.
//! 2. `<base>.<any image extension>`.
//! 3. `<base>` followed by `-`, `_` or a space, then `id` in any case not
//!    followed by a digit, then anything, then an image extension
//!    (`foo-ID.jpg`, `foo_id 2013.png`, but not `foo-ID2.jpg`).
//!
//! The first tier with a match wins. Within a tier, the first name in byte
//! order is taken.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use mmbatch_naming::{CandidateName, IMAGE_EXTENSION_PATTERN, Role, is_image_extension, require_candidate};
use mmbatch_storage::{DirectoryIndex, MediaItem};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Looks up the reference image for `candidate`, returning its path.
///
/// `Ok(None)` means no reference exists. Apart from an exact name match,
/// files that are themselves part of a match-set (`_CR`, `_EH`, `_FT`,
/// `_FEAT`) are never taken as references.
///
/// # Errors
/// - [`Resolve`](ErrorKind::Resolve) if `candidate` isn't a `<base>_CR.<ext>`
///   image.
/// - [`Storage`](ErrorKind::Storage) if its directory can't be listed.
#[instrument(skip_all, fields(candidate = %candidate.display()))]
pub async fn find_reference(candidate: &Path, index: &mut DirectoryIndex) -> Result<Option<PathBuf>> {
    let name = require_candidate(candidate).or_raise(|| ErrorKind::Resolve)?;
    let directory = candidate.parent().unwrap_or(Path::new("/"));
    let listing = index.listing(directory).await.or_raise(|| ErrorKind::Storage)?;

    let exact = name.exact_reference();
    if listing.binary_search(&exact).is_ok() {
        return Ok(Some(directory.join(exact)));
    }
    if let Some(file) = first_match(2, listing, |file| same_base(&name, file)) {
        return Ok(Some(directory.join(file)));
    }
    let id_token = id_token_pattern(&name).or_raise(|| ErrorKind::Resolve)?;
    if let Some(file) = first_match(3, listing, |file| id_token.is_match(file)) {
        return Ok(Some(directory.join(file)));
    }
    Ok(None)
}

/// Like [`find_reference`], but hands back a [`MediaItem`]: the matching
/// entry of `inputs` when the reference is part of the batch, otherwise a new
/// item for its path.
pub async fn resolve(candidate: &MediaItem, inputs: &[MediaItem], index: &mut DirectoryIndex) -> Result<Option<MediaItem>> {
    let Some(path) = find_reference(candidate.path(), index).await? else {
        return Ok(None);
    };
    if let Some(item) = inputs.iter().find(|item| item.path() == path) {
        return Ok(Some(item.clone()));
    }
    MediaItem::new(&path).map(Some).or_raise(|| ErrorKind::Storage)
}

fn first_match<'a>(tier: u8, listing: &'a [String], matches: impl Fn(&str) -> bool) -> Option<&'a str> {
    let found: Vec<&str> = listing.iter().map(String::as_str).filter(|file| is_reference(file) && matches(*file)).collect();
    if found.len() > 1 {
        for file in &found {
            tracing::debug!(tier, file, "Found multiple possible reference images");
        }
    }
    found.first().copied()
}

/// `<base>.<ext>` for any accepted extension.
fn same_base(name: &CandidateName, file: &str) -> bool {
    file.strip_prefix(name.base.as_str())
        .and_then(|rest| rest.strip_prefix('.'))
        .is_some_and(is_image_extension)
}

fn id_token_pattern(name: &CandidateName) -> std::result::Result<Regex, regex::Error> {
    Regex::new(&format!(r"^{}[-_ ](?i:id)(?:[^0-9].*)?\.{}$", regex::escape(&name.base), IMAGE_EXTENSION_PATTERN))
}

/// Excludes match-set artifacts, which share the reference's base name.
fn is_reference(file: &str) -> bool {
    let stem = Path::new(file).file_stem().and_then(|s| s.to_str()).unwrap_or(file);
    Role::from_stem(stem).is_none()
}
