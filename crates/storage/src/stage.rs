//! Moving files into their match-set names, and removing them again.
//!
//! A file only ever appears under an artifact name once it is complete: moves
//! use `rename`, and copies are written to a `.partial` sibling, verified, and
//! renamed into place.

use crate::error::{ErrorKind, Result};
use mmbatch_naming::{ArtifactPaths, Presence};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::instrument;

/// How a file should reach its staged location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageMode {
    /// Leave the source where it is.
    Copy,
    /// Relocate the source.
    Move,
}

/// What staging actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staged {
    /// Source and target were already the same path.
    InPlace,
    Copied,
    /// Renamed within the same filesystem.
    Renamed,
    /// Copied across filesystems, verified, then the source removed.
    Relocated,
}

/// Stages `source` at `target` according to `mode`.
#[instrument(skip_all, fields(source = %source.display(), target = %target.display()))]
pub async fn stage(source: &Path, target: &Path, mode: StageMode) -> Result<Staged> {
    if source == target {
        return Ok(Staged::InPlace);
    }
    match mode {
        StageMode::Copy => {
            copy_verified(source, target).await?;
            Ok(Staged::Copied)
        },
        StageMode::Move => match fs::rename(source, target).await {
            Ok(()) => Ok(Staged::Renamed),
            Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
                tracing::debug!("Rename crosses filesystems; copying instead");
                copy_verified(source, target).await?;
                fs::remove_file(source).await.map_err(|e| ErrorKind::io(e, source))?;
                Ok(Staged::Relocated)
            },
            Err(e) => exn::bail!(ErrorKind::io(e, source)),
        },
    }
}

/// Removes `path`, returning `false` if it was already gone.
pub async fn remove(path: &Path) -> Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => exn::bail!(ErrorKind::io(e, path)),
    }
}

/// Whether `path` exists on disk right now, bypassing any cached listing.
pub async fn exists(path: &Path) -> Result<bool> {
    let exists = fs::try_exists(path).await.map_err(|e| ErrorKind::io(e, path))?;
    Ok(exists)
}

/// Checks which files of a match-set exist on disk.
pub async fn probe(paths: &ArtifactPaths) -> Result<Presence> {
    let mut presence = Presence::default();
    for (role, path) in paths.iter() {
        let exists = fs::try_exists(&path).await.map_err(|e| ErrorKind::io(e, &path))?;
        presence.set(role, exists);
    }
    Ok(presence)
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().map(OsString::from).unwrap_or_default();
    name.push(".partial");
    target.with_file_name(name)
}

async fn copy_verified(source: &Path, target: &Path) -> Result<()> {
    let partial = partial_path(target);
    fs::copy(source, &partial).await.map_err(|e| ErrorKind::io(e, source))?;
    let verified = promote(source, &partial, target).await;
    if verified.is_err() {
        // Don't leave the half-finished copy lying around; the original error matters more.
        _ = fs::remove_file(&partial).await;
    }
    verified
}

/// Renames `partial` to `target` once its contents are known to match `source`.
async fn promote(source: &Path, partial: &Path, target: &Path) -> Result<()> {
    if digest(source).await? != digest(partial).await? {
        exn::bail!(ErrorKind::Verification(target.to_path_buf()));
    }
    fs::rename(partial, target).await.map_err(|e| ErrorKind::io(e, target))?;
    Ok(())
}

async fn digest(path: &Path) -> Result<blake3::Hash> {
    let bytes = fs::read(path).await.map_err(|e| ErrorKind::io(e, path))?;
    Ok(blake3::hash(&bytes))
}

/// Deletes every file of a match-set, in reverse order of creation.
pub async fn remove_all(paths: &ArtifactPaths) -> Result<usize> {
    let mut removed = 0;
    for (role, path) in paths.iter().collect::<Vec<_>>().into_iter().rev() {
        if remove(&path).await? {
            tracing::debug!(role = %role, path = %path.display(), "Removed match-set file");
            removed += 1;
        }
    }
    Ok(removed)
}
