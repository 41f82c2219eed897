//! Invocation of the external `mmprocess` matcher.
//!
//! The matcher is a black box with a file-based contract: given an image whose
//! `_CR` sibling is already staged, it writes the `_EH`, `_FT` and `_FEAT`
//! artifacts next to it. [`Matcher`] runs it with merged stdout/stderr captured
//! to a log file in the image's directory, one invocation at a time.
//!
//! Callers depend on the [`Runner`] trait so a test double can stand in for
//! the real executable (see `MockRunner`, behind the `mock` feature).

mod discover;
pub mod error;
mod matcher;
#[cfg(feature = "mock")]
mod mock;

pub use crate::discover::{DEFAULT_PROGRAM, FALLBACK_LOCATION};
use crate::error::{ErrorKind, Result};
pub use crate::matcher::{DEFAULT_ARGUMENTS, DEFAULT_LOG_FILE, Matcher};
#[cfg(feature = "mock")]
pub use crate::mock::MockRunner;
use async_trait::async_trait;
use mmbatch_naming::{ArtifactPaths, Role};
use std::path::{Path, PathBuf};

/// How a matcher invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Exit code zero.
    Success,
    /// Non-zero exit code.
    Failed(i32),
    /// Terminated by a signal (no exit code).
    Signalled,
    /// Killed after exceeding the configured timeout.
    TimedOut,
}
impl Status {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub status: Status,
    /// Where combined output was captured. Only exists on disk when the
    /// invocation did not succeed.
    pub log: PathBuf,
}

/// Something that can run the matcher on an image.
#[async_trait]
pub trait Runner: Send + Sync {
    /// Runs the matcher on `image`, blocking (asynchronously) until it exits.
    ///
    /// The `_CR` artifact for `image` must already exist.
    ///
    /// # Errors
    /// - [`MissingCandidateRegion`](ErrorKind::MissingCandidateRegion) or
    ///   [`InvalidImage`](ErrorKind::InvalidImage) when the precondition is
    ///   broken.
    /// - [`Spawn`](ErrorKind::Spawn) or [`Log`](ErrorKind::Log) when the
    ///   matcher could not be run at all.
    ///
    /// A matcher that runs but fails is reported through [`Execution::status`].
    async fn run(&self, image: &Path) -> Result<Execution>;
}

/// Checks the runner precondition, returning the image's match-set paths.
pub(crate) async fn require_staged(image: &Path) -> Result<ArtifactPaths> {
    let Ok(paths) = ArtifactPaths::for_image(image) else {
        exn::bail!(ErrorKind::InvalidImage(image.to_path_buf()));
    };
    let candidate = paths.get(Role::Cr);
    if !tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
        exn::bail!(ErrorKind::MissingCandidateRegion(candidate));
    }
    Ok(paths)
}
