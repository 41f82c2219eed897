//! Process Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A process error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for process operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
/// A non-zero exit from the matcher is **not** an error; it is reported through
/// [`Status`](crate::Status).
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The matcher executable could not be located.
    #[display("matcher executable not found: {_0}")]
    MatcherNotFound(#[error(not(source))] String),
    /// The matcher exists but could not be started (permissions, bad binary).
    #[display("failed to start matcher: {}", _0.display())]
    Spawn(#[error(not(source))] PathBuf),
    /// The output log could not be created, or waiting on the child failed.
    #[display("failed to capture matcher output: {}", _0.display())]
    Log(#[error(not(source))] PathBuf),
    /// Caller bug: the image isn't something the matcher can be run on.
    #[display("not an image path: {}", _0.display())]
    InvalidImage(#[error(not(source))] PathBuf),
    /// Caller bug: the candidate-region file must be staged before running.
    #[display("candidate region not staged: {}", _0.display())]
    MissingCandidateRegion(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Log(_))
    }

    /// Returns `true` if the error indicates the caller broke the runner's contract.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::InvalidImage(_) | Self::MissingCandidateRegion(_))
    }
}
