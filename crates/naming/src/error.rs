//! Naming Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A naming error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for naming operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// Both variants are caller bugs: a path that was never a valid image (or
/// never a candidate-region image) was passed where one is required.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The file name does not follow the `<base>_CR.<ext>` convention.
    #[display("not a candidate-region image: {}", _0.display())]
    NotCandidateRegion(#[error(not(source))] PathBuf),
    /// The path has no usable file stem or no accepted image extension.
    #[display("not an image path: {}", _0.display())]
    InvalidImagePath(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // File names don't change between attempts.
        false
    }
}
