//! Library Error Types
//!
//! Only systemic failures surface here. Anything that affects a single
//! candidate-region image (no reference, duplicates, a matcher that exits
//! non-zero) becomes a [`Warning`](crate::Warning) and the batch carries on.

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a library failure.
///
/// ### Dependency Errors
/// - [`ErrorKind::Process`]
/// - [`ErrorKind::Storage`]
///
/// ### Operational Errors
/// - [`ErrorKind::Resolve`]
/// - [`ErrorKind::Template`]
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The matcher could not be run at all.
    #[display("matcher could not be run")]
    Process,
    /// Listing, staging or cleaning up files failed.
    #[display("storage operation failed")]
    Storage,
    /// Reference resolution was asked about an image that isn't a
    /// candidate region.
    #[display("reference resolution failed")]
    Resolve,
    /// A message template could not be compiled or rendered.
    #[display("invalid message template `{_0}`")]
    Template(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage)
    }
}
