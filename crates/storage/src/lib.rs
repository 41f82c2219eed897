//! Media files on the local filesystem.
//!
//! - [`MediaItem`] records for individual files, discovered with [`walk`] or
//!   [`scan`].
//! - [`DirectoryIndex`] caches per-directory listings for repeated lookups.
//! - [`stage`], [`remove`], [`remove_all`], [`exists`] and [`probe`] manipulate and
//!   inspect match-set files on disk.

pub mod error;
mod index;
mod media;
mod path;
mod stage;
mod walk;

pub use crate::index::DirectoryIndex;
pub use crate::media::{MediaItem, MediaRole};
pub use crate::path::normalize as normalize_path;
pub use crate::stage::{StageMode, Staged, exists, probe, remove, remove_all, stage};
pub use crate::walk::{MediaStream, scan, walk};
