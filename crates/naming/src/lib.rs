//! Filename conventions shared by the MantaMatcher batch pipeline.
//!
//! - [`classify`] recognizes `<base>_CR.<ext>` candidate-region images.
//! - [`ArtifactPaths`] maps an image onto the paths of every [`Role`] in its
//!   match-set.
//!
//! Nothing in this crate performs I/O.

mod classify;
mod consts;
pub mod error;
mod role;

pub use crate::classify::{CandidateName, classify, classify_path, is_image_extension, require_candidate};
pub use crate::consts::{CANDIDATE_REGION_MARKER, IMAGE_EXTENSION_PATTERN, IMAGE_EXTENSIONS};
pub use crate::role::{ArtifactPaths, MatchStatus, Presence, Role};
