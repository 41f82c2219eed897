//! Reference resolution and batch orchestration for MantaMatcher
//! candidate-region images.
//!
//! The entry point is [`BatchJob`], which discovers candidate-region images in
//! its input, pairs each with a reference image (see [`find_reference`]),
//! and drives a [`Runner`](mmbatch_process::Runner) over them one by one.
//! Per-item problems are collected as [`Warning`]s and rendered for people
//! through a [`Catalog`].

mod batch;
pub mod error;
mod messages;
mod resolve;
mod warning;

pub use crate::batch::{Action, BatchEvent, BatchJob, Options, Outcome, State, Summary};
pub use crate::messages::{Catalog, STATUS_KEY};
pub use crate::resolve::{find_reference, resolve};
pub use crate::warning::Warning;
