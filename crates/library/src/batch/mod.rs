//! Batch processing of candidate-region images.
//!
//! A [`BatchJob`] goes through two phases. Discovery classifies the input once,
//! clearing the persistence flag of every candidate-region image and setting
//! aside duplicates. Processing then takes each candidate region in input
//! order, finds its reference image, stages the candidate region next to it,
//! runs the matcher, and checks what it left behind.
//!
//! Items are processed one at a time: the matcher is expensive, and its log
//! file is shared by everything in a directory.
//!
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use mmbatch_library::{BatchJob, Options};
//! use mmbatch_process::Matcher;
//! use std::path::PathBuf;
//!
//! let matcher = Matcher::discover(None, "mmprocess")?;
//! let job = BatchJob::scan(&[PathBuf::from("/data/encounters")]).await?;
//! let summary = job.run(&matcher, &Options::default()).await?;
//! println!("{} of {} processed", summary.processed, summary.total);
//! # Ok(())
//! # }
//! ```

mod item;

pub use self::item::{Action, Outcome};
use crate::Warning;
use crate::batch::item::process_item;
use crate::error::{ErrorKind, Result};
use async_stream::stream;
use exn::ResultExt;
use futures::{Stream, TryStreamExt, future};
use mmbatch_process::Runner;
use mmbatch_storage::{DirectoryIndex, MediaItem};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Progress events emitted by [`BatchJob::process`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started) exactly once.
/// 2. [`DiscoveryComplete`](Self::DiscoveryComplete) exactly once, with the
///    number of candidate regions to process.
/// 3. [`Processed`](Self::Processed) once per candidate region handled.
/// 4. Either [`Cancelled`](Self::Cancelled) or [`Complete`](Self::Complete).
///
/// A systemic error terminates the stream early, in which case neither of
/// the final events is emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    Started,
    DiscoveryComplete(u64),
    /// `index` counts from zero in processing order.
    Processed { index: u64, outcome: Outcome },
    /// The cancellation token fired; the remaining items were left alone.
    Cancelled,
    Complete,
}

/// Lifecycle of a [`BatchJob`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Scanning,
    Ready,
    /// Working on the candidate region at this position of the worklist.
    Processing(usize),
    Done,
}

/// Knobs for a batch run.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Pause after each item. `None` only yields to the scheduler, and a zero
    /// duration doesn't pause at all.
    pub pacing: Option<Duration>,
    /// Checked between items; a matcher that's already running is allowed
    /// to finish.
    pub cancel: CancellationToken,
}
impl Options {
    pub fn with_pacing(mut self, pacing: impl Into<Option<Duration>>) -> Self {
        self.pacing = pacing.into();
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// What a finished (or cancelled) run amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Candidate regions found during discovery.
    pub total: u64,
    /// Candidate regions handled, whatever their outcome.
    pub processed: u64,
    pub warnings: Vec<Warning>,
    pub cancelled: bool,
    /// The input, with persistence flags as updated by discovery.
    pub items: Vec<MediaItem>,
}

pub struct BatchJob {
    items: Vec<MediaItem>,
    /// Positions in `items` of the candidate regions to process.
    worklist: Vec<usize>,
    warnings: Vec<Warning>,
    processed: u64,
    total: u64,
    state: State,
    cancelled: bool,
    index: DirectoryIndex,
}
impl BatchJob {
    pub fn new(items: Vec<MediaItem>) -> Self {
        Self {
            items,
            worklist: Vec::new(),
            warnings: Vec::new(),
            processed: 0,
            total: 0,
            state: State::Scanning,
            cancelled: false,
            index: DirectoryIndex::new(),
        }
    }

    /// Builds a job from every file under `roots`.
    pub async fn scan(roots: &[PathBuf]) -> Result<Self> {
        let items = mmbatch_storage::scan(roots).await.or_raise(|| ErrorKind::Storage)?;
        Ok(Self::new(items))
    }

    /// Classifies the input and returns the number of candidate regions to
    /// process. Only the first call does any work.
    pub fn discover(&mut self) -> u64 {
        if self.state != State::Scanning {
            return self.total;
        }
        let mut seen = HashSet::new();
        for (position, item) in self.items.iter_mut().enumerate() {
            if !item.is_candidate() {
                continue;
            }
            item.set_persist(false);
            if seen.insert(item.path().to_path_buf()) {
                tracing::trace!(path = %item.path().display(), "Found candidate-region image");
                self.worklist.push(position);
            } else {
                tracing::warn!(path = %item.path().display(), "Duplicate candidate-region image file");
                self.warnings.push(Warning::DuplicateFile { file: item.path().to_path_buf() });
            }
        }
        // Infallible: a usize (either 32- or 64-bit) will always fit in a u64.
        self.total = u64::try_from(self.worklist.len()).unwrap_or(0);
        self.state = State::Ready;
        tracing::debug!(total = self.total, items = self.items.len(), "Discovery complete");
        self.total
    }

    /// Streams [`BatchEvent`]s while processing every candidate region,
    /// running discovery first if it hasn't happened yet.
    ///
    /// A job is processed at most once: on a finished job the stream only
    /// reports discovery and completion.
    pub fn process<'a>(
        &'a mut self,
        runner: &'a dyn Runner,
        options: &'a Options,
    ) -> impl Stream<Item = Result<BatchEvent>> + 'a {
        let job = self;
        // `rustfmt` does not format macros that use braces. Wrap in parentheses!
        stream!({
            yield Ok(BatchEvent::Started);
            let total = job.discover();
            yield Ok(BatchEvent::DiscoveryComplete(total));
            if job.state == State::Done {
                yield Ok(BatchEvent::Complete);
                return;
            }
            tracing::info!(total, "Processing candidate-region images");

            for position in 0..job.worklist.len() {
                if options.cancel.is_cancelled() {
                    tracing::info!(processed = job.processed, total, "Batch cancelled");
                    job.cancelled = true;
                    job.state = State::Done;
                    yield Ok(BatchEvent::Cancelled);
                    return;
                }
                job.state = State::Processing(position);
                let item = job.items[job.worklist[position]].clone();
                let outcome = match process_item(&item, &job.items, &mut job.index, runner).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        job.state = State::Done;
                        yield Err(e);
                        return;
                    },
                };
                job.warnings.extend(outcome.warnings.iter().cloned());
                job.processed += 1;
                if let Err(e) = job.index.refresh(item.directory()).await.or_raise(|| ErrorKind::Storage) {
                    job.state = State::Done;
                    yield Err(e);
                    return;
                }
                // Infallible: see `discover`.
                let index = u64::try_from(position).unwrap_or(0);
                yield Ok(BatchEvent::Processed { index, outcome });
                pace(options).await;
            }

            job.state = State::Done;
            tracing::info!(processed = job.processed, warnings = job.warnings.len(), "Batch complete");
            yield Ok(BatchEvent::Complete);
        })
    }

    /// Processes the whole job, returning its [`Summary`].
    pub async fn run(mut self, runner: &dyn Runner, options: &Options) -> Result<Summary> {
        self.process(runner, options).try_for_each(|_| future::ok(())).await?;
        Ok(self.into_summary())
    }

    pub fn into_summary(self) -> Summary {
        Summary {
            total: self.total,
            processed: self.processed,
            warnings: self.warnings,
            cancelled: self.cancelled,
            items: self.items,
        }
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn state(&self) -> State {
        self.state
    }
}

async fn pace(options: &Options) {
    match options.pacing {
        None => tokio::task::yield_now().await,
        Some(delay) if delay.is_zero() => {},
        Some(delay) => {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {},
                _ = options.cancel.cancelled() => {},
            }
        },
    }
}
