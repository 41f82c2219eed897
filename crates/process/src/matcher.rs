use crate::discover::discover;
use crate::error::{ErrorKind, Result};
use crate::{Execution, Runner, Status, require_staged};
use async_trait::async_trait;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::fs;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::instrument;

/// Fixed flags passed to the matcher after the image path.
pub const DEFAULT_ARGUMENTS: [&str; 3] = ["4", "1", "2"];
/// Name of the log file written next to the processed image.
pub const DEFAULT_LOG_FILE: &str = "mmprocess.log";

/// The real matcher executable.
///
/// Invocations are serialized through a single-permit semaphore: the log file
/// name is shared per directory and the matcher is expensive, so at most one
/// child process runs per `Matcher` regardless of how many tasks call it.
pub struct Matcher {
    executable: PathBuf,
    arguments: Vec<String>,
    log_file: String,
    timeout: Option<Duration>,
    slot: Semaphore,
}
impl Matcher {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            arguments: DEFAULT_ARGUMENTS.iter().map(ToString::to_string).collect(),
            log_file: DEFAULT_LOG_FILE.to_string(),
            timeout: None,
            slot: Semaphore::new(1),
        }
    }

    /// Locates the executable (see [`DEFAULT_PROGRAM`](crate::DEFAULT_PROGRAM))
    /// and builds a matcher with default settings.
    pub fn discover(explicit: Option<&Path>, program: &str) -> Result<Self> {
        Ok(Self::new(discover(explicit, program)?))
    }

    pub fn with_arguments(mut self, arguments: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.arguments = arguments.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_log_file(mut self, name: impl Into<String>) -> Self {
        self.log_file = name.into();
        self
    }

    /// Kill the matcher if it runs longer than `timeout`. `None` waits forever.
    pub fn with_timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.timeout = timeout.into();
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    async fn execute(&self, image: &Path, directory: &Path, log: &Path) -> Result<Status> {
        // Truncates any log left behind by a previous item in this directory.
        let out = fs::File::create(log).await.or_raise(|| ErrorKind::Log(log.to_path_buf()))?.into_std().await;
        // Both streams share one file description (and offset), so output
        // interleaves in the order the matcher wrote it.
        let err = out.try_clone().or_raise(|| ErrorKind::Log(log.to_path_buf()))?;
        let mut child = Command::new(&self.executable)
            .arg(image)
            .args(&self.arguments)
            .current_dir(directory)
            .stdin(Stdio::null())
            .stdout(out)
            .stderr(err)
            .kill_on_drop(true)
            .spawn()
            .or_raise(|| ErrorKind::Spawn(self.executable.clone()))?;

        let exit = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(exit) => exit,
                Err(_) => {
                    tracing::warn!(timeout = ?limit, "Matcher exceeded timeout; killing");
                    child.kill().await.or_raise(|| ErrorKind::Log(log.to_path_buf()))?;
                    return Ok(Status::TimedOut);
                },
            },
            None => child.wait().await,
        };
        let exit = exit.or_raise(|| ErrorKind::Log(log.to_path_buf()))?;
        Ok(match exit.code() {
            Some(0) => Status::Success,
            Some(code) => Status::Failed(code),
            None => Status::Signalled,
        })
    }
}

#[async_trait]
impl Runner for Matcher {
    #[instrument(skip_all, fields(image = %image.display()))]
    async fn run(&self, image: &Path) -> Result<Execution> {
        let paths = require_staged(image).await?;
        let directory = paths.directory().to_path_buf();
        let log = directory.join(&self.log_file);

        // The semaphore is never closed, so acquiring can't fail.
        let _permit = self.slot.acquire().await.ok();
        tracing::trace!(executable = %self.executable.display(), "Running matcher");
        let status = self.execute(image, &directory, &log).await?;

        if status.is_success() {
            if let Err(e) = fs::remove_file(&log).await {
                tracing::warn!(log = %log.display(), error = %e, "Could not remove matcher log");
            }
        } else {
            tracing::warn!(status = ?status, log = %log.display(), "Matcher did not succeed; log retained");
        }
        Ok(Execution { status, log })
    }
}
