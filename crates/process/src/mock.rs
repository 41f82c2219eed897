//! Scriptable in-process matcher for testing.

use crate::error::{ErrorKind, Result};
use crate::{Execution, Runner, Status, require_staged};
use async_trait::async_trait;
use exn::ResultExt;
use mmbatch_naming::Role;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// In-process stand-in for the matcher executable.
///
/// Writes the configured artifacts next to the image, records every
/// invocation, and tracks how many invocations were ever in flight at once so
/// tests can assert on sequential execution. Honours the same precondition as
/// [`Matcher`](crate::Matcher).
///
/// # Examples
///
/// ```
/// use mmbatch_process::{MockRunner, Runner, Status};
/// use mmbatch_naming::Role;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dir = tempfile::tempdir()?;
/// std::fs::write(dir.path().join("foo_CR.jpg"), b"cr")?;
/// let runner = MockRunner::producing([Role::Eh, Role::Ft], 1);
/// let execution = runner.run(&dir.path().join("foo.jpg")).await?;
/// assert_eq!(execution.status, Status::Failed(1));
/// assert!(dir.path().join("foo_FT.jpg").exists());
/// assert!(!dir.path().join("foo_FEAT.jpg").exists());
/// # Ok(())
/// # }
/// ```
pub struct MockRunner {
    produces: Vec<Role>,
    exit_code: i32,
    delay: Option<Duration>,
    invocations: Mutex<Vec<PathBuf>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}
impl MockRunner {
    /// A matcher that writes EH, FT and FEAT and exits zero.
    pub fn succeeding() -> Self {
        Self::producing(Role::GENERATED, 0)
    }

    /// A matcher that writes only `roles` and exits with `exit_code`.
    pub fn producing(roles: impl IntoIterator<Item = Role>, exit_code: i32) -> Self {
        Self {
            produces: roles.into_iter().collect(),
            exit_code,
            delay: None,
            invocations: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Pretend each invocation takes `delay` to finish.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Images the runner was invoked on, in call order.
    pub fn invocations(&self) -> Vec<PathBuf> {
        self.invocations.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// The largest number of invocations that were ever running at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Runner for MockRunner {
    async fn run(&self, image: &Path) -> Result<Execution> {
        let paths = require_staged(image).await?;
        self.invocations.lock().unwrap_or_else(PoisonError::into_inner).push(image.to_path_buf());
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(active, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let log = paths.directory().join(crate::DEFAULT_LOG_FILE);
        let written = async {
            for role in &self.produces {
                let path = paths.get(*role);
                tokio::fs::write(&path, role.suffix()).await.or_raise(|| ErrorKind::Log(path.clone()))?;
            }
            if self.exit_code != 0 {
                let output = format!("mock matcher exited with {}\n", self.exit_code);
                tokio::fs::write(&log, output).await.or_raise(|| ErrorKind::Log(log.clone()))?;
            }
            Ok::<_, crate::error::Error>(())
        }
        .await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        written?;
        let status = match self.exit_code {
            0 => Status::Success,
            code => Status::Failed(code),
        };
        Ok(Execution { status, log })
    }
}
