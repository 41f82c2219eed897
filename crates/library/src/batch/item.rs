use crate::Warning;
use crate::error::{ErrorKind, Result};
use crate::resolve::resolve;
use exn::ResultExt;
use mmbatch_naming::{ArtifactPaths, MatchStatus, Role};
use mmbatch_process::{Runner, Status};
use mmbatch_storage::{DirectoryIndex, MediaItem, StageMode, exists, probe, remove_all, stage};
use std::path::PathBuf;
use tracing::instrument;

/// What happened to one candidate-region image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// The candidate-region image, as it was named before processing.
    pub item: PathBuf,
    /// The image the matcher was (or would have been) run on.
    pub reference: PathBuf,
    pub action: Action,
    /// Warnings raised for this item, in the order they occurred.
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// The matcher produced a complete match-set.
    Matched(Status),
    /// Skipped: the reference already has a candidate region from another
    /// image, or a complete match-set.
    Duplicate,
    /// Skipped: the reference image is gone.
    ReferenceMissing,
    /// The matcher ran but left artifacts missing. `cleaned` is set when the
    /// half-finished match-set was deleted.
    Failed { status: Status, cleaned: bool },
}

/// Runs one candidate-region image through resolve, stage, match and validate.
///
/// Only systemic failures are errors; everything else is reported through
/// the returned [`Outcome`].
#[instrument(skip_all, fields(item = %item.path().display()))]
pub(crate) async fn process_item(
    item: &MediaItem,
    inputs: &[MediaItem],
    index: &mut DirectoryIndex,
    runner: &dyn Runner,
) -> Result<Outcome> {
    let mut warnings = Vec::new();
    let reference = match resolve(item, inputs, index).await? {
        Some(reference) => reference,
        None => {
            tracing::warn!("Unable to find reference image; matching candidate region against itself");
            warnings.push(Warning::NoReference { file: item.path().to_path_buf() });
            item.clone()
        },
    };
    let outcome = |action, warnings| Outcome {
        item: item.path().to_path_buf(),
        reference: reference.path().to_path_buf(),
        action,
        warnings,
    };

    let paths = ArtifactPaths::for_image(reference.path()).or_raise(|| ErrorKind::Resolve)?;
    let target = paths.get(Role::Cr);
    let presence = probe(&paths).await.or_raise(|| ErrorKind::Storage)?;
    if (presence.cr && target != item.path()) || presence.status() == MatchStatus::Complete {
        tracing::warn!(target = %target.display(), "Candidate region already staged for reference; skipping");
        warnings.push(Warning::Duplicate {
            file: item.path().to_path_buf(),
            reference: reference.path().to_path_buf(),
        });
        return Ok(outcome(Action::Duplicate, warnings));
    }
    if !exists(reference.path()).await.or_raise(|| ErrorKind::Storage)? {
        tracing::warn!(reference = %reference.path().display(), "Reference image not found");
        warnings.push(Warning::FileNotFound {
            file: item.path().to_path_buf(),
            reference: reference.path().to_path_buf(),
        });
        return Ok(outcome(Action::ReferenceMissing, warnings));
    }

    // A candidate region that is its own reference is copied to
    // `<stem>_CR_CR.<ext>`; the uploaded image stays out of the match-set.
    let mode = if reference.path() == item.path() { StageMode::Copy } else { StageMode::Move };
    let staged = stage(item.path(), &target, mode).await.or_raise(|| ErrorKind::Storage)?;
    tracing::debug!(?staged, target = %target.display(), "Candidate region staged");

    let execution = runner.run(reference.path()).await.or_raise(|| ErrorKind::Process)?;
    let presence = probe(&paths).await.or_raise(|| ErrorKind::Storage)?;
    if presence.generated() {
        return Ok(outcome(Action::Matched(execution.status), warnings));
    }
    tracing::warn!(status = ?execution.status, log = %execution.log.display(), "Matcher did not produce every artifact");
    warnings.push(Warning::ProcessingFailed {
        file: item.path().to_path_buf(),
        reference: reference.path().to_path_buf(),
    });
    let cleaned = presence.status() == MatchStatus::Failed;
    if cleaned {
        let removed = remove_all(&paths).await.or_raise(|| ErrorKind::Storage)?;
        tracing::debug!(removed, "Removed incomplete match-set");
    }
    Ok(outcome(Action::Failed { status: execution.status, cleaned }, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mmbatch_process::MockRunner;
    use std::fs::{read, write};

    struct Fixture {
        dir: tempfile::TempDir,
        index: DirectoryIndex,
    }
    impl Fixture {
        fn new(files: &[&str]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            for file in files {
                write(dir.path().join(file), file.as_bytes()).unwrap();
            }
            Self { dir, index: DirectoryIndex::new() }
        }

        fn path(&self, file: &str) -> PathBuf {
            self.dir.path().join(file)
        }

        fn item(&self, file: &str) -> MediaItem {
            MediaItem::new(self.path(file)).unwrap()
        }

        fn exists(&self, file: &str) -> bool {
            self.path(file).exists()
        }

        async fn process(&mut self, file: &str, runner: &MockRunner) -> Outcome {
            let item = self.item(file);
            process_item(&item, &[item.clone()], &mut self.index, runner).await.unwrap()
        }
    }

    #[tokio::test]
    async fn test_exact_reference() {
        let mut fixture = Fixture::new(&["foo_CR.jpg", "foo.jpg"]);
        let runner = MockRunner::succeeding();
        let outcome = fixture.process("foo_CR.jpg", &runner).await;
        assert_eq!(outcome.action, Action::Matched(Status::Success));
        assert_eq!(outcome.reference, fixture.path("foo.jpg"));
        assert!(outcome.warnings.is_empty());
        assert_eq!(runner.invocations(), [fixture.path("foo.jpg")]);
        for file in ["foo.jpg", "foo_CR.jpg", "foo_EH.jpg", "foo_FT.jpg", "foo_FEAT.jpg"] {
            assert!(fixture.exists(file), "{file}");
        }
    }

    #[tokio::test]
    async fn test_candidate_region_moves_to_reference() {
        let mut fixture = Fixture::new(&["foo_CR.jpg", "foo-ID.png"]);
        let runner = MockRunner::succeeding();
        let outcome = fixture.process("foo_CR.jpg", &runner).await;
        assert_eq!(outcome.action, Action::Matched(Status::Success));
        assert!(!fixture.exists("foo_CR.jpg"));
        assert_eq!(read(fixture.path("foo-ID_CR.png")).unwrap(), b"foo_CR.jpg");
        for file in ["foo-ID_EH.png", "foo-ID_FT.png", "foo-ID_FEAT.png"] {
            assert!(fixture.exists(file), "{file}");
        }
    }

    #[tokio::test]
    async fn test_self_reference() {
        let mut fixture = Fixture::new(&["foo_CR.jpg"]);
        let runner = MockRunner::succeeding();
        let outcome = fixture.process("foo_CR.jpg", &runner).await;
        assert_eq!(outcome.reference, fixture.path("foo_CR.jpg"));
        assert_eq!(outcome.warnings, [Warning::NoReference { file: fixture.path("foo_CR.jpg") }]);
        assert_eq!(outcome.action, Action::Matched(Status::Success));
        assert_eq!(runner.invocations(), [fixture.path("foo_CR.jpg")]);
        assert_eq!(read(fixture.path("foo_CR.jpg")).unwrap(), b"foo_CR.jpg");
        assert_eq!(read(fixture.path("foo_CR_CR.jpg")).unwrap(), b"foo_CR.jpg");
        for file in ["foo_CR_EH.jpg", "foo_CR_FT.jpg", "foo_CR_FEAT.jpg"] {
            assert!(fixture.exists(file), "{file}");
        }
        assert!(!fixture.exists("foo_FEAT.jpg"));
    }

    #[tokio::test]
    async fn test_self_reference_failure_keeps_upload() {
        let mut fixture = Fixture::new(&["foo_CR.jpg"]);
        let runner = MockRunner::producing([Role::Eh, Role::Ft], 1);
        let outcome = fixture.process("foo_CR.jpg", &runner).await;
        assert_eq!(outcome.action, Action::Failed { status: Status::Failed(1), cleaned: true });
        assert_eq!(outcome.warnings.len(), 2);
        for file in ["foo_CR_CR.jpg", "foo_CR_EH.jpg", "foo_CR_FT.jpg"] {
            assert!(!fixture.exists(file), "{file}");
        }
        assert_eq!(read(fixture.path("foo_CR.jpg")).unwrap(), b"foo_CR.jpg");
    }

    #[tokio::test]
    async fn test_self_reference_already_processed() {
        let mut fixture = Fixture::new(&["foo_CR.jpg"]);
        fixture.process("foo_CR.jpg", &MockRunner::succeeding()).await;

        let runner = MockRunner::succeeding();
        let outcome = fixture.process("foo_CR.jpg", &runner).await;
        assert_eq!(outcome.action, Action::Duplicate);
        assert!(runner.invocations().is_empty());
    }

    #[tokio::test]
    async fn test_reference_already_staged() {
        let mut fixture = Fixture::new(&["foo_CR.jpg", "foo.png", "foo_CR.png"]);
        let runner = MockRunner::succeeding();
        let outcome = fixture.process("foo_CR.jpg", &runner).await;
        assert_eq!(outcome.action, Action::Duplicate);
        assert_eq!(
            outcome.warnings,
            [Warning::Duplicate { file: fixture.path("foo_CR.jpg"), reference: fixture.path("foo.png") }]
        );
        assert!(runner.invocations().is_empty());
        // Neither candidate region was touched.
        assert_eq!(read(fixture.path("foo_CR.png")).unwrap(), b"foo_CR.png");
        assert_eq!(read(fixture.path("foo_CR.jpg")).unwrap(), b"foo_CR.jpg");
    }

    #[tokio::test]
    async fn test_complete_match_set() {
        let mut fixture = Fixture::new(&["foo_CR.jpg", "foo.jpg", "foo_EH.jpg", "foo_FT.jpg", "foo_FEAT.jpg"]);
        let runner = MockRunner::succeeding();
        let outcome = fixture.process("foo_CR.jpg", &runner).await;
        assert_eq!(outcome.action, Action::Duplicate);
        assert!(runner.invocations().is_empty());
    }

    #[tokio::test]
    async fn test_reference_missing() {
        let mut fixture = Fixture::new(&["foo_CR.jpg", "foo.jpg"]);
        // Prime the listing, then pull the reference out from under it.
        fixture.index.listing(fixture.dir.path()).await.unwrap();
        std::fs::remove_file(fixture.path("foo.jpg")).unwrap();

        let runner = MockRunner::succeeding();
        let outcome = fixture.process("foo_CR.jpg", &runner).await;
        assert_eq!(outcome.action, Action::ReferenceMissing);
        assert_eq!(
            outcome.warnings,
            [Warning::FileNotFound { file: fixture.path("foo_CR.jpg"), reference: fixture.path("foo.jpg") }]
        );
        assert!(runner.invocations().is_empty());
        assert!(fixture.exists("foo_CR.jpg"));
    }

    #[tokio::test]
    async fn test_partial_failure_cleans_up() {
        let mut fixture = Fixture::new(&["foo_CR.jpg", "foo.jpg"]);
        let runner = MockRunner::producing([Role::Eh, Role::Ft], 1);
        let outcome = fixture.process("foo_CR.jpg", &runner).await;
        assert_eq!(outcome.action, Action::Failed { status: Status::Failed(1), cleaned: true });
        assert_eq!(
            outcome.warnings,
            [Warning::ProcessingFailed { file: fixture.path("foo_CR.jpg"), reference: fixture.path("foo.jpg") }]
        );
        for file in ["foo_CR.jpg", "foo_EH.jpg", "foo_FT.jpg", "foo_FEAT.jpg"] {
            assert!(!fixture.exists(file), "{file}");
        }
        assert!(fixture.exists("foo.jpg"));
    }

    #[tokio::test]
    async fn test_failure_without_cleanup() {
        let mut fixture = Fixture::new(&["foo_CR.jpg", "foo.jpg"]);
        let runner = MockRunner::producing([Role::Eh], 2);
        let outcome = fixture.process("foo_CR.jpg", &runner).await;
        assert_eq!(outcome.action, Action::Failed { status: Status::Failed(2), cleaned: false });
        assert_eq!(outcome.warnings.len(), 1);
        assert!(fixture.exists("foo_CR.jpg"));
        assert!(fixture.exists("foo_EH.jpg"));
    }

    #[tokio::test]
    async fn test_non_zero_exit_with_every_artifact() {
        let mut fixture = Fixture::new(&["foo_CR.jpg", "foo.jpg"]);
        let runner = MockRunner::producing(Role::GENERATED, 4);
        let outcome = fixture.process("foo_CR.jpg", &runner).await;
        assert_eq!(outcome.action, Action::Matched(Status::Failed(4)));
        assert!(outcome.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_not_a_candidate() {
        let mut fixture = Fixture::new(&["foo.jpg"]);
        let item = fixture.item("foo.jpg");
        let runner = MockRunner::succeeding();
        let err = process_item(&item, &[], &mut fixture.index, &runner).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Resolve);
        assert!(fixture.exists("foo.jpg"));
    }
}
