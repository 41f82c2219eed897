use crate::error::{ErrorKind, Result};
use std::path::{Path, PathBuf};

/// Program name looked up on `PATH` when no executable is configured.
pub const DEFAULT_PROGRAM: &str = "mmprocess";
/// Where the matcher is traditionally installed.
pub const FALLBACK_LOCATION: &str = "/usr/bin/mmprocess";

/// Locates the matcher executable.
///
/// An explicitly configured path wins and must exist. Otherwise `program` is
/// searched for on `PATH`, then the traditional install location is tried.
pub(crate) fn discover(explicit: Option<&Path>, program: &str) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        tracing::warn!(path = %path.display(), "Configured matcher executable does not exist");
        exn::bail!(ErrorKind::MatcherNotFound(path.display().to_string()));
    }
    if let Ok(path) = which::which(program) {
        tracing::debug!(path = %path.display(), "Discovered matcher on PATH");
        return Ok(path);
    }
    tracing::info!(program, "Matcher executable not found in PATH");
    let fallback = Path::new(FALLBACK_LOCATION);
    if fallback.is_file() {
        return Ok(fallback.to_path_buf());
    }
    exn::bail!(ErrorKind::MatcherNotFound(program.to_string()));
}
