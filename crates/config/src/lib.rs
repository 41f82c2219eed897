//! Layered configuration for mmbatch.
//!
//! Sources are merged in increasing order of precedence:
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. A configuration file: either the one passed explicitly, or any of
//!    `config.toml`, `config.yaml`, `config.yml` and `config.json` found in the
//!    platform configuration directory (e.g. `~/.config/mmbatch/`).
//! 3. Environment variables prefixed with `MMBATCH_`, using `__` to descend
//!    into sections (`MMBATCH_MATCHER__TIMEOUT_SECS=600`).
//!
//! ```toml
//! [matcher]
//! executable = "/opt/mantamatcher/bin/mmprocess"
//! arguments = ["4", "1", "2"]
//! timeout_secs = 1800
//!
//! [batch]
//! pacing_ms = 250
//!
//! [messages]
//! no-reference = "Kein Referenzbild für {{ file }} gefunden"
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "MMBATCH_";
const DEFAULT_TIMEOUT_SECS: u64 = 60 * 60;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub matcher: MatcherConfig,
    pub batch: BatchConfig,
    /// Message template overrides, keyed by message key.
    pub messages: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Exact path to the matcher. Takes precedence over `program`.
    pub executable: Option<PathBuf>,
    /// Program name searched for on `PATH`.
    pub program: String,
    /// Arguments passed after the image path.
    pub arguments: Vec<String>,
    /// Seconds before a running matcher is killed. Omit to wait indefinitely.
    pub timeout_secs: Option<u64>,
    /// Log file name, created in each processed image's directory.
    pub log_file: String,
}
impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            executable: None,
            program: "mmprocess".to_string(),
            arguments: vec!["4".to_string(), "1".to_string(), "2".to_string()],
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            log_file: "mmprocess.log".to_string(),
        }
    }
}
impl MatcherConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Pause between items, in milliseconds. Omit to merely yield to the
    /// scheduler; `0` disables pacing entirely.
    pub pacing_ms: Option<u64>,
}

impl Config {
    /// Loads configuration from every source.
    ///
    /// # Errors
    /// - [`NotFound`](ErrorKind::NotFound) if `explicit` doesn't exist.
    /// - [`UnsupportedFormat`](ErrorKind::UnsupportedFormat) for an unknown extension.
    /// - [`Malformed`](ErrorKind::Malformed) or [`Invalid`](ErrorKind::Invalid)
    ///   if the merged result doesn't describe a usable configuration.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config: Self = Self::figment(explicit)?.extract().or_raise(|| ErrorKind::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    /// Builds the merged [`Figment`] without extracting it.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        match explicit {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
                }
                figment = merge_file(figment, path)?;
            },
            None => {
                for path in default_files() {
                    if path.is_file() {
                        tracing::debug!(path = %path.display(), "Loading configuration file");
                        figment = merge_file(figment, &path)?;
                    }
                }
            },
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    fn validate(&self) -> Result<()> {
        if self.matcher.timeout_secs == Some(0) {
            exn::bail!(ErrorKind::Invalid {
                field: "matcher.timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.matcher.program.trim().is_empty() && self.matcher.executable.is_none() {
            exn::bail!(ErrorKind::Invalid {
                field: "matcher.program",
                reason: "must not be empty".to_string(),
            });
        }
        let log = Path::new(&self.matcher.log_file);
        if self.matcher.log_file.is_empty() || log.file_name() != Some(log.as_os_str()) {
            exn::bail!(ErrorKind::Invalid {
                field: "matcher.log_file",
                reason: format!("must be a plain file name, got `{}`", self.matcher.log_file),
            });
        }
        Ok(())
    }

    /// Pause between batch items: `None` to yield only, zero for no pacing.
    pub fn pacing(&self) -> Option<Duration> {
        self.batch.pacing_ms.map(Duration::from_millis)
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file(path)),
        Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}

fn default_files() -> Vec<PathBuf> {
    let Some(dirs) = ProjectDirs::from("org", "ecocean", "mmbatch") else {
        tracing::debug!("No home directory; skipping configuration directory");
        return Vec::new();
    };
    ["config.toml", "config.yaml", "config.yml", "config.json"].iter().map(|name| dirs.config_dir().join(name)).collect()
}
