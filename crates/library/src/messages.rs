//! User-facing text for warnings and progress.
//!
//! Each message is an [upon] template looked up by key. The built-in catalog
//! is English; any key can be replaced, e.g. from the `[messages]` section of
//! the configuration file.
//!
//! # Template Variables
//!
//! | Variable    | Keys                  | Description                                  |
//! |-------------|-----------------------|----------------------------------------------|
//! | `file`      | every warning         | File name of the candidate-region image      |
//! | `path`      | every warning         | Full path of the candidate-region image      |
//! | `other`     | every warning         | Full path of the reference image, or empty   |
//! | `processed` | `status`              | Items handled so far                         |
//! | `total`     | `status`              | Items discovered                             |
//!
//! ```
//! use mmbatch_library::{Catalog, Warning};
//!
//! let mut catalog = Catalog::new().unwrap();
//! catalog.set("no-reference", "kein Referenzbild: {{ file }}").unwrap();
//! let warning = Warning::NoReference { file: "/data/foo_CR.jpg".into() };
//! assert_eq!(catalog.render(&warning).unwrap(), "kein Referenzbild: foo_CR.jpg");
//! ```

use crate::Warning;
use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use std::collections::BTreeMap;
use upon::{Engine, Template};

/// Key of the progress message.
pub const STATUS_KEY: &str = "status";

const BUILT_IN: [(&str, &str); 6] = [
    (STATUS_KEY, "Processing MantaMatcher images: {{ processed }} of {{ total }}"),
    ("duplicate-file", "Duplicate candidate-region image ignored: {{ file }}"),
    ("no-reference", "No reference image found for {{ file }}; matched against itself"),
    ("duplicate", "Candidate region already processed for {{ other }}; skipped {{ file }}"),
    ("file-not-found", "Reference image not found: {{ other }}"),
    ("processing-failed", "MantaMatcher processing failed for {{ file }}"),
];

/// Compiled message templates keyed by message key.
pub struct Catalog {
    engine: Engine<'static>,
    templates: BTreeMap<&'static str, Template<'static>>,
}
impl Catalog {
    /// The built-in English catalog.
    pub fn new() -> Result<Self> {
        let mut catalog = Self { engine: Engine::new(), templates: BTreeMap::new() };
        for (key, source) in BUILT_IN {
            let template = catalog.compile(key, source)?;
            catalog.templates.insert(key, template);
        }
        Ok(catalog)
    }

    /// The built-in catalog with some templates replaced.
    pub fn with_overrides<K, V>(overrides: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut catalog = Self::new()?;
        for (key, source) in overrides {
            catalog.set(key.as_ref(), source.as_ref())?;
        }
        Ok(catalog)
    }

    /// Replaces the template for `key`. Unknown keys are ignored, since
    /// nothing would ever render them.
    pub fn set(&mut self, key: &str, source: &str) -> Result<()> {
        let Some(&(key, _)) = BUILT_IN.iter().find(|(k, _)| *k == key) else {
            tracing::warn!(key, "Ignoring template for unknown message key");
            return Ok(());
        };
        let template = self.compile(key, source)?;
        self.templates.insert(key, template);
        Ok(())
    }

    pub fn render(&self, warning: &Warning) -> Result<String> {
        let file = warning.file();
        let name = file.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        self.render_key(
            warning.key(),
            upon::value! {
                file: name,
                path: file.display().to_string(),
                other: warning.other().map(|p| p.display().to_string()).unwrap_or_default(),
            },
        )
    }

    /// The progress message.
    pub fn status(&self, processed: u64, total: u64) -> Result<String> {
        self.render_key(STATUS_KEY, upon::value! { processed: processed, total: total })
    }

    fn render_key(&self, key: &str, values: upon::Value) -> Result<String> {
        let template = self.templates.get(key).ok_or_raise(|| ErrorKind::Template(key.to_string()))?;
        template.render(&self.engine, values).to_string().or_raise(|| ErrorKind::Template(key.to_string()))
    }

    fn compile(&self, key: &str, source: &str) -> Result<Template<'static>> {
        self.engine.compile(source.to_string()).or_raise(|| ErrorKind::Template(key.to_string()))
    }
}
