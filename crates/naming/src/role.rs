//! Match-set roles and the artifact paths derived from them.
//!
//! Every file in a match-set lives in the same directory and shares a base
//! name, differing only by a role suffix: `<base>_CR.<ext>`, `<base>_EH.<ext>`,
//! `<base>_FT.<ext>` and `<base>_FEAT.<ext>`. Mapping is a pure function of
//! `(directory, base, extension)` and never touches the filesystem.

use crate::classify::is_image_extension;
use crate::error::{ErrorKind, Result};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

/// A file's role within a match-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Candidate region, staged from the uploaded `_CR` image.
    Cr,
    /// Generated by the matcher.
    Eh,
    /// Generated by the matcher.
    Ft,
    /// Generated by the matcher; the last artifact written, so its absence
    /// marks an interrupted run.
    Feat,
}
impl Role {
    pub const ALL: [Role; 4] = [Role::Cr, Role::Eh, Role::Ft, Role::Feat];
    /// The roles the external matcher is responsible for producing.
    pub const GENERATED: [Role; 3] = [Role::Eh, Role::Ft, Role::Feat];

    /// Filename suffix (without the leading underscore).
    pub fn suffix(&self) -> &'static str {
        match self {
            Role::Cr => "CR",
            Role::Eh => "EH",
            Role::Ft => "FT",
            Role::Feat => "FEAT",
        }
    }

    /// The role a file stem is named for, if it ends in `_<ROLE>` after a
    /// non-empty base.
    pub fn from_stem(stem: &str) -> Option<Role> {
        Self::ALL.into_iter().find(|role| {
            stem.strip_suffix(role.suffix())
                .and_then(|base| base.strip_suffix('_'))
                .is_some_and(|base| !base.is_empty())
        })
    }
}
impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.suffix())
    }
}

/// Canonical paths for every [`Role`] of one match-set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactPaths {
    directory: PathBuf,
    base: String,
    extension: String,
}
impl ArtifactPaths {
    pub fn new(directory: impl Into<PathBuf>, base: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            base: base.into(),
            extension: extension.into(),
        }
    }

    /// Derives the match-set paths for a reference image.
    ///
    /// The base is the image's whole file stem, since the matcher names its
    /// output after the path it was given. A candidate region used as its own
    /// reference therefore gets a separate set (`foo_CR_CR.jpg`, ...).
    ///
    /// ```
    /// use mmbatch_naming::{ArtifactPaths, Role};
    /// use std::path::Path;
    ///
    /// let paths = ArtifactPaths::for_image("/data/foo.jpg").unwrap();
    /// assert_eq!(paths.get(Role::Cr), Path::new("/data/foo_CR.jpg"));
    /// assert_eq!(paths.get(Role::Feat), Path::new("/data/foo_FEAT.jpg"));
    ///
    /// let own = ArtifactPaths::for_image("/data/foo_CR.jpg").unwrap();
    /// assert_eq!(own.get(Role::Cr), Path::new("/data/foo_CR_CR.jpg"));
    /// ```
    pub fn for_image(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let invalid = || ErrorKind::InvalidImagePath(path.to_path_buf());
        let (Some(stem), Some(extension)) = (
            path.file_stem().and_then(|s| s.to_str()),
            path.extension().and_then(|e| e.to_str()),
        ) else {
            exn::bail!(invalid());
        };
        if !is_image_extension(extension) {
            exn::bail!(invalid());
        }
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self::new(directory, stem, extension))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Path of the file playing `role` in this match-set.
    pub fn get(&self, role: Role) -> PathBuf {
        self.directory.join(format!("{}_{}.{}", self.base, role.suffix(), self.extension))
    }

    /// Every role paired with its path, in [`Role::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Role, PathBuf)> + '_ {
        Role::ALL.into_iter().map(|role| (role, self.get(role)))
    }
}

/// Which match-set files were found on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Presence {
    pub cr: bool,
    pub eh: bool,
    pub ft: bool,
    pub feat: bool,
}
impl Presence {
    pub fn set(&mut self, role: Role, present: bool) {
        match role {
            Role::Cr => self.cr = present,
            Role::Eh => self.eh = present,
            Role::Ft => self.ft = present,
            Role::Feat => self.feat = present,
        }
    }

    pub fn contains(&self, role: Role) -> bool {
        match role {
            Role::Cr => self.cr,
            Role::Eh => self.eh,
            Role::Ft => self.ft,
            Role::Feat => self.feat,
        }
    }

    /// All three generated artifacts exist.
    pub fn generated(&self) -> bool {
        Role::GENERATED.iter().all(|role| self.contains(*role))
    }

    pub fn status(&self) -> MatchStatus {
        match (self.cr && self.generated(), self.eh && self.ft && !self.feat) {
            (true, _) => MatchStatus::Complete,
            (false, true) => MatchStatus::Failed,
            (false, false) => MatchStatus::Incomplete,
        }
    }
}

/// Overall state of a match-set, judged from [`Presence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    /// CR, EH, FT and FEAT all exist.
    Complete,
    /// EH and FT exist but FEAT does not. Must be cleaned up.
    Failed,
    /// Anything else.
    Incomplete,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/data/foo.jpg", "/data", "foo", "jpg")]
    #[case("/data/foo_CR.jpg", "/data", "foo_CR", "jpg")]
    #[case("/data/foo_EH.PNG", "/data", "foo_EH", "PNG")]
    #[case("/data/foo-ID.jpg", "/data", "foo-ID", "jpg")]
    #[case("/data/foo.bar.jpeg", "/data", "foo.bar", "jpeg")]
    #[case("/data/_CR.jpg", "/data", "_CR", "jpg")]
    #[case("foo.jpg", "", "foo", "jpg")]
    fn test_for_image(#[case] path: &str, #[case] directory: &str, #[case] base: &str, #[case] extension: &str) {
        let paths = ArtifactPaths::for_image(path).unwrap();
        assert_eq!(paths.directory(), Path::new(directory));
        assert_eq!(paths.base(), base);
        assert_eq!(paths.extension(), extension);
    }

    #[rstest]
    #[case("/data/foo")]
    #[case("/data/foo.txt")]
    #[case("/data/.jpg")]
    fn test_for_image_invalid(#[case] path: &str) {
        let err = ArtifactPaths::for_image(path).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidImagePath(path.into()));
    }

    #[test]
    fn test_role_paths() {
        let paths = ArtifactPaths::new("/data/2013", "manta", "jpg");
        let all: Vec<_> = paths.iter().collect();
        assert_eq!(
            all,
            vec![
                (Role::Cr, PathBuf::from("/data/2013/manta_CR.jpg")),
                (Role::Eh, PathBuf::from("/data/2013/manta_EH.jpg")),
                (Role::Ft, PathBuf::from("/data/2013/manta_FT.jpg")),
                (Role::Feat, PathBuf::from("/data/2013/manta_FEAT.jpg")),
            ]
        );
    }

    #[test]
    fn test_self_reference_paths() {
        let paths = ArtifactPaths::for_image("/data/foo_CR.jpg").unwrap();
        for (role, path) in paths.iter() {
            assert_eq!(path, PathBuf::from(format!("/data/foo_CR_{role}.jpg")));
        }
        assert_ne!(paths.get(Role::Cr), Path::new("/data/foo_CR.jpg"));
    }

    #[rstest]
    #[case(Presence { cr: true, eh: true, ft: true, feat: true }, MatchStatus::Complete)]
    #[case(Presence { cr: true, eh: true, ft: true, feat: false }, MatchStatus::Failed)]
    #[case(Presence { cr: false, eh: true, ft: true, feat: false }, MatchStatus::Failed)]
    #[case(Presence { cr: false, eh: true, ft: true, feat: true }, MatchStatus::Incomplete)]
    #[case(Presence { cr: true, eh: false, ft: true, feat: true }, MatchStatus::Incomplete)]
    #[case(Presence { cr: true, eh: false, ft: false, feat: false }, MatchStatus::Incomplete)]
    #[case(Presence::default(), MatchStatus::Incomplete)]
    fn test_status(#[case] presence: Presence, #[case] expected: MatchStatus) {
        assert_eq!(presence.status(), expected);
    }

    #[rstest]
    #[case("foo_CR", Some(Role::Cr))]
    #[case("foo_FEAT", Some(Role::Feat))]
    #[case("foo_FT", Some(Role::Ft))]
    #[case("foo-ID", None)]
    #[case("foo_cr", None)]
    #[case("_EH", None)]
    #[case("fooEH", None)]
    fn test_from_stem(#[case] stem: &str, #[case] expected: Option<Role>) {
        assert_eq!(Role::from_stem(stem), expected);
    }

    #[test]
    fn test_presence_set() {
        let mut presence = Presence::default();
        for role in Role::GENERATED {
            presence.set(role, true);
        }
        assert!(presence.generated());
        assert!(!presence.contains(Role::Cr));
    }
}
