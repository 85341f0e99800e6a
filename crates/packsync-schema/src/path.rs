//! Pack-relative paths.
//!
//! Catalog entries name their destination relative to the pack root using
//! forward slashes. [`PackPath`] keeps that form normalized and refuses paths
//! that would land outside the installation directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from [`PackPath::new`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path is empty after normalization.
    #[error("Empty pack path")]
    Empty,

    /// The path is absolute (leading `/` or a drive prefix).
    #[error("Pack path must be relative: {0}")]
    Absolute(String),

    /// A `..` component would escape the pack root.
    #[error("Pack path escapes the pack root: {0}")]
    Escapes(String),
}

/// A normalized, forward-slash path relative to the pack root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackPath(String);

impl PackPath {
    /// Normalize `raw` into a pack path.
    ///
    /// Backslashes become `/`, empty and `.` segments are dropped, and `..`
    /// pops the previous segment.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] if the path is empty, absolute, or climbs above
    /// the root.
    pub fn new(raw: &str) -> Result<Self, PathError> {
        let unified = raw.replace('\\', "/");
        if unified.starts_with('/') || unified.split('/').next().is_some_and(|s| s.ends_with(':'))
        {
            return Err(PathError::Absolute(raw.to_string()));
        }

        let mut segments: Vec<&str> = Vec::new();
        for segment in unified.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(PathError::Escapes(raw.to_string()));
                    }
                }
                s => segments.push(s),
            }
        }

        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(Self(segments.join("/")))
    }

    /// The normalized string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Parent directory, or `None` for a top-level entry.
    pub fn parent(&self) -> Option<PackPath> {
        self.0.rsplit_once('/').map(|(dir, _)| Self(dir.to_string()))
    }

    /// Sibling path with the last segment replaced by `name`.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] if the resulting path is invalid (e.g. `name`
    /// climbs out of the root).
    pub fn with_file_name(&self, name: &str) -> Result<PackPath, PathError> {
        match self.parent() {
            Some(dir) => Self::new(&format!("{}/{name}", dir.0)),
            None => Self::new(name),
        }
    }

    /// Resolve against an installation root into a native absolute path.
    pub fn rebase(&self, root: &Path) -> PathBuf {
        self.0
            .split('/')
            .fold(root.to_path_buf(), |acc, segment| acc.join(segment))
    }
}

impl std::fmt::Display for PackPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for PackPath {
    type Error = PathError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(&s)
    }
}

impl From<PackPath> for String {
    fn from(p: PackPath) -> Self {
        p.0
    }
}

impl AsRef<str> for PackPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_separators_and_dots() {
        let p = PackPath::new("mods\\./extra//a.jar").unwrap();
        assert_eq!(p.as_str(), "mods/extra/a.jar");
        assert_eq!(p.file_name(), "a.jar");
        assert_eq!(p.parent().unwrap().as_str(), "mods/extra");
    }

    #[test]
    fn dot_dot_inside_root_is_allowed() {
        let p = PackPath::new("mods/../config/x.toml").unwrap();
        assert_eq!(p.as_str(), "config/x.toml");
    }

    #[test]
    fn rejects_escape_and_absolute() {
        assert!(matches!(PackPath::new("../x"), Err(PathError::Escapes(_))));
        assert!(matches!(PackPath::new("/etc/passwd"), Err(PathError::Absolute(_))));
        assert!(matches!(PackPath::new("C:/x"), Err(PathError::Absolute(_))));
        assert_eq!(PackPath::new("./"), Err(PathError::Empty));
    }

    #[test]
    fn with_file_name_keeps_directory() {
        let p = PackPath::new("mods/sodium.pw.toml").unwrap();
        assert_eq!(p.with_file_name("sodium-0.5.jar").unwrap().as_str(), "mods/sodium-0.5.jar");
        let top = PackPath::new("a.pw.toml").unwrap();
        assert_eq!(top.with_file_name("a.jar").unwrap().as_str(), "a.jar");
    }

    #[test]
    fn rebase_joins_segments() {
        let root = tempfile::tempdir().unwrap();
        let p = PackPath::new("config/mod/settings.json").unwrap();
        assert_eq!(
            p.rebase(root.path()),
            root.path().join("config").join("mod").join("settings.json")
        );
    }
}
