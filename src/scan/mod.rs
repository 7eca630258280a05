//! Repository scanning
//!
//! Walks a repository and yields one [`ServiceCandidate`] per recognized
//! manifest file. Subtrees on the ignore list are never entered.

mod scanner;

pub use scanner::{ManifestScanner, ManifestWalk, ScanConfig, IGNORED_DIRS};

use crate::stack::ManifestKind;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A manifest found on disk, before classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCandidate {
    /// Absolute directory containing the manifest
    pub root_path: PathBuf,
    pub manifest_path: PathBuf,
    pub raw_manifest: String,
    pub kind: ManifestKind,
    /// `root_path` relative to the scan root; empty for the root itself
    pub relative_root: PathBuf,
    /// Lockfile names present next to the manifest
    pub lockfiles: Vec<String>,
}

impl ServiceCandidate {
    pub fn has_lockfile(&self, name: &str) -> bool {
        self.lockfiles.iter().any(|l| l == name)
    }
}

/// Fatal scan failures; only the root itself can produce one
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Repository path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("Repository path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Repository path cannot be read: {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An entry the walk passed over; surfaced as a warning, never fatal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: String,
}

impl SkippedEntry {
    pub fn new(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SkippedEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skipped {}: {}", self.path.display(), self.reason)
    }
}
