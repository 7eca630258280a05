use super::{ScanError, ServiceCandidate, SkippedEntry};
use crate::stack::{ManifestKind, LOCKFILES};
use ignore::{DirEntry, WalkBuilder};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Directory names never descended into
pub const IGNORED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "vendor",
    "target",
    "dist",
    "build",
    "out",
    ".next",
    "__pycache__",
    ".venv",
    "venv",
    ".tox",
    ".gradle",
    ".idea",
    "coverage",
];

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub max_depth: usize,
    pub max_manifest_bytes: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_depth: 12,
            max_manifest_bytes: 1024 * 1024,
        }
    }
}

pub struct ManifestScanner {
    root: PathBuf,
    config: ScanConfig,
}

impl ManifestScanner {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, ScanError> {
        let root = root.as_ref();
        if !root.exists() {
            return Err(ScanError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }
        std::fs::read_dir(root).map_err(|source| ScanError::Unreadable {
            path: root.to_path_buf(),
            source,
        })?;
        let root = root.canonicalize().map_err(|source| ScanError::Unreadable {
            path: root.to_path_buf(),
            source,
        })?;

        debug!(root = %root.display(), "ManifestScanner initialized");

        Ok(Self {
            root,
            config: ScanConfig::default(),
        })
    }

    pub fn with_config(mut self, config: ScanConfig) -> Self {
        self.config = config;
        self
    }

    /// Canonical scan root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Starts a fresh walk; every call re-reads the file system
    pub fn scan(&self) -> ManifestWalk {
        info!(
            root = %self.root.display(),
            max_depth = self.config.max_depth,
            "Starting manifest scan"
        );

        let skipped = Arc::new(Mutex::new(Vec::new()));
        let filter_root = self.root.clone();
        let filter_skipped = Arc::clone(&skipped);

        let inner = WalkBuilder::new(&self.root)
            .max_depth(Some(self.config.max_depth))
            .hidden(false)
            .git_ignore(true)
            .follow_links(true)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| keep_entry(entry, &filter_root, &filter_skipped))
            .build();

        ManifestWalk {
            root: self.root.clone(),
            max_manifest_bytes: self.config.max_manifest_bytes,
            inner,
            skipped,
            pending: VecDeque::new(),
            finished: false,
        }
    }
}

fn keep_entry(entry: &DirEntry, root: &Path, skipped: &Mutex<Vec<SkippedEntry>>) -> bool {
    if entry.depth() == 0 {
        return true;
    }

    let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
    if is_dir {
        let name = entry.file_name().to_string_lossy();
        if IGNORED_DIRS.contains(&name.as_ref()) {
            debug!(path = %entry.path().display(), "Skipping ignored directory");
            return false;
        }
    }

    if entry.path_is_symlink() {
        let reason = match entry.path().canonicalize() {
            Ok(target) if target.starts_with(root) => return true,
            Ok(target) => format!("symlink target {} is outside the repository", target.display()),
            Err(e) => format!("cannot resolve symlink: {}", e),
        };
        warn!(path = %entry.path().display(), reason = %reason, "Skipping symlink");
        if let Ok(mut skipped) = skipped.lock() {
            skipped.push(SkippedEntry::new(entry.path(), reason));
        }
        return false;
    }

    true
}

fn error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        ignore::Error::Loop { child, .. } => Some(child),
        _ => None,
    }
}

/// Lazy walk over a repository; yields candidates and skipped entries in path order
pub struct ManifestWalk {
    root: PathBuf,
    max_manifest_bytes: u64,
    inner: ignore::Walk,
    skipped: Arc<Mutex<Vec<SkippedEntry>>>,
    pending: VecDeque<SkippedEntry>,
    finished: bool,
}

impl ManifestWalk {
    fn collect_skipped(&mut self) {
        if let Ok(mut skipped) = self.skipped.lock() {
            self.pending.extend(skipped.drain(..));
        }
    }

    fn visit(&self, entry: &DirEntry) -> Option<Result<ServiceCandidate, SkippedEntry>> {
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            return None;
        }
        let path = entry.path();
        let kind = ManifestKind::from_filename(path.file_name()?.to_str()?)?;
        let root_path = path.parent()?.to_path_buf();

        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > self.max_manifest_bytes => {
                warn!(
                    path = %path.display(),
                    size = meta.len(),
                    limit = self.max_manifest_bytes,
                    "Manifest exceeds size limit"
                );
                return Some(Err(SkippedEntry::new(
                    path,
                    format!("manifest is {} bytes, limit is {}", meta.len(), self.max_manifest_bytes),
                )));
            }
            Ok(_) => {}
            Err(e) => return Some(Err(SkippedEntry::new(path, e.to_string()))),
        }

        let raw_manifest = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read manifest");
                return Some(Err(SkippedEntry::new(path, e.to_string())));
            }
        };

        let relative_root = root_path
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let lockfiles = LOCKFILES
            .iter()
            .filter(|name| root_path.join(name).is_file())
            .map(|name| name.to_string())
            .collect();

        debug!(path = %path.display(), kind = %kind, "Found manifest");

        Some(Ok(ServiceCandidate {
            root_path,
            manifest_path: path.to_path_buf(),
            raw_manifest,
            kind,
            relative_root,
            lockfiles,
        }))
    }
}

impl Iterator for ManifestWalk {
    type Item = Result<ServiceCandidate, SkippedEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(skipped) = self.pending.pop_front() {
                return Some(Err(skipped));
            }
            if self.finished {
                return None;
            }

            let next = self.inner.next();
            self.collect_skipped();

            match next {
                None => self.finished = true,
                Some(Err(err)) => {
                    warn!(error = %err, "Failed to read directory entry");
                    let path = error_path(&err).unwrap_or(&self.root).to_path_buf();
                    self.pending.push_back(SkippedEntry::new(path, err.to_string()));
                }
                Some(Ok(entry)) => {
                    if let Some(item) = self.visit(&entry) {
                        return Some(item);
                    }
                }
            }
        }
    }
}
