//! Disposable staging workspaces for assembling merged archives.
//!
//! A merge unit uses two scopes:
//!
//! ```text
//! <temp root>/
//! ├── .cbzmerge-unit-XXXX/       outer: prefixed entries for the whole unit
//! │   ├── 0_cover.jpg
//! │   └── 1_page1.jpg
//! └── .cbzmerge-archive-YYYY/    inner: raw extraction of one source archive
//!     └── page1.jpg
//! ```
//!
//! Inner scopes are siblings of the outer scope so that the outer directory
//! only ever holds staged files, and so that adopting an entry is a rename
//! on the same filesystem. Both scopes are backed by [`tempfile::TempDir`]
//! and are removed on drop.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{trace, warn};

use crate::merge::{MergeError, MergeResult};

const UNIT_PREFIX: &str = ".cbzmerge-unit-";
const ARCHIVE_PREFIX: &str = ".cbzmerge-archive-";

/// A file owned by a staging workspace under its final stored name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedEntry {
    name: String,
    path: PathBuf,
}

impl StagedEntry {
    pub(crate) fn new(name: String, path: PathBuf) -> Self {
        Self { name, path }
    }

    /// Name the entry will be stored under in the output archive.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Location of the staged file on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Scoped temporary directory, recursively deleted when dropped.
#[derive(Debug)]
pub struct StagingWorkspace {
    dir: TempDir,
    root: PathBuf,
}

impl StagingWorkspace {
    /// Acquire a fresh, empty workspace under `root`.
    pub fn acquire(root: &Path) -> MergeResult<Self> {
        Self::create(root, UNIT_PREFIX)
    }

    /// Acquire an inner per-archive workspace alongside this one.
    pub fn nested(&self) -> MergeResult<Self> {
        Self::create(&self.root, ARCHIVE_PREFIX)
    }

    fn create(root: &Path, prefix: &str) -> MergeResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(root)
            .map_err(|e| MergeError::Staging {
                path: root.to_path_buf(),
                source: e,
            })?;
        trace!(path = %dir.path().display(), "Acquired staging workspace");
        Ok(Self {
            dir,
            root: root.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Move `source` into this workspace under `name`.
    ///
    /// Uses a rename, falling back to copy-and-remove when the source lives
    /// on another filesystem. Names handed out by the orchestrator are
    /// unique per source archive, so concurrent adopters never target the
    /// same file.
    pub fn adopt(&self, source: &Path, name: &str) -> MergeResult<StagedEntry> {
        let target = self.dir.path().join(name);
        move_file(source, &target).map_err(|e| MergeError::Staging {
            path: target.clone(),
            source: e,
        })?;
        Ok(StagedEntry::new(name.to_string(), target))
    }

    /// Regular files held by the workspace, sorted by name.
    pub fn entries(&self) -> MergeResult<Vec<StagedEntry>> {
        let read_dir = fs::read_dir(self.dir.path()).map_err(|e| MergeError::Staging {
            path: self.dir.path().to_path_buf(),
            source: e,
        })?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| MergeError::Staging {
                path: self.dir.path().to_path_buf(),
                source: e,
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            entries.push(StagedEntry::new(name, path));
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Delete the workspace, reporting any cleanup failure.
    ///
    /// Dropping the workspace also deletes it, but silently.
    pub fn close(self) -> MergeResult<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| {
            warn!(path = %path.display(), error = %e, "Failed to remove staging workspace");
            MergeError::Staging { path, source: e }
        })
    }
}

fn move_file(source: &Path, target: &Path) -> io::Result<()> {
    match fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(source, target)?;
            fs::remove_file(source)
        }
    }
}
