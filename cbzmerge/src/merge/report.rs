//! Per-unit and per-run merge reports.

use std::path::{Path, PathBuf};

/// What happened to one source file of a merge unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    /// The archive was extracted; `entries` files were staged.
    Merged { entries: usize },

    /// The file is not a container and was left out.
    Skipped,

    /// The container could not be extracted.
    Failed { error: String },
}

/// A source file that failed to extract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Terminal state of a merge unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    /// Output written, possibly with omitted sources.
    Completed {
        output: PathBuf,
        entries: usize,
        bytes: u64,
    },

    /// No output was written.
    Aborted { reason: String },
}

/// Outcome of merging one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitReport {
    /// Directory that was merged.
    pub directory: PathBuf,

    /// Directory basename; the output is `<name>.cbz`.
    pub name: String,

    pub outcome: UnitOutcome,

    /// Sources whose entries made it into the output, in order.
    pub merged: Vec<PathBuf>,

    /// Sources left out because they are not containers.
    pub skipped: Vec<PathBuf>,

    /// Sources that failed to extract.
    pub failures: Vec<SourceFailure>,

    /// Staging directories that could not be removed after the build.
    pub cleanup_failures: Vec<String>,
}

impl UnitReport {
    pub(crate) fn new(directory: &Path, name: impl Into<String>) -> Self {
        Self {
            directory: directory.to_path_buf(),
            name: name.into(),
            outcome: UnitOutcome::Aborted {
                reason: "not started".to_string(),
            },
            merged: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
            cleanup_failures: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, path: &Path, status: SourceStatus) {
        match status {
            SourceStatus::Merged { .. } => self.merged.push(path.to_path_buf()),
            SourceStatus::Skipped => self.skipped.push(path.to_path_buf()),
            SourceStatus::Failed { error } => self.failures.push(SourceFailure {
                path: path.to_path_buf(),
                error,
            }),
        }
    }

    pub(crate) fn record_cleanup_failure(&mut self, error: impl Into<String>) {
        self.cleanup_failures.push(error.into());
    }

    pub(crate) fn abort(mut self, reason: impl Into<String>) -> Self {
        self.outcome = UnitOutcome::Aborted {
            reason: reason.into(),
        };
        self
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, UnitOutcome::Completed { .. })
    }

    /// Completed, but some sources were skipped or failed.
    pub fn has_omissions(&self) -> bool {
        self.is_completed() && (self.skipped_count() > 0 || self.failed_count() > 0)
    }

    /// Path of the written archive, if the unit completed.
    pub fn output(&self) -> Option<&Path> {
        match &self.outcome {
            UnitOutcome::Completed { output, .. } => Some(output),
            UnitOutcome::Aborted { .. } => None,
        }
    }
}

/// Reports for every merge unit of a run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub units: Vec<UnitReport>,
}

impl RunReport {
    pub fn completed_count(&self) -> usize {
        self.units.iter().filter(|u| u.is_completed()).count()
    }

    pub fn aborted_count(&self) -> usize {
        self.units.len() - self.completed_count()
    }

    /// Failed sources across all units.
    pub fn total_failures(&self) -> usize {
        self.units.iter().map(UnitReport::failed_count).sum()
    }

    /// Every unit completed.
    pub fn is_success(&self) -> bool {
        self.aborted_count() == 0
    }

    /// Report for the unit named `name`.
    pub fn unit(&self, name: &str) -> Option<&UnitReport> {
        self.units.iter().find(|u| u.name == name)
    }
}
