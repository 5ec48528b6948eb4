//! Error types for the merge orchestrator.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::archive::ArchiveError;

/// Result type for merge operations.
pub type MergeResult<T> = Result<T, MergeError>;

/// Errors that can occur while preparing or running a merge.
#[derive(Debug)]
pub enum MergeError {
    /// Input directory does not exist.
    InputNotFound(PathBuf),

    /// Input path exists but is not a directory.
    InputNotDirectory(PathBuf),

    /// Output directory could not be created.
    OutputDirCreateFailed { path: PathBuf, source: io::Error },

    /// Output directory exists but cannot be written to.
    OutputNotWritable { path: PathBuf, source: io::Error },

    /// Failed to list or read a directory.
    ReadFailed { path: PathBuf, source: io::Error },

    /// Staging workspace could not be created, filled or removed.
    Staging { path: PathBuf, source: io::Error },

    /// Archive extraction or building failed.
    Archive(ArchiveError),

    /// Invalid configuration.
    InvalidConfig(String),

    /// Extraction worker pool could not be started.
    ThreadPool(String),
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeError::InputNotFound(path) => {
                write!(f, "input directory {} does not exist", path.display())
            }
            MergeError::InputNotDirectory(path) => {
                write!(f, "input path {} is not a directory", path.display())
            }
            MergeError::OutputDirCreateFailed { path, source } => {
                write!(
                    f,
                    "output directory {} can not be created: {}",
                    path.display(),
                    source
                )
            }
            MergeError::OutputNotWritable { path, source } => {
                write!(
                    f,
                    "output directory {} is not writable: {}",
                    path.display(),
                    source
                )
            }
            MergeError::ReadFailed { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            MergeError::Staging { path, source } => {
                write!(f, "staging failed at {}: {}", path.display(), source)
            }
            MergeError::Archive(e) => write!(f, "{}", e),
            MergeError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            MergeError::ThreadPool(msg) => {
                write!(f, "failed to start extraction workers: {}", msg)
            }
        }
    }
}

impl std::error::Error for MergeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MergeError::OutputDirCreateFailed { source, .. } => Some(source),
            MergeError::OutputNotWritable { source, .. } => Some(source),
            MergeError::ReadFailed { source, .. } => Some(source),
            MergeError::Staging { source, .. } => Some(source),
            MergeError::Archive(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArchiveError> for MergeError {
    fn from(e: ArchiveError) -> Self {
        MergeError::Archive(e)
    }
}

impl MergeError {
    /// Whether this error aborts the whole run rather than one unit.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MergeError::InputNotFound(_)
                | MergeError::InputNotDirectory(_)
                | MergeError::OutputDirCreateFailed { .. }
                | MergeError::OutputNotWritable { .. }
                | MergeError::InvalidConfig(_)
                | MergeError::ThreadPool(_)
        )
    }
}
