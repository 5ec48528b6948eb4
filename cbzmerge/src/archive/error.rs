//! Error types for archive extraction and building.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Errors that can occur while reading or writing containers.
#[derive(Debug)]
pub enum ArchiveError {
    /// Failed to read a file or directory.
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write a file.
    WriteFailed { path: PathBuf, source: io::Error },

    /// Failed to create a directory.
    CreateDirFailed { path: PathBuf, source: io::Error },

    /// A valid container could not be fully extracted.
    ExtractionFailed { path: PathBuf, reason: String },

    /// The output container could not be written.
    BuildFailed { path: PathBuf, reason: String },

    /// A staged file name cannot be stored in a container.
    InvalidEntryName(String),
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveError::ReadFailed { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            ArchiveError::WriteFailed { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            ArchiveError::CreateDirFailed { path, source } => {
                write!(
                    f,
                    "failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            ArchiveError::ExtractionFailed { path, reason } => {
                write!(f, "failed to extract {}: {}", path.display(), reason)
            }
            ArchiveError::BuildFailed { path, reason } => {
                write!(f, "failed to build {}: {}", path.display(), reason)
            }
            ArchiveError::InvalidEntryName(name) => {
                write!(f, "invalid entry name: {}", name)
            }
        }
    }
}

impl std::error::Error for ArchiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArchiveError::ReadFailed { source, .. } => Some(source),
            ArchiveError::WriteFailed { source, .. } => Some(source),
            ArchiveError::CreateDirFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
