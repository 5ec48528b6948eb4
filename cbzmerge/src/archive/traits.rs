//! Extraction interface used by the merge orchestrator.

use std::path::Path;

use super::error::ArchiveResult;

/// What an extractor made of one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// The file is not a container; nothing was written.
    NotAnArchive,

    /// The container was extracted; holds the basenames written, in
    /// container order and without duplicates.
    Extracted(Vec<String>),
}

/// Extracts container archives into a flat directory.
///
/// Implementations must be shareable across extraction workers.
pub trait ArchiveExtractor: Send + Sync {
    /// Extract every entry of `archive_path` into `dest_dir` under the
    /// entry's basename.
    ///
    /// Files that are not containers yield [`Extraction::NotAnArchive`].
    /// A valid container that cannot be fully extracted is an error.
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> ArchiveResult<Extraction>;
}
