//! Progress callbacks for long merges.

use std::path::Path;

use super::report::{SourceStatus, UnitReport};

/// Observer notified as the orchestrator works.
///
/// `source_finished` may be called from extraction worker threads.
pub trait MergeProgress: Send + Sync {
    /// A merge unit is about to stage `sources` files.
    fn unit_started(&self, _directory: &Path, _sources: usize) {}

    /// One source file of the current unit has been handled.
    fn source_finished(&self, _source: &Path, _status: &SourceStatus) {}

    /// A merge unit reached a terminal state.
    fn unit_finished(&self, _report: &UnitReport) {}
}

/// Progress observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl MergeProgress for NoProgress {}
