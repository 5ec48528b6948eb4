//! Merge orchestration.
//!
//! The orchestrator turns a root directory into one or more merged
//! containers. Each directory it processes is a *merge unit*:
//!
//! ```text
//! Discover ──► Stage ──► Build ──► Release
//!    │           │          │         │
//!  listing   extract +   write     remove
//!  + order   prefix     <name>.cbz  staging
//! ```
//!
//! The root is merged first, then every immediate subdirectory of the root,
//! each as an independent unit using only its own direct file listing.
//!
//! # Failure model
//!
//! Only run-level problems (missing input, unusable output directory, an
//! unreadable root) are returned as errors. Anything that goes wrong inside
//! a unit is captured in its [`UnitReport`]; a source that fails to extract
//! is recorded and left out, and a unit that cannot be built is reported as
//! aborted while its siblings carry on.

mod error;
mod progress;
mod report;

pub use error::{MergeError, MergeResult};
pub use progress::{MergeProgress, NoProgress};
pub use report::{RunReport, SourceFailure, SourceStatus, UnitOutcome, UnitReport};

use std::fs;
use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, error, info, warn};

use crate::archive::{
    ArchiveBuildResult, ArchiveBuilder, ArchiveExtractor, Extraction, ZipExtractor,
};
use crate::config::MergeConfig;
use crate::ordering::{DirectoryListing, PositionPrefix, SourcePath};
use crate::staging::{StagedEntry, StagingWorkspace};

/// Extension of every merged container.
pub const OUTPUT_EXTENSION: &str = "cbz";

/// Drives merge units from discovery to a written container.
pub struct MergeOrchestrator<E: ArchiveExtractor = ZipExtractor> {
    config: MergeConfig,
    extractor: E,
    builder: ArchiveBuilder,
    progress: Arc<dyn MergeProgress>,
    pool: Option<ThreadPool>,
}

impl MergeOrchestrator<ZipExtractor> {
    /// Create an orchestrator reading sources as ZIP containers.
    pub fn new(config: MergeConfig) -> MergeResult<Self> {
        Self::with_extractor(config, ZipExtractor::new())
    }
}

impl<E: ArchiveExtractor> MergeOrchestrator<E> {
    /// Create an orchestrator with a custom extractor.
    ///
    /// When `config.jobs > 1` a dedicated worker pool of that size is built
    /// for extracting the sources of a unit in parallel.
    pub fn with_extractor(config: MergeConfig, extractor: E) -> MergeResult<Self> {
        let pool = if config.jobs > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.jobs)
                .thread_name(|i| format!("cbzmerge-extract-{}", i))
                .build()
                .map_err(|e| MergeError::ThreadPool(e.to_string()))?;
            Some(pool)
        } else {
            None
        };

        Ok(Self {
            builder: ArchiveBuilder::new(config.compression),
            config,
            extractor,
            progress: Arc::new(NoProgress),
            pool,
        })
    }

    /// Attach a progress observer.
    pub fn with_progress(mut self, progress: Arc<dyn MergeProgress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Pre-flight the configuration, then merge the configured input.
    pub fn run(&self) -> MergeResult<RunReport> {
        let input = self.config.preflight()?;
        self.merge(&input)
    }

    /// Merge `root` and each of its immediate subdirectories.
    ///
    /// Fails only if `root` itself cannot be resolved or listed. A
    /// subdirectory that resolves to the output directory is not merged.
    pub fn merge(&self, root: &Path) -> MergeResult<RunReport> {
        let root = fs::canonicalize(root).map_err(|e| MergeError::ReadFailed {
            path: root.to_path_buf(),
            source: e,
        })?;
        let listing = DirectoryListing::scan(&root)?;
        let output_dir = fs::canonicalize(&self.config.output_dir).ok();

        info!(
            root = %root.display(),
            files = listing.files.len(),
            subdirectories = listing.directories.len(),
            "Starting merge"
        );

        let mut run = RunReport::default();
        run.units.push(self.merge_listing(&listing));

        for child in listing.directories.iter() {
            if output_dir.as_deref() == Some(child.path()) {
                debug!(path = %child.path().display(), "Skipping output directory");
                continue;
            }
            if child.path().file_name() == root.file_name() {
                warn!(
                    path = %child.path().display(),
                    "Subdirectory has the same name as the root, its archive replaces the root's"
                );
            }
            run.units.push(self.merge_unit(child.path()));
        }

        info!(
            completed = run.completed_count(),
            aborted = run.aborted_count(),
            failures = run.total_failures(),
            "Merge finished"
        );
        Ok(run)
    }

    /// Merge the direct file listing of one directory into `<name>.cbz`.
    ///
    /// Never fails; problems end up in the returned report.
    pub fn merge_unit(&self, directory: &Path) -> UnitReport {
        match DirectoryListing::scan(directory) {
            Ok(listing) => self.merge_listing(&listing),
            Err(e) => {
                error!(path = %directory.display(), error = %e, "Failed to list directory");
                let name = directory
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let report = UnitReport::new(directory, name).abort(e.to_string());
                self.progress.unit_finished(&report);
                report
            }
        }
    }

    fn merge_listing(&self, listing: &DirectoryListing) -> UnitReport {
        let mut report = UnitReport::new(&listing.directory, listing.name());
        self.progress
            .unit_started(&listing.directory, listing.files.len());
        info!(
            unit = %report.name,
            sources = listing.files.len(),
            "Merging directory"
        );

        let report = match self.stage_and_build(listing, &mut report) {
            Ok(build) => {
                report.outcome = UnitOutcome::Completed {
                    output: build.path,
                    entries: build.entry_count,
                    bytes: build.size,
                };
                report
            }
            Err(e) => {
                error!(unit = %report.name, error = %e, "Merge unit aborted");
                report.abort(e.to_string())
            }
        };

        self.progress.unit_finished(&report);
        report
    }

    fn stage_and_build(
        &self,
        listing: &DirectoryListing,
        report: &mut UnitReport,
    ) -> MergeResult<ArchiveBuildResult> {
        let workspace = StagingWorkspace::acquire(&self.config.staging_root)?;
        let sources = listing.files.prefixed();

        // Collecting is the barrier: the build starts only after every
        // source has been staged or given up on.
        let statuses: Vec<SourceStatus> = match &self.pool {
            Some(pool) => pool.install(|| {
                sources
                    .par_iter()
                    .map(|(source, prefix)| self.stage_source(&workspace, source, prefix))
                    .collect()
            }),
            None => sources
                .iter()
                .map(|(source, prefix)| self.stage_source(&workspace, source, prefix))
                .collect(),
        };

        for ((source, _), status) in sources.iter().zip(statuses) {
            report.record(source.path(), status);
        }

        let entries = workspace.entries()?;
        let output = self
            .config
            .output_dir
            .join(format!("{}.{}", listing.name(), OUTPUT_EXTENSION));
        let build = self.builder.build_entries(&entries, &output)?;

        // The archive is already written, so a cleanup failure only goes
        // into the report.
        if let Err(e) = workspace.close() {
            report.record_cleanup_failure(e.to_string());
        }
        Ok(build)
    }

    fn stage_source(
        &self,
        workspace: &StagingWorkspace,
        source: &SourcePath,
        prefix: &PositionPrefix,
    ) -> SourceStatus {
        let status = match self.extract_into(workspace, source.path(), prefix) {
            Ok(Some(entries)) => {
                debug!(source = %source.path().display(), prefix = %prefix, entries, "Staged archive");
                SourceStatus::Merged { entries }
            }
            Ok(None) => {
                debug!(source = %source.path().display(), "Skipping non-archive file");
                SourceStatus::Skipped
            }
            Err(e) => {
                warn!(source = %source.path().display(), error = %e, "Failed to extract archive");
                SourceStatus::Failed {
                    error: e.to_string(),
                }
            }
        };
        self.progress.source_finished(source.path(), &status);
        status
    }

    /// Extract one source into its own scratch workspace, then move every
    /// entry into `workspace` under its prefixed name.
    ///
    /// Returns `None` for files that are not containers. On failure nothing
    /// from this source is left in `workspace`.
    fn extract_into(
        &self,
        workspace: &StagingWorkspace,
        source: &Path,
        prefix: &PositionPrefix,
    ) -> MergeResult<Option<usize>> {
        let scratch = workspace.nested()?;

        let names = match self.extractor.extract(source, scratch.path())? {
            Extraction::NotAnArchive => return Ok(None),
            Extraction::Extracted(names) => names,
        };

        let mut adopted: Vec<StagedEntry> = Vec::with_capacity(names.len());
        for name in &names {
            match workspace.adopt(&scratch.path().join(name), &prefix.apply(name)) {
                Ok(entry) => adopted.push(entry),
                Err(e) => {
                    for entry in &adopted {
                        let _ = fs::remove_file(entry.path());
                    }
                    return Err(e);
                }
            }
        }

        // Anything left behind goes with the outer workspace.
        let _ = scratch.close();
        Ok(Some(adopted.len()))
    }
}
