//! cbzmerge - combine per-chapter CBZ archives into single volumes
//!
//! This library provides the merge engine behind the `cbzmerge` CLI: it
//! discovers the container archives in a directory, extracts and renames
//! their pages into a staging workspace, and repackages everything into one
//! `.cbz` per directory level.
//!
//! # Architecture
//!
//! ```text
//! MergeOrchestrator ──► DirectoryListing (ordering)
//!        │              StagingWorkspace (outer + per-archive inner)
//!        │              ArchiveExtractor (ZipExtractor)
//!        └────────────► ArchiveBuilder ──► <directory>.cbz
//! ```
//!
//! # Example
//!
//! ```ignore
//! use cbzmerge::config::MergeConfig;
//! use cbzmerge::archive::{CompressionScheme, CompressionSettings};
//! use cbzmerge::merge::MergeOrchestrator;
//!
//! let config = MergeConfig::new("/comics/series".into(), "/comics/out".into())
//!     .with_compression(CompressionSettings::new(CompressionScheme::Deflate, Some(6)));
//!
//! let report = MergeOrchestrator::new(config)?.run()?;
//! println!("{} of {} volumes written", report.completed_count(), report.units.len());
//! ```

pub mod archive;
pub mod config;
pub mod logging;
pub mod merge;
pub mod ordering;
pub mod staging;
