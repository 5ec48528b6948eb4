//! Container archive handling.
//!
//! This module covers both ends of a merge:
//! - Extracting source containers into a flat directory ([`ZipExtractor`])
//! - Writing staged entries into one output container ([`ArchiveBuilder`])
//! - Compression scheme selection and level coercion ([`CompressionSettings`])

mod builder;
mod compression;
mod error;
mod extractor;
mod traits;

pub use builder::{ArchiveBuildResult, ArchiveBuilder};
pub use compression::{CompressionScheme, CompressionSettings, UnknownScheme, DEFAULT_LEVEL};
pub use error::{ArchiveError, ArchiveResult};
pub use extractor::{entry_basename, ZipExtractor};
pub use traits::{ArchiveExtractor, Extraction};
