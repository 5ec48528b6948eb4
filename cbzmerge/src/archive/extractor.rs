//! ZIP container extraction.
//!
//! Entries are flattened: only the final component of each entry name is
//! kept, since staged files are renamed immediately afterwards. Directory
//! entries are ignored.
//!
//! A file counts as a container when an end-of-central-directory record is
//! found near its end. Anything that carries one but cannot be opened is a
//! damaged container and fails; anything without one is skipped.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::{debug, warn};
use zip::ZipArchive;

use super::error::{ArchiveError, ArchiveResult};
use super::traits::{ArchiveExtractor, Extraction};

/// Signature of the end-of-central-directory record.
const EOCD_SIGNATURE: &[u8; 4] = b"PK\x05\x06";

/// Fixed part of the end-of-central-directory record.
const EOCD_MIN_LEN: usize = 22;

/// The record sits within the last 22 bytes plus the maximum comment length.
const EOCD_SEARCH_WINDOW: u64 = EOCD_MIN_LEN as u64 + u16::MAX as u64;

/// Extractor for ZIP-compatible containers (CBZ).
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipExtractor;

impl ZipExtractor {
    /// Create a new ZIP extractor.
    pub fn new() -> Self {
        Self
    }

    fn open(&self, archive_path: &Path) -> ArchiveResult<Option<ZipArchive<BufReader<File>>>> {
        let read_failed = |e: io::Error| ArchiveError::ReadFailed {
            path: archive_path.to_path_buf(),
            source: e,
        };

        let mut file = File::open(archive_path).map_err(read_failed)?;
        if !has_end_of_central_directory(&mut file).map_err(read_failed)? {
            return Ok(None);
        }

        ZipArchive::new(BufReader::new(file))
            .map(Some)
            .map_err(|e| ArchiveError::ExtractionFailed {
                path: archive_path.to_path_buf(),
                reason: e.to_string(),
            })
    }
}

/// Whether a complete end-of-central-directory record appears in the tail
/// of `file`. Leaves the cursor at the start of the file.
fn has_end_of_central_directory(file: &mut File) -> io::Result<bool> {
    let len = file.seek(SeekFrom::End(0))?;
    let start = len.saturating_sub(EOCD_SEARCH_WINDOW);
    file.seek(SeekFrom::Start(start))?;

    let mut tail = Vec::new();
    file.read_to_end(&mut tail)?;
    file.seek(SeekFrom::Start(0))?;

    Ok(tail
        .windows(EOCD_SIGNATURE.len())
        .rposition(|w| w == EOCD_SIGNATURE)
        .is_some_and(|pos| pos + EOCD_MIN_LEN <= tail.len()))
}

impl ArchiveExtractor for ZipExtractor {
    fn extract(&self, archive_path: &Path, dest_dir: &Path) -> ArchiveResult<Extraction> {
        let Some(mut archive) = self.open(archive_path)? else {
            debug!(path = %archive_path.display(), "Not a ZIP container");
            return Ok(Extraction::NotAnArchive);
        };

        fs::create_dir_all(dest_dir).map_err(|e| ArchiveError::CreateDirFailed {
            path: dest_dir.to_path_buf(),
            source: e,
        })?;

        let failed = |reason: String| ArchiveError::ExtractionFailed {
            path: archive_path.to_path_buf(),
            reason,
        };

        let mut written: Vec<String> = Vec::with_capacity(archive.len());
        let mut seen = HashSet::new();

        for index in 0..archive.len() {
            let mut entry = archive
                .by_index(index)
                .map_err(|e| failed(format!("entry {}: {}", index, e)))?;

            if entry.is_dir() {
                continue;
            }

            let Some(basename) = entry_basename(entry.name()) else {
                debug!(entry = entry.name(), "Ignoring entry without a file name");
                continue;
            };

            if !seen.insert(basename.clone()) {
                warn!(
                    archive = %archive_path.display(),
                    entry = entry.name(),
                    "Duplicate entry name after flattening, later entry wins"
                );
                written.retain(|name| name != &basename);
            }

            let target = dest_dir.join(&basename);
            let out = File::create(&target).map_err(|e| ArchiveError::WriteFailed {
                path: target.clone(),
                source: e,
            })?;
            let mut writer = BufWriter::new(out);

            io::copy(&mut entry, &mut writer)
                .and_then(|_| writer.flush())
                .map_err(|e| failed(format!("{}: {}", entry.name(), e)))?;

            written.push(basename);
        }

        debug!(
            path = %archive_path.display(),
            entries = written.len(),
            "Extracted container"
        );

        Ok(Extraction::Extracted(written))
    }
}

/// Final component of a container entry name.
///
/// Both `/` and `\` count as separators. Returns `None` for names that end
/// in a separator or whose last component is `.` or `..`.
pub fn entry_basename(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next()?;
    match last {
        "" | "." | ".." => None,
        other => Some(other.to_string()),
    }
}
