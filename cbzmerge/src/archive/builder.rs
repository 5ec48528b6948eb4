//! Output container building.
//!
//! Staged files are written flat, in name order, under their stored names.
//! The archive is assembled in a temporary file next to the output and then
//! persisted over the final path, so an existing output is replaced only by
//! a complete archive.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{DateTime, ZipWriter};

use super::compression::CompressionSettings;
use super::error::{ArchiveError, ArchiveResult};
use crate::staging::StagedEntry;

/// Result of building an output container.
#[derive(Debug, Clone)]
pub struct ArchiveBuildResult {
    /// Path of the written container.
    pub path: PathBuf,

    /// Number of entries stored.
    pub entry_count: usize,

    /// Size of the container in bytes.
    pub size: u64,
}

/// Writes staged entries into a single container.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveBuilder {
    compression: CompressionSettings,
}

impl ArchiveBuilder {
    /// Create a builder writing with the given compression.
    pub fn new(compression: CompressionSettings) -> Self {
        Self { compression }
    }

    pub fn compression(&self) -> CompressionSettings {
        self.compression
    }

    /// Build a container from every regular file in `staging_dir`.
    ///
    /// Files are stored in lexicographic name order.
    pub fn build(&self, staging_dir: &Path, output_path: &Path) -> ArchiveResult<ArchiveBuildResult> {
        let entries = list_staged_files(staging_dir)?;
        self.build_entries(&entries, output_path)
    }

    /// Build a container from staged entries.
    ///
    /// Entries are sorted by name before writing, so the caller's order does
    /// not matter. An existing file at `output_path` is overwritten.
    pub fn build_entries(
        &self,
        entries: &[StagedEntry],
        output_path: &Path,
    ) -> ArchiveResult<ArchiveBuildResult> {
        let parent = output_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut sorted: Vec<&StagedEntry> = entries.iter().collect();
        sorted.sort_by(|a, b| a.name().cmp(b.name()));

        let mut staged = NamedTempFile::new_in(parent).map_err(|e| ArchiveError::WriteFailed {
            path: output_path.to_path_buf(),
            source: e,
        })?;

        self.write_container(&sorted, staged.as_file_mut(), output_path)?;
        set_output_permissions(staged.as_file(), output_path)?;

        staged
            .persist(output_path)
            .map_err(|e| ArchiveError::WriteFailed {
                path: output_path.to_path_buf(),
                source: e.error,
            })?;

        let size = fs::metadata(output_path)
            .map_err(|e| ArchiveError::ReadFailed {
                path: output_path.to_path_buf(),
                source: e,
            })?
            .len();

        info!(
            path = %output_path.display(),
            entries = sorted.len(),
            compression = %self.compression,
            size,
            "Wrote merged archive"
        );

        Ok(ArchiveBuildResult {
            path: output_path.to_path_buf(),
            entry_count: sorted.len(),
            size,
        })
    }

    fn write_container(
        &self,
        entries: &[&StagedEntry],
        file: &mut File,
        output_path: &Path,
    ) -> ArchiveResult<()> {
        let failed = |reason: String| ArchiveError::BuildFailed {
            path: output_path.to_path_buf(),
            reason,
        };

        let mut writer = ZipWriter::new(BufWriter::new(file));

        for entry in entries {
            if entry.name().contains(['/', '\\']) {
                return Err(ArchiveError::InvalidEntryName(entry.name().to_string()));
            }

            let mut source = File::open(entry.path()).map_err(|e| ArchiveError::ReadFailed {
                path: entry.path().to_path_buf(),
                source: e,
            })?;
            let len = source.metadata().map(|m| m.len()).unwrap_or(0);

            writer
                .start_file(entry.name(), self.entry_options(len))
                .map_err(|e| failed(format!("{}: {}", entry.name(), e)))?;
            io::copy(&mut source, &mut writer).map_err(|e| ArchiveError::WriteFailed {
                path: output_path.to_path_buf(),
                source: e,
            })?;

            debug!(entry = entry.name(), bytes = len, "Stored entry");
        }

        let mut inner = writer
            .finish()
            .map_err(|e| failed(format!("finalizing archive: {}", e)))?;
        inner.flush().map_err(|e| ArchiveError::WriteFailed {
            path: output_path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    fn entry_options(&self, len: u64) -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(self.compression.scheme().method())
            .compression_level(self.compression.level().map(i64::from))
            .last_modified_time(DateTime::default())
            .unix_permissions(0o644)
            .large_file(len >= u64::from(u32::MAX))
    }
}

/// Temporary files are created owner-only; widen to the usual 0644.
#[cfg(unix)]
fn set_output_permissions(file: &File, output_path: &Path) -> ArchiveResult<()> {
    use std::os::unix::fs::PermissionsExt;

    file.set_permissions(fs::Permissions::from_mode(0o644))
        .map_err(|e| ArchiveError::WriteFailed {
            path: output_path.to_path_buf(),
            source: e,
        })
}

#[cfg(not(unix))]
fn set_output_permissions(_file: &File, _output_path: &Path) -> ArchiveResult<()> {
    Ok(())
}

/// Regular files in `dir` as staged entries, sorted by name.
fn list_staged_files(dir: &Path) -> ArchiveResult<Vec<StagedEntry>> {
    let read_failed = |e: io::Error| ArchiveError::ReadFailed {
        path: dir.to_path_buf(),
        source: e,
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_failed)? {
        let entry = entry.map_err(read_failed)?;
        let path = entry.path();
        if path.is_file() {
            let name = entry.file_name().to_string_lossy().into_owned();
            entries.push(StagedEntry::new(name, path));
        }
    }
    entries.sort_by(|a, b| a.name().cmp(b.name()));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::CompressionScheme;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::{CompressionMethod, ZipArchive};

    fn stage(dir: &Path, files: &[(&str, &str)]) {
        for (name, content) in files {
            fs::write(dir.join(name), content).unwrap();
        }
    }

    fn entry_names(path: &Path) -> Vec<String> {
        let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        archive.file_names().map(String::from).collect::<Vec<_>>()
    }

    #[test]
    fn test_build_sorts_entries() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("staging");
        fs::create_dir(&staging).unwrap();
        stage(
            &staging,
            &[("1_page2.jpg", "p2"), ("0_cover.jpg", "c"), ("1_page1.jpg", "p1")],
        );
        let output = temp.path().join("vol.cbz");

        let result = ArchiveBuilder::default().build(&staging, &output).unwrap();

        assert_eq!(result.entry_count, 3);
        assert!(result.size > 0);

        // Central directory order follows write order.
        let mut archive = ZipArchive::new(File::open(&output).unwrap()).unwrap();
        let ordered: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(ordered, vec!["0_cover.jpg", "1_page1.jpg", "1_page2.jpg"]);
    }

    #[test]
    fn test_build_preserves_content() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("staging");
        fs::create_dir(&staging).unwrap();
        stage(&staging, &[("0_a.jpg", "alpha")]);
        let output = temp.path().join("vol.cbz");

        let builder = ArchiveBuilder::new(CompressionSettings::new(
            CompressionScheme::Deflate,
            Some(9),
        ));
        builder.build(&staging, &output).unwrap();

        let mut archive = ZipArchive::new(File::open(&output).unwrap()).unwrap();
        let mut entry = archive.by_name("0_a.jpg").unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Deflated);
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        assert_eq!(content, "alpha");
    }

    #[test]
    fn test_build_bzip2_with_coerced_level() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("staging");
        fs::create_dir(&staging).unwrap();
        stage(&staging, &[("0_a.jpg", "alpha alpha alpha")]);
        let output = temp.path().join("vol.cbz");

        let builder = ArchiveBuilder::new(CompressionSettings::new(
            CompressionScheme::Bzip2,
            Some(0),
        ));
        assert_eq!(builder.compression().level(), Some(1));
        builder.build(&staging, &output).unwrap();

        let mut archive = ZipArchive::new(File::open(&output).unwrap()).unwrap();
        let entry = archive.by_index(0).unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Bzip2);
    }

    #[test]
    fn test_build_overwrites_existing_output() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("staging");
        fs::create_dir(&staging).unwrap();
        stage(&staging, &[("0_new.jpg", "new")]);
        let output = temp.path().join("vol.cbz");
        fs::write(&output, "stale bytes").unwrap();

        ArchiveBuilder::default().build(&staging, &output).unwrap();

        assert_eq!(entry_names(&output), vec!["0_new.jpg"]);
    }

    #[test]
    fn test_build_is_byte_identical() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("staging");
        fs::create_dir(&staging).unwrap();
        stage(&staging, &[("0_a.jpg", "a"), ("1_b.jpg", "b")]);

        let first = temp.path().join("first.cbz");
        let second = temp.path().join("second.cbz");
        let builder = ArchiveBuilder::new(CompressionSettings::new(
            CompressionScheme::Deflate,
            Some(5),
        ));
        builder.build(&staging, &first).unwrap();
        builder.build(&staging, &second).unwrap();

        assert_eq!(fs::read(first).unwrap(), fs::read(second).unwrap());
    }

    #[test]
    fn test_build_empty_staging() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("staging");
        fs::create_dir(&staging).unwrap();
        let output = temp.path().join("empty.cbz");

        let result = ArchiveBuilder::default().build(&staging, &output).unwrap();

        assert_eq!(result.entry_count, 0);
        assert!(entry_names(&output).is_empty());
    }

    #[test]
    fn test_build_missing_output_dir_fails() {
        let temp = TempDir::new().unwrap();
        let staging = temp.path().join("staging");
        fs::create_dir(&staging).unwrap();
        let output = temp.path().join("missing").join("vol.cbz");

        let result = ArchiveBuilder::default().build(&staging, &output);

        assert!(matches!(result, Err(ArchiveError::WriteFailed { .. })));
        assert!(!output.exists());
    }

    #[test]
    fn test_build_rejects_nested_entry_name() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("page.jpg");
        fs::write(&source, "x").unwrap();
        let entries = vec![StagedEntry::new("nested/page.jpg".to_string(), source)];

        let result =
            ArchiveBuilder::default().build_entries(&entries, &temp.path().join("vol.cbz"));

        assert!(matches!(result, Err(ArchiveError::InvalidEntryName(_))));
    }
}
