//! Merge configuration.
//!
//! [`MergeConfig`] is the resolved, read-only configuration handed to the
//! orchestrator. It is built once by the caller (usually the CLI, from
//! command-line flags layered over a [`ConfigFile`]) and never mutated by
//! the engine.

mod file;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::archive::CompressionSettings;
use crate::merge::{MergeError, MergeResult};

pub use file::{config_file_path, ConfigError, ConfigFile, MergeSection};

/// Default number of extraction workers (sequential).
pub const DEFAULT_JOBS: usize = 1;

/// Configuration for one merge run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConfig {
    /// Root directory whose archives (and immediate subdirectories) are merged.
    pub input_dir: PathBuf,

    /// Directory receiving `<name>.cbz` outputs.
    pub output_dir: PathBuf,

    /// Compression for output containers.
    pub compression: CompressionSettings,

    /// Number of worker threads extracting one unit's sources.
    pub jobs: usize,

    /// Directory under which staging workspaces are created.
    pub staging_root: PathBuf,
}

impl MergeConfig {
    /// Create a configuration with default compression and worker count.
    pub fn new(input_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            input_dir,
            output_dir,
            compression: CompressionSettings::default(),
            jobs: DEFAULT_JOBS,
            staging_root: std::env::temp_dir(),
        }
    }

    /// Set the output compression.
    pub fn with_compression(mut self, compression: CompressionSettings) -> Self {
        self.compression = compression;
        self
    }

    /// Set the number of extraction workers.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Set the directory staging workspaces are created in.
    pub fn with_staging_root(mut self, path: PathBuf) -> Self {
        self.staging_root = path;
        self
    }

    /// Run-level checks performed before any merge work.
    ///
    /// Verifies the input directory, creates the output directory (with
    /// parents) and probes that it is writable. Returns the canonical input
    /// directory. Every error returned here is fatal for the run.
    pub fn preflight(&self) -> MergeResult<PathBuf> {
        if self.jobs == 0 {
            return Err(MergeError::InvalidConfig(
                "jobs must be at least 1".to_string(),
            ));
        }

        let scheme = self.compression.scheme();
        if !scheme.is_available() {
            return Err(MergeError::InvalidConfig(format!(
                "compression scheme '{}' is not available in this build",
                scheme
            )));
        }

        let input = check_input_dir(&self.input_dir)?;
        debug!(path = %input.display(), "Input directory");

        fs::create_dir_all(&self.output_dir).map_err(|e| MergeError::OutputDirCreateFailed {
            path: self.output_dir.clone(),
            source: e,
        })?;
        tempfile::tempfile_in(&self.output_dir).map_err(|e| MergeError::OutputNotWritable {
            path: self.output_dir.clone(),
            source: e,
        })?;
        debug!(path = %self.output_dir.display(), "Output directory ready");

        Ok(input)
    }
}

fn check_input_dir(path: &Path) -> MergeResult<PathBuf> {
    if !path.exists() {
        return Err(MergeError::InputNotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(MergeError::InputNotDirectory(path.to_path_buf()));
    }
    fs::canonicalize(path).map_err(|e| MergeError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::CompressionScheme;
    use tempfile::TempDir;

    #[test]
    fn test_new_defaults() {
        let config = MergeConfig::new(PathBuf::from("/in"), PathBuf::from("/out"));
        assert_eq!(config.jobs, DEFAULT_JOBS);
        assert_eq!(config.compression.scheme(), CompressionScheme::Store);
        assert_eq!(config.staging_root, std::env::temp_dir());
    }

    #[test]
    fn test_builder_methods() {
        let config = MergeConfig::new(PathBuf::from("/in"), PathBuf::from("/out"))
            .with_jobs(4)
            .with_compression(CompressionSettings::new(CompressionScheme::Bzip2, Some(0)))
            .with_staging_root(PathBuf::from("/scratch"));

        assert_eq!(config.jobs, 4);
        assert_eq!(config.compression.level(), Some(1));
        assert_eq!(config.staging_root, PathBuf::from("/scratch"));
    }

    #[test]
    fn test_preflight_creates_output_dir() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("out").join("nested");
        let config = MergeConfig::new(temp.path().to_path_buf(), output.clone());

        let input = config.preflight().unwrap();

        assert!(output.is_dir());
        assert_eq!(input, fs::canonicalize(temp.path()).unwrap());
        assert_eq!(fs::read_dir(&output).unwrap().count(), 0);
    }

    #[test]
    fn test_preflight_missing_input() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("out");
        let config = MergeConfig::new(temp.path().join("missing"), output.clone());

        let result = config.preflight();

        assert!(matches!(result, Err(MergeError::InputNotFound(_))));
        assert!(!output.exists());
    }

    #[test]
    fn test_preflight_input_is_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("vol.cbz");
        fs::write(&file, b"x").unwrap();
        let config = MergeConfig::new(file, temp.path().join("out"));

        assert!(matches!(
            config.preflight(),
            Err(MergeError::InputNotDirectory(_))
        ));
    }

    #[test]
    fn test_preflight_output_under_file_fails() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();
        let config = MergeConfig::new(temp.path().to_path_buf(), blocker.join("out"));

        assert!(matches!(
            config.preflight(),
            Err(MergeError::OutputDirCreateFailed { .. })
        ));
    }

    #[test]
    fn test_preflight_rejects_zero_jobs() {
        let temp = TempDir::new().unwrap();
        let config =
            MergeConfig::new(temp.path().to_path_buf(), temp.path().join("out")).with_jobs(0);
        assert!(matches!(
            config.preflight(),
            Err(MergeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_preflight_rejects_unavailable_scheme() {
        let temp = TempDir::new().unwrap();
        let config = MergeConfig::new(temp.path().to_path_buf(), temp.path().join("out"))
            .with_compression(CompressionSettings::new(CompressionScheme::Lzma, None));
        let err = config.preflight().unwrap_err();
        assert!(err.to_string().contains("lzma"));
    }
}
