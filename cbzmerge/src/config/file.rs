//! Optional INI configuration file.
//!
//! Supplies defaults for settings not given on the command line:
//!
//! ```ini
//! [merge]
//! output = /home/reader/comics/volumes
//! compression = deflate
//! level = 6
//! jobs = 4
//! ```
//!
//! A missing file is not an error; every key is optional.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::archive::CompressionScheme;

const MERGE_SECTION: &str = "merge";

/// Errors that can occur while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not valid INI.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// A key has a value that cannot be used.
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// `[merge]` section values. `None` means "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSection {
    pub output: Option<PathBuf>,
    pub compression: Option<CompressionScheme>,
    pub level: Option<u8>,
    pub jobs: Option<usize>,
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub merge: MergeSection,
}

/// Default configuration file location (`<config dir>/cbzmerge/config.ini`).
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cbzmerge")
        .join("config.ini")
}

impl ConfigFile {
    /// Load the configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load the configuration from `path`; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ConfigError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Parse configuration from INI text.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let Some(section) = ini.section(Some(MERGE_SECTION)) else {
            return Ok(Self::default());
        };

        let value = |key: &str| {
            section
                .get(key)
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let merge = MergeSection {
            output: value("output").map(PathBuf::from),
            compression: value("compression")
                .map(|v| {
                    v.parse::<CompressionScheme>()
                        .map_err(|e| invalid("compression", v, e.to_string()))
                })
                .transpose()?,
            level: value("level")
                .map(|v| {
                    v.parse::<u8>()
                        .ok()
                        .filter(|l| *l <= 9)
                        .ok_or_else(|| invalid("level", v, "expected 0-9".to_string()))
                })
                .transpose()?,
            jobs: value("jobs")
                .map(|v| {
                    v.parse::<usize>()
                        .ok()
                        .filter(|j| *j > 0)
                        .ok_or_else(|| invalid("jobs", v, "expected a positive integer".to_string()))
                })
                .transpose()?,
        };

        Ok(Self { merge })
    }
}

fn invalid(key: &str, value: &str, reason: String) -> ConfigError {
    ConfigError::InvalidValue {
        key: format!("{}.{}", MERGE_SECTION, key),
        value: value.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_section() {
        let config = ConfigFile::parse(
            "[merge]\noutput = /comics/out\ncompression = bzip\nlevel = 0\njobs = 3\n",
        )
        .unwrap();

        assert_eq!(config.merge.output, Some(PathBuf::from("/comics/out")));
        assert_eq!(config.merge.compression, Some(CompressionScheme::Bzip2));
        assert_eq!(config.merge.level, Some(0));
        assert_eq!(config.merge.jobs, Some(3));
    }

    #[test]
    fn test_parse_without_section() {
        let config = ConfigFile::parse("[other]\nkey = value\n").unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_parse_empty_value_is_unset() {
        let config = ConfigFile::parse("[merge]\noutput =\n").unwrap();
        assert_eq!(config.merge.output, None);
    }

    #[test]
    fn test_parse_invalid_level() {
        let err = ConfigFile::parse("[merge]\nlevel = 12\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert!(err.to_string().contains("merge.level"));
    }

    #[test]
    fn test_parse_invalid_scheme() {
        let err = ConfigFile::parse("[merge]\ncompression = rar\n").unwrap_err();
        assert!(err.to_string().contains("rar"));
    }

    #[test]
    fn test_parse_zero_jobs() {
        assert!(ConfigFile::parse("[merge]\njobs = 0\n").is_err());
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let temp = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&temp.path().join("config.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        fs::write(&path, "[merge]\ncompression = deflate\n").unwrap();

        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.merge.compression, Some(CompressionScheme::Deflate));
    }

    #[test]
    fn test_config_file_path_name() {
        let path = config_file_path();
        assert!(path.ends_with("cbzmerge/config.ini"));
    }
}
