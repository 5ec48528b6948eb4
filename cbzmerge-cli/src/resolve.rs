//! Resolve settings from CLI arguments and the config file.
//!
//! CLI arguments take precedence, then `[merge]` config values, then
//! built-in defaults.

use std::path::{Path, PathBuf};

use cbzmerge::archive::{CompressionScheme, CompressionSettings, DEFAULT_LEVEL};
use cbzmerge::config::{ConfigFile, MergeConfig, DEFAULT_JOBS};

use crate::args::Cli;
use crate::error::CliError;

/// Make `path` absolute against `cwd`.
pub fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Resolve the output compression.
///
/// Rejects schemes this build cannot write, listing the ones it can.
pub fn resolve_compression(cli: &Cli, config: &ConfigFile) -> Result<CompressionSettings, CliError> {
    let scheme = cli
        .compression
        .map(CompressionScheme::from)
        .or(config.merge.compression)
        .unwrap_or_default();

    if !scheme.is_available() {
        let available: Vec<&str> = CompressionScheme::available()
            .iter()
            .map(|s| s.name())
            .collect();
        return Err(CliError::Config(format!(
            "compression '{}' is not available, choose one of: {}",
            scheme,
            available.join(", ")
        )));
    }

    let level = cli.level.or(config.merge.level).unwrap_or(DEFAULT_LEVEL);
    Ok(CompressionSettings::new(scheme, Some(level)))
}

/// Build the engine configuration for `input`.
pub fn merge_config(
    cli: &Cli,
    config: &ConfigFile,
    input: PathBuf,
    cwd: &Path,
) -> Result<MergeConfig, CliError> {
    let output = cli
        .output
        .clone()
        .or_else(|| config.merge.output.clone())
        .map(|p| absolutize(&p, cwd))
        .unwrap_or_else(|| cwd.to_path_buf());

    let jobs = cli
        .jobs
        .map(usize::from)
        .or(config.merge.jobs)
        .unwrap_or(DEFAULT_JOBS);

    Ok(MergeConfig::new(absolutize(&input, cwd), output)
        .with_compression(resolve_compression(cli, config)?)
        .with_jobs(jobs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["cbzmerge"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_absolutize() {
        let cwd = Path::new("/home/reader");
        assert_eq!(absolutize(Path::new("comics"), cwd), PathBuf::from("/home/reader/comics"));
        assert_eq!(absolutize(Path::new("/srv/comics"), cwd), PathBuf::from("/srv/comics"));
    }

    #[test]
    fn test_defaults_without_config() {
        let config = merge_config(
            &cli(&[]),
            &ConfigFile::default(),
            PathBuf::from("series"),
            Path::new("/work"),
        )
        .unwrap();

        assert_eq!(config.input_dir, PathBuf::from("/work/series"));
        assert_eq!(config.output_dir, PathBuf::from("/work"));
        assert_eq!(config.compression.scheme(), CompressionScheme::Store);
        assert_eq!(config.compression.level(), None);
        assert_eq!(config.jobs, DEFAULT_JOBS);
    }

    #[test]
    fn test_config_file_fills_gaps() {
        let file = ConfigFile::parse(
            "[merge]\noutput = volumes\ncompression = deflate\nlevel = 9\njobs = 3\n",
        )
        .unwrap();

        let config =
            merge_config(&cli(&[]), &file, PathBuf::from("/in"), Path::new("/work")).unwrap();

        assert_eq!(config.output_dir, PathBuf::from("/work/volumes"));
        assert_eq!(config.compression.scheme(), CompressionScheme::Deflate);
        assert_eq!(config.compression.level(), Some(9));
        assert_eq!(config.jobs, 3);
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let file = ConfigFile::parse("[merge]\ncompression = deflate\nlevel = 9\n").unwrap();

        let settings = resolve_compression(&cli(&["-c", "bzip2", "-l", "0"]), &file).unwrap();

        assert_eq!(settings.scheme(), CompressionScheme::Bzip2);
        assert_eq!(settings.level(), Some(1));
    }

    #[test]
    fn test_default_level_applies_to_deflate() {
        let settings = resolve_compression(&cli(&["-c", "deflated"]), &ConfigFile::default())
            .unwrap();
        assert_eq!(settings.level(), Some(DEFAULT_LEVEL));
    }

    #[test]
    fn test_unavailable_scheme_lists_alternatives() {
        let err = resolve_compression(&cli(&["-c", "lzma"]), &ConfigFile::default()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("lzma"));
        assert!(message.contains("store, deflate, bzip2"));
    }
}
