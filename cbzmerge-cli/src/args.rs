//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgGroup, Parser, ValueEnum};
use cbzmerge::archive::CompressionScheme;
use cbzmerge::logging::Verbosity;

/// Combine multiple CBZ archives into one file per directory.
#[derive(Debug, Parser)]
#[command(name = "cbzmerge", version, about, long_about = None)]
#[command(group(ArgGroup::new("verbosity").args(["verbose", "silent"])))]
pub struct Cli {
    /// Directory containing CBZ files (prompted for when omitted)
    #[arg(short = 'd', long)]
    pub directory: Option<PathBuf>,

    /// Directory which will contain output CBZ file(s) [default: current directory]
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Compression type [default: store]
    #[arg(short = 'c', long, value_enum)]
    pub compression: Option<CompressionArg>,

    /// Compression level, 0-9 [default: 5]
    #[arg(
        short = 'l',
        long = "compresslevel",
        value_name = "0-9",
        value_parser = clap::value_parser!(u8).range(0..=9)
    )]
    pub level: Option<u8>,

    /// Number of archives extracted in parallel [default: 1]
    #[arg(short = 'j', long, value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: Option<u16>,

    /// Configuration file [default: <config dir>/cbzmerge/config.ini]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also write log output to this file
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Enable verbose mode
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Enable silent mode
    #[arg(short = 's', long)]
    pub silent: bool,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        if self.verbose {
            Verbosity::Verbose
        } else if self.silent {
            Verbosity::Silent
        } else {
            Verbosity::Normal
        }
    }
}

/// Compression selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum CompressionArg {
    /// No compression
    Store,
    /// DEFLATE compression, levels 0-9
    #[value(alias = "deflated")]
    Deflate,
    /// BZIP2 compression, levels 1-9
    #[value(alias = "bzip")]
    Bzip2,
    /// LZMA compression (not available for writing in this build)
    Lzma,
}

impl From<CompressionArg> for CompressionScheme {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::Store => CompressionScheme::Store,
            CompressionArg::Deflate => CompressionScheme::Deflate,
            CompressionArg::Bzip2 => CompressionScheme::Bzip2,
            CompressionArg::Lzma => CompressionScheme::Lzma,
        }
    }
}
