//! cbzmerge CLI - Command-line interface
//!
//! Merges the CBZ archives of a directory, and of each of its immediate
//! subdirectories, into one `<directory>.cbz` per directory.
//!
//! Exit codes: `0` every volume written, `1` some volume aborted, `2` the
//! run could not start.

mod args;
mod error;
mod output;
mod prompt;
mod resolve;

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use console::style;
use tracing::{debug, info};

use cbzmerge::config::ConfigFile;
use cbzmerge::logging::{init_logging, Verbosity};
use cbzmerge::merge::{MergeOrchestrator, RunReport};

use crate::args::Cli;
use crate::error::CliError;
use crate::output::BarProgress;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<RunReport, CliError> {
    let verbosity = cli.verbosity();
    let _guard = init_logging(verbosity, cli.log_file.as_deref())?;

    let config_file = match &cli.config {
        Some(path) if !path.is_file() => {
            return Err(CliError::Config(format!(
                "config file {} not found",
                path.display()
            )));
        }
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };

    let cwd = env::current_dir()
        .map_err(|e| CliError::Config(format!("cannot determine current directory: {}", e)))?;

    let input = match &cli.directory {
        Some(dir) => dir.clone(),
        None => prompt::input_directory(&cwd)?,
    };
    let config = resolve::merge_config(&cli, &config_file, input, &cwd)?;

    debug!(
        input = %config.input_dir.display(),
        output = %config.output_dir.display(),
        compression = %config.compression,
        jobs = config.jobs,
        "Resolved configuration"
    );
    info!(directory = %config.input_dir.display(), "Merging");

    let silent = verbosity == Verbosity::Silent;
    let orchestrator = MergeOrchestrator::new(config)?
        .with_progress(Arc::new(BarProgress::new(silent)));
    let report = orchestrator.run()?;

    if !silent {
        output::print_summary(&report);
    }
    Ok(report)
}
