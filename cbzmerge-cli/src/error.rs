//! CLI error type.

use std::fmt;

use cbzmerge::config::ConfigError;
use cbzmerge::logging::LoggingError;
use cbzmerge::merge::MergeError;

/// Errors that end the program before or instead of a merge report.
#[derive(Debug)]
pub enum CliError {
    /// Invalid or unreadable configuration.
    Config(String),
    /// A run-level merge failure.
    Merge(MergeError),
    /// The interactive prompt failed.
    Prompt(String),
    /// Logging could not be set up.
    Logging(LoggingError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Merge(e) => write!(f, "{}", e),
            CliError::Prompt(msg) => write!(f, "Prompt failed: {}", msg),
            CliError::Logging(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Merge(e) => Some(e),
            CliError::Logging(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<MergeError> for CliError {
    fn from(e: MergeError) -> Self {
        CliError::Merge(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}
