//! Interactive prompts.

use std::path::{Path, PathBuf};

use dialoguer::Input;

use crate::error::CliError;

/// Ask for the input directory, defaulting to `cwd`.
pub fn input_directory(cwd: &Path) -> Result<PathBuf, CliError> {
    let answer: String = Input::new()
        .with_prompt("Enter Directory")
        .default(cwd.display().to_string())
        .interact_text()
        .map_err(|e| CliError::Prompt(e.to_string()))?;
    Ok(PathBuf::from(answer.trim()))
}
