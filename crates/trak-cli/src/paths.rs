//! Per-user file locations for the CLI.

use std::path::PathBuf;

use crate::error::CliError;

const APP_DIR: &str = "trak";

/// Directory for the config and session files, created on demand.
pub fn config_dir() -> Result<PathBuf, CliError> {
    let base = dirs::config_dir()
        .ok_or_else(|| CliError::Config("could not determine a config directory".to_string()))?;
    let dir = base.join(APP_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Default location of the local task database, created on demand.
pub fn default_db_path() -> Result<PathBuf, CliError> {
    let base = dirs::data_dir()
        .ok_or_else(|| CliError::Config("could not determine a data directory".to_string()))?;
    let dir = base.join(APP_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join("trak.db"))
}

pub fn config_file() -> Result<PathBuf, CliError> {
    Ok(config_dir()?.join("config.json"))
}

pub fn session_file() -> Result<PathBuf, CliError> {
    Ok(config_dir()?.join("session.json"))
}
