//! Shared helpers used by several subcommands.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use trak_core::config::ClientConfig;
use trak_core::db::{Database, SqliteTaskRepository, TaskRepository};
use trak_core::Task;

use crate::error::CliError;
use crate::paths;

/// Loads the client configuration, falling back to defaults when no
/// config file has been written yet.
pub fn load_config() -> Result<ClientConfig, CliError> {
    let path = paths::config_file()?;
    match std::fs::read_to_string(&path) {
        Ok(raw) => ClientConfig::parse(&raw)
            .map_err(|error| CliError::Config(format!("{}: {error}", path.display()))),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(ClientConfig::default())
        }
        Err(error) => Err(CliError::Io(error)),
    }
}

pub fn open_database(db_path: Option<PathBuf>) -> Result<Database, CliError> {
    let path = match db_path {
        Some(path) => path,
        None => paths::default_db_path()?,
    };
    Ok(Database::open(&path)?)
}

/// Resolves a user-supplied id prefix to a single task. Prefixes make the
/// CLI usable without pasting full UUIDs.
pub fn resolve_task(repo: &SqliteTaskRepository<'_>, prefix: &str) -> Result<Task, CliError> {
    let needle = prefix.trim().to_lowercase();
    if needle.is_empty() {
        return Err(CliError::TaskNotFound(prefix.to_owned()));
    }
    let mut matches: Vec<Task> = repo
        .list()?
        .into_iter()
        .filter(|task| task.id.as_str().starts_with(&needle))
        .collect();
    match matches.len() {
        0 => Err(CliError::TaskNotFound(prefix.to_owned())),
        1 => Ok(matches.remove(0)),
        _ => Err(CliError::AmbiguousTaskId(prefix.to_owned())),
    }
}

pub fn resolve_task_type(
    repo: &SqliteTaskRepository<'_>,
    name: &str,
) -> Result<i64, CliError> {
    repo.task_type_id(name)?
        .ok_or_else(|| CliError::UnknownTaskType(name.to_owned()))
}

/// Accepts either a bare date (`2026-09-15`, meaning end of that day UTC)
/// or a full RFC 3339 instant.
pub fn parse_deadline(raw: &str) -> Result<DateTime<Utc>, CliError> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let end_of_day = date
            .and_hms_opt(23, 59, 59)
            .ok_or_else(|| CliError::InvalidDeadline(raw.to_owned()))?;
        return Ok(end_of_day.and_utc());
    }
    trak_core::time::parse_instant(trimmed)
        .map_err(|_| CliError::InvalidDeadline(raw.to_owned()))
}
