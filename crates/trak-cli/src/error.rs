use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] trak_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Sync error: {0}")]
    Sync(#[from] trak_core::sync::SyncError),
    #[error("Transport error: {0}")]
    Transport(#[from] trak_core::sync::TransportError),
    #[error("Authentication error: {0}")]
    Auth(#[from] trak_core::auth::AuthError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Task title cannot be empty")]
    EmptyTitle,
    #[error("Task not found for id/prefix: {0}")]
    TaskNotFound(String),
    #[error("Id prefix {0:?} matches more than one task, use more characters")]
    AmbiguousTaskId(String),
    #[error("Unknown task type: {0} (see `trak types`)")]
    UnknownTaskType(String),
    #[error("Invalid deadline {0:?}, expected YYYY-MM-DD or an ISO-8601 instant")]
    InvalidDeadline(String),
    #[error("Not signed in. Run `trak auth login <email> --password <password>` first.")]
    NotLoggedIn,
}
