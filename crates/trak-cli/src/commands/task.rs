//! Subcommands that act on a single existing task.

use clap::Args;
use trak_core::db::{Database, SqliteTaskRepository, TaskRepository, UpdateTask};
use trak_core::models::{Priority, Status};
use trak_core::util::normalize_text_option;

use crate::commands::common;
use crate::error::CliError;

pub fn set_status(db: &Database, id_prefix: &str, status: Status) -> Result<(), CliError> {
    let repo = SqliteTaskRepository::new(db.connection());
    let task = common::resolve_task(&repo, id_prefix)?;
    let updated = repo.set_status(&task.id, status)?;
    println!("{} is now {}", updated.title, updated.status);
    Ok(())
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Task id or unique id prefix
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    /// Task type name (see `trak types`)
    #[arg(short = 't', long = "type")]
    pub task_type: Option<String>,
    /// Casual, Low, Mid, High or Extreme
    #[arg(short, long)]
    pub priority: Option<String>,
    /// YYYY-MM-DD or a full RFC 3339 instant
    #[arg(long)]
    pub deadline: Option<String>,
}

pub fn edit(db: &Database, args: EditArgs) -> Result<(), CliError> {
    let repo = SqliteTaskRepository::new(db.connection());
    let task = common::resolve_task(&repo, &args.id)?;

    if let Some(title) = &args.title {
        if title.trim().is_empty() {
            return Err(CliError::EmptyTitle);
        }
    }
    let task_type_id = args
        .task_type
        .as_deref()
        .map(|name| common::resolve_task_type(&repo, name))
        .transpose()?;
    let deadline = args
        .deadline
        .as_deref()
        .map(common::parse_deadline)
        .transpose()?;

    let updated = repo.update_details(
        &task.id,
        UpdateTask {
            title: args.title.map(|t| t.trim().to_owned()),
            description: normalize_text_option(args.description),
            task_type_id,
            final_priority: args.priority.as_deref().map(Priority::from_legacy),
            deadline,
            status: None,
        },
    )?;
    println!("Updated {} ({})", updated.title, updated.id);
    Ok(())
}
