use clap::Args;
use trak_core::db::{Database, SqliteTaskRepository, TaskRepository};
use trak_core::models::{NewTask, Priority};
use trak_core::util::normalize_text_option;

use crate::commands::common;
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Title of the new task
    pub title: String,
    /// Longer free-form description
    #[arg(short, long)]
    pub description: Option<String>,
    /// Task type name, e.g. "Research" (see `trak types`)
    #[arg(short = 't', long = "type", default_value = "Other")]
    pub task_type: String,
    /// How important this feels to you, 1-5
    #[arg(long, default_value_t = 3)]
    pub personal_priority: i64,
    /// How much this affects others, 1-5
    #[arg(long, default_value_t = 3)]
    pub influence: i64,
    /// Overall priority: Casual, Low, Mid, High or Extreme
    #[arg(short, long, default_value = "Mid")]
    pub priority: String,
    /// Deadline as YYYY-MM-DD or a full RFC 3339 instant
    #[arg(long)]
    pub deadline: Option<String>,
}

pub fn run(db: &Database, args: AddArgs) -> Result<(), CliError> {
    let title = args.title.trim();
    if title.is_empty() {
        return Err(CliError::EmptyTitle);
    }

    let repo = SqliteTaskRepository::new(db.connection());
    let task_type_id = common::resolve_task_type(&repo, &args.task_type)?;
    let deadline = args
        .deadline
        .as_deref()
        .map(common::parse_deadline)
        .transpose()?;

    let task = repo.create(NewTask {
        title: title.to_owned(),
        description: normalize_text_option(args.description),
        task_type_id,
        personal_priority: args.personal_priority.clamp(1, 5),
        influence: args.influence.clamp(1, 5),
        final_priority: Priority::from_legacy(&args.priority),
        deadline,
    })?;

    println!("Added {} ({})", task.title, task.id);
    Ok(())
}
