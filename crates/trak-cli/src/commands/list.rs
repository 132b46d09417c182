use clap::Args;
use trak_core::db::{Database, SqliteTaskRepository, TaskRepository};
use trak_core::Task;

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Print tasks as JSON instead of a table
    #[arg(long)]
    pub json: bool,
    /// Include completed and cancelled tasks
    #[arg(short, long)]
    pub all: bool,
}

pub fn run(db: &Database, args: &ListArgs) -> Result<(), CliError> {
    let repo = SqliteTaskRepository::new(db.connection());
    // Refresh overdue flags so the listing reflects the current clock.
    repo.mark_overdue(trak_core::time::now())?;

    let mut tasks = repo.list()?;
    if !args.all {
        tasks.retain(|task| task.status.is_active());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }

    if tasks.is_empty() {
        println!("No tasks. Add one with `trak add <title>`.");
        return Ok(());
    }
    for task in &tasks {
        println!("{}", render_line(task));
    }
    Ok(())
}

fn render_line(task: &Task) -> String {
    let full_id = task.id.as_str();
    let id = &full_id[..8];
    let deadline = task
        .deadline
        .map_or_else(|| "-".to_owned(), |d| d.format("%Y-%m-%d").to_string());
    format!(
        "{id}  {:<9}  {:<7}  {deadline:<10}  {}",
        task.status.as_str(),
        task.final_priority.as_str(),
        task.title
    )
}
