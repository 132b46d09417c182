use trak_core::db::{Database, SqliteTaskRepository, TaskRepository};

use crate::error::CliError;

pub fn run(db: &Database) -> Result<(), CliError> {
    let repo = SqliteTaskRepository::new(db.connection());
    for task_type in repo.list_task_types()? {
        println!("{:>3}  {}", task_type.id, task_type.name);
    }
    Ok(())
}
