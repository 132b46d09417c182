//! Task repository implementation

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::error::{Error, Result};
use crate::models::{NewTask, Status, Task, TaskId, TaskType};
use crate::time::{format_instant, parse_optional_instant, parse_required_instant};

/// Optional field edits applied to an existing task.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub task_type_id: Option<i64>,
    pub final_priority: Option<crate::models::Priority>,
    pub deadline: Option<DateTime<Utc>>,
    pub status: Option<Status>,
}

/// Trait for task storage operations
pub trait TaskRepository {
    /// Create a new task with fresh id and timestamps
    fn create(&self, input: NewTask) -> Result<Task>;

    /// Get a task by ID
    fn get(&self, id: &TaskId) -> Result<Option<Task>>;

    /// List all tasks, most recently updated first
    fn list(&self) -> Result<Vec<Task>>;

    /// Apply field edits to a task, bumping `updated_at`
    fn update_details(&self, id: &TaskId, update: UpdateTask) -> Result<Task>;

    /// Change a task's status, bumping `updated_at`
    fn set_status(&self, id: &TaskId, status: Status) -> Result<Task>;

    /// Tasks whose `updated_at` is strictly after the given instant
    fn updated_after(&self, since: DateTime<Utc>) -> Result<Vec<Task>>;

    /// Idempotent insert-or-replace keyed by id
    fn upsert(&self, task: &Task) -> Result<()>;

    /// Flip past-deadline active tasks to overdue; returns how many changed
    fn mark_overdue(&self, now: DateTime<Utc>) -> Result<usize>;

    /// All task categories from the lookup table
    fn list_task_types(&self) -> Result<Vec<TaskType>>;

    /// Resolve a category name to its id
    fn task_type_id(&self, name: &str) -> Result<Option<i64>>;
}

/// `SQLite` implementation of `TaskRepository`
pub struct SqliteTaskRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteTaskRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a task from a database row
    ///
    /// Legacy rows may carry numeric priorities or offset-less timestamps;
    /// both are normalized here so a task read from the store is always
    /// canonical. A row whose id is not a valid UUID has no stable identity
    /// to sync under, so it yields `None` and is skipped with a warning
    /// rather than being handed a fabricated id.
    fn parse_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Option<Task>> {
        let id: String = row.get(0)?;
        let Ok(id) = id.parse() else {
            tracing::warn!(id, "Skipping stored row with unparseable id");
            return Ok(None);
        };
        let final_priority: String = row.get(6)?;
        let status: String = row.get(7)?;
        let deadline: Option<String> = row.get(8)?;
        let created_at: String = row.get(9)?;
        let updated_at: String = row.get(10)?;

        Ok(Some(Task {
            id,
            title: row.get(1)?,
            description: row.get(2)?,
            task_type_id: row.get(3)?,
            personal_priority: row.get(4)?,
            influence: row.get(5)?,
            final_priority: crate::models::Priority::from_legacy(&final_priority),
            status: Status::from_label(&status),
            deadline: parse_optional_instant(deadline.as_deref()),
            created_at: parse_required_instant(Some(&created_at), "created_at"),
            updated_at: parse_required_instant(Some(&updated_at), "updated_at"),
        }))
    }
}

const TASK_COLUMNS: &str = "id, title, description, task_type_id, personal_priority, \
     influence, final_priority, status, deadline, created_at, updated_at";

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create(&self, input: NewTask) -> Result<Task> {
        let task = Task::create(input);
        self.upsert(&task)?;
        Ok(task)
    }

    fn get(&self, id: &TaskId) -> Result<Option<Task>> {
        let result = self.conn.query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"),
            params![id.as_str()],
            Self::parse_task,
        );

        match result {
            Ok(task) => Ok(task),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> Result<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks ORDER BY updated_at DESC"
            ))?;

        let tasks = stmt
            .query_map([], Self::parse_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(tasks.into_iter().flatten().collect())
    }

    fn update_details(&self, id: &TaskId, update: UpdateTask) -> Result<Task> {
        let mut task = self
            .get(id)?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        if let Some(title) = update.title {
            task.title = title;
        }
        if let Some(description) = update.description {
            task.description = Some(description);
        }
        if let Some(task_type_id) = update.task_type_id {
            task.task_type_id = task_type_id;
        }
        if let Some(final_priority) = update.final_priority {
            task.final_priority = final_priority;
        }
        if let Some(deadline) = update.deadline {
            task.deadline = Some(deadline);
        }
        if let Some(status) = update.status {
            task.status = status;
        }
        task.updated_at = crate::time::now();

        self.upsert(&task)?;
        Ok(task)
    }

    fn set_status(&self, id: &TaskId, status: Status) -> Result<Task> {
        self.update_details(
            id,
            UpdateTask {
                status: Some(status),
                ..UpdateTask::default()
            },
        )
    }

    fn updated_after(&self, since: DateTime<Utc>) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE updated_at > ? ORDER BY updated_at ASC"
        ))?;

        let tasks = stmt
            .query_map(params![format_instant(since)], Self::parse_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(tasks.into_iter().flatten().collect())
    }

    fn upsert(&self, task: &Task) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO tasks (
                 id, title, description, task_type_id, personal_priority,
                 influence, final_priority, status, deadline, created_at, updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                task.id.as_str(),
                task.title,
                task.description,
                task.task_type_id,
                task.personal_priority,
                task.influence,
                task.final_priority.as_str(),
                task.status.as_str(),
                task.deadline.map(format_instant),
                format_instant(task.created_at),
                format_instant(task.updated_at),
            ],
        )?;
        Ok(())
    }

    fn mark_overdue(&self, now: DateTime<Utc>) -> Result<usize> {
        let changed = self.conn.execute(
            "UPDATE tasks SET status = 'overdue', updated_at = ?
             WHERE status = 'underway' AND deadline IS NOT NULL AND deadline < ?",
            params![format_instant(now), format_instant(now)],
        )?;

        if changed > 0 {
            tracing::debug!(count = changed, "Marked past-deadline tasks overdue");
        }
        Ok(changed)
    }

    fn list_task_types(&self) -> Result<Vec<TaskType>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM task_types ORDER BY id")?;

        let types = stmt
            .query_map([], |row| {
                Ok(TaskType {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(types)
    }

    fn task_type_id(&self, name: &str) -> Result<Option<i64>> {
        let result = self.conn.query_row(
            "SELECT id FROM task_types WHERE name = ? COLLATE NOCASE",
            params![name],
            |row| row.get(0),
        );

        match result {
            Ok(id) => Ok(Some(id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
