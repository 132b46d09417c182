//! Task model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Priority;

/// A unique identifier for a task, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Create a new unique task ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Task lifecycle status.
///
/// `Overdue` is locally derived by comparing `deadline` against now; the
/// remote side never sets it, but once set it travels like any other field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Underway,
    Completed,
    Overdue,
    Cancelled,
}

impl Status {
    /// The lowercase wire/storage label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Underway => "underway",
            Self::Completed => "completed",
            Self::Overdue => "overdue",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse a stored or inbound status label, defaulting to `Underway`.
    #[must_use]
    pub fn from_label(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "completed" => Self::Completed,
            "overdue" => Self::Overdue,
            "cancelled" => Self::Cancelled,
            "underway" => Self::Underway,
            other => {
                if !other.is_empty() {
                    tracing::warn!(value = other, "Unrecognized status, defaulting to underway");
                }
                Self::Underway
            }
        }
    }

    /// Whether a task in this status can still become overdue.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Underway | Self::Overdue)
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::Underway
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task in the system — the unit of synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, generated client-side, immutable once created
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    /// Reference into the `task_types` lookup table
    pub task_type_id: i64,
    /// Self-reported importance, local-only semantics
    pub personal_priority: i64,
    /// Local-only weighting
    pub influence: i64,
    /// Canonical priority, always one of the five labels inside the store
    pub final_priority: Priority,
    pub status: Status,
    pub deadline: Option<DateTime<Utc>>,
    /// Set once at creation, never modified afterward
    pub created_at: DateTime<Utc>,
    /// Bumped on every accepted mutation; drives last-write-wins and the
    /// watermark-based change detection
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task locally.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub task_type_id: i64,
    pub personal_priority: i64,
    pub influence: i64,
    pub final_priority: Priority,
    pub deadline: Option<DateTime<Utc>>,
}

impl Default for NewTask {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: None,
            // Type 1 is the seeded "Other" bucket.
            task_type_id: 1,
            personal_priority: 3,
            influence: 3,
            final_priority: Priority::Mid,
            deadline: None,
        }
    }
}

impl Task {
    /// Create a task from user input with fresh id and timestamps.
    #[must_use]
    pub fn create(input: NewTask) -> Self {
        let now = crate::time::now();
        Self {
            id: TaskId::new(),
            title: input.title,
            description: input.description,
            task_type_id: input.task_type_id,
            personal_priority: input.personal_priority,
            influence: input.influence,
            final_priority: input.final_priority,
            status: Status::Underway,
            deadline: input.deadline,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the deadline has passed for a task that is still active.
    #[must_use]
    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        self.status.is_active() && self.deadline.is_some_and(|deadline| deadline < now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_input() -> NewTask {
        NewTask {
            title: "Write report".to_string(),
            description: None,
            task_type_id: 1,
            personal_priority: 5,
            influence: 3,
            final_priority: Priority::High,
            deadline: None,
        }
    }

    #[test]
    fn task_id_unique_and_parseable() {
        let id1 = TaskId::new();
        let id2 = TaskId::new();
        assert_ne!(id1, id2);

        let parsed: TaskId = id1.as_str().parse().unwrap();
        assert_eq!(id1, parsed);
    }

    #[test]
    fn create_sets_equal_timestamps() {
        let task = Task::create(sample_input());
        assert_eq!(task.created_at, task.updated_at);
        assert_eq!(task.status, Status::Underway);
    }

    #[test]
    fn status_labels_round_trip() {
        for status in [
            Status::Underway,
            Status::Completed,
            Status::Overdue,
            Status::Cancelled,
        ] {
            assert_eq!(Status::from_label(status.as_str()), status);
        }
        assert_eq!(Status::from_label("garbage"), Status::Underway);
    }

    #[test]
    fn past_deadline_only_for_active_tasks() {
        let now = Utc::now();
        let mut task = Task::create(sample_input());
        task.deadline = Some(now - chrono::Duration::hours(1));
        assert!(task.is_past_deadline(now));

        task.status = Status::Completed;
        assert!(!task.is_past_deadline(now));

        task.status = Status::Underway;
        task.deadline = None;
        assert!(!task.is_past_deadline(now));
    }
}
