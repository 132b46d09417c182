//! Task type lookup model

use serde::{Deserialize, Serialize};

/// A task category from the fixed lookup table.
///
/// Created once on first local-store initialization; only the id travels
/// with a task, the table itself is not synchronized per-record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskType {
    pub id: i64,
    pub name: String,
}

/// Categories seeded into a fresh local store.
pub const DEFAULT_TASK_TYPES: [&str; 11] = [
    "Other",
    "Meeting",
    "Dust Cleaning",
    "Documentation",
    "Customer Support",
    "Code Bug Fix",
    "Research",
    "Optimization",
    "Deployment",
    "Project Management",
    "Feature Development",
];
