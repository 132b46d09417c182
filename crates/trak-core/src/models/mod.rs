//! Data models for trak

mod priority;
mod task;
mod task_type;

pub use priority::Priority;
pub use task::{NewTask, Status, Task, TaskId};
pub use task_type::{TaskType, DEFAULT_TASK_TYPES};
