//! Local database layer for trak

mod connection;
mod migrations;
mod task_repository;
mod watermark;

pub use connection::Database;
pub use task_repository::{SqliteTaskRepository, TaskRepository, UpdateTask};
pub use watermark::{SqliteWatermarkStore, WatermarkStore, WATERMARK_SENTINEL};
