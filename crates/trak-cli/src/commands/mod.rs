pub mod add;
pub mod auth_cmd;
pub mod common;
pub mod config_cmd;
pub mod list;
pub mod sync;
pub mod task;
pub mod types;
