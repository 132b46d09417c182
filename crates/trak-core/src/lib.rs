//! trak-core - Core library for trak
//!
//! This crate contains the shared models, local database layer, and the
//! synchronization engine used by all trak interfaces.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod sync;
pub mod time;
pub mod util;

pub use error::{Error, Result};
pub use models::{Priority, Status, Task, TaskId};
