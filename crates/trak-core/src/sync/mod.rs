//! Synchronization engine.
//!
//! One sync cycle pushes local changes made since the watermark, pulls
//! remote changes since the same watermark, merges them with last-write-wins
//! per record, and advances the watermark only after the whole cycle
//! succeeds.

mod engine;
mod merge;
mod transport;

pub use engine::{SyncEngine, SyncError, SyncReport};
pub use merge::{apply_remote, reconcile, MergeAction};
pub use transport::{
    HttpTransport, PullBatch, RemoteTransport, TaskDto, TransportError,
};
