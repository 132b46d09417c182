//! Merge engine: per-record last-write-wins resolution.

use chrono::{DateTime, Utc};

use crate::db::TaskRepository;
use crate::error::Result;
use crate::models::Task;

use super::transport::TaskDto;

/// The resolution chosen for one remote record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAction {
    /// No local record with this id exists
    Insert,
    /// Remote is strictly newer, remote wins
    Replace,
    /// Local is at least as fresh (ties favor local)
    Skip,
}

/// Decide between a fetched remote record and the local copy, if any.
///
/// Last-write-wins by `updated_at`. A tie favors the local copy: it is
/// already at least as fresh, and skipping keeps the apply idempotent.
#[must_use]
pub fn reconcile(remote_updated_at: DateTime<Utc>, local: Option<&Task>) -> MergeAction {
    match local {
        None => MergeAction::Insert,
        Some(existing) if remote_updated_at > existing.updated_at => MergeAction::Replace,
        Some(_) => MergeAction::Skip,
    }
}

/// Reconcile one pulled record and apply the outcome via idempotent upsert.
///
/// Records with an unusable id are skipped with a warning rather than
/// aborting the cycle; local-store failures propagate.
pub fn apply_remote(repo: &impl TaskRepository, dto: TaskDto) -> Result<MergeAction> {
    let remote_updated_at = dto.updated_at_instant();

    let task = match dto.into_task() {
        Ok(task) => task,
        Err(error) => {
            tracing::warn!("Skipping remote record with unusable id: {error}");
            return Ok(MergeAction::Skip);
        }
    };

    let local = repo.get(&task.id)?;
    let action = reconcile(remote_updated_at, local.as_ref());

    match action {
        MergeAction::Insert | MergeAction::Replace => {
            tracing::debug!(id = %task.id, ?action, "Applying remote record");
            repo.upsert(&task)?;
        }
        MergeAction::Skip => {
            tracing::debug!(id = %task.id, "Local copy is at least as fresh, skipping");
        }
    }

    Ok(action)
}
