//! Sync orchestrator: drives one full push/pull/merge cycle.

use std::fmt;

use thiserror::Error;

use crate::auth::TokenSource;
use crate::db::{Database, SqliteTaskRepository, SqliteWatermarkStore, TaskRepository, WatermarkStore};

use super::merge::{apply_remote, MergeAction};
use super::transport::{RemoteTransport, TaskDto, TransportError};

/// Why a sync cycle failed.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Another cycle is in flight; this invocation was rejected, not queued
    #[error("A sync cycle is already running")]
    CycleInFlight,

    /// No valid credential; terminal for this cycle, no network call made
    #[error("Not signed in, or the session has expired")]
    Unauthenticated,

    /// Timeout or connection failure; transient, retry externally
    #[error("Network failure: {0}")]
    Network(String),

    /// Non-2xx or malformed response; treated as transient by default
    #[error("Server rejected the request: {message} (HTTP {status})")]
    ServerRejected { status: u16, message: String },

    /// Local store write failure; aborts the cycle
    #[error("Local store failure: {0}")]
    LocalStore(#[from] crate::Error),
}

impl From<TransportError> for SyncError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Network(inner) => Self::Network(inner.to_string()),
            TransportError::Timeout => Self::Network("request timed out".to_string()),
            TransportError::InvalidConfiguration(message) => Self::Network(message),
            TransportError::Rejected { status, message } => {
                Self::ServerRejected { status, message }
            }
            TransportError::Malformed { status, message } => Self::ServerRejected {
                status,
                message: format!("malformed response: {message}"),
            },
        }
    }
}

/// Aggregate outcome of one successful cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub pushed: usize,
    pub inserted: usize,
    pub replaced: usize,
    pub skipped: usize,
    pub server_time: chrono::DateTime<chrono::Utc>,
}

impl SyncReport {
    /// How many remote records the pull phase delivered.
    #[must_use]
    pub const fn pulled(&self) -> usize {
        self.inserted + self.replaced + self.skipped
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pushed {} task(s), pulled {} ({} inserted, {} replaced, {} skipped)",
            self.pushed,
            self.pulled(),
            self.inserted,
            self.replaced,
            self.skipped
        )
    }
}

/// Drives one full sync cycle against explicit collaborators.
///
/// Construction wires in everything the cycle touches: the local store,
/// the transport, and the credential source. Both the manual trigger and
/// the periodic scheduler funnel through [`SyncEngine::run_cycle`], whose
/// internal guard ensures at most one cycle is in flight.
pub struct SyncEngine<'db, T: RemoteTransport, C: TokenSource> {
    db: &'db Database,
    transport: T,
    tokens: C,
    cycle_guard: tokio::sync::Mutex<()>,
}

impl<'db, T: RemoteTransport, C: TokenSource> SyncEngine<'db, T, C> {
    pub const fn new(db: &'db Database, transport: T, tokens: C) -> Self {
        Self {
            db,
            transport,
            tokens,
            cycle_guard: tokio::sync::Mutex::const_new(()),
        }
    }

    /// Run one full cycle: read watermark, push local changes, pull remote
    /// changes, merge, and advance the watermark only on full success.
    ///
    /// The engine never retries internally; a failed cycle leaves the
    /// watermark untouched so the next invocation safely re-covers the
    /// same window.
    pub async fn run_cycle(&self) -> Result<SyncReport, SyncError> {
        let _guard = self
            .cycle_guard
            .try_lock()
            .map_err(|_| SyncError::CycleInFlight)?;

        let token = self.tokens.valid_token().ok_or(SyncError::Unauthenticated)?;

        let repo = SqliteTaskRepository::new(self.db.connection());
        let watermark_store = SqliteWatermarkStore::new(self.db.connection());
        let watermark = watermark_store.read()?;
        tracing::debug!(%watermark, "Starting sync cycle");

        // Push phase: everything changed locally since the watermark.
        let pending = repo.updated_after(watermark)?;
        let pushed = pending.len();
        if pending.is_empty() {
            tracing::debug!("No local changes to push");
        } else {
            let outbound: Vec<TaskDto> = pending.iter().map(TaskDto::from_task).collect();
            self.transport.push(&token, &outbound).await?;
            tracing::debug!(count = pushed, "Pushed local changes");
        }

        // Pull phase: remote changes since the same watermark.
        let batch = self.transport.pull(&token, watermark).await?;

        let mut inserted = 0;
        let mut replaced = 0;
        let mut skipped = 0;
        for dto in batch.tasks {
            match apply_remote(&repo, dto)? {
                MergeAction::Insert => inserted += 1,
                MergeAction::Replace => replaced += 1,
                MergeAction::Skip => skipped += 1,
            }
        }

        // The watermark only ever moves forward, and only after every
        // pulled record has been applied.
        if batch.server_time > watermark {
            watermark_store.write(batch.server_time)?;
        } else {
            tracing::debug!(
                server_time = %batch.server_time,
                "Server time does not advance the watermark"
            );
        }

        let report = SyncReport {
            pushed,
            inserted,
            replaced,
            skipped,
            server_time: batch.server_time,
        };
        tracing::info!("Sync cycle complete: {report}");
        Ok(report)
    }

    /// Collaborator-facing surface for UI and scheduler triggers: a success
    /// flag plus a human-readable message.
    pub async fn run_sync(&self) -> (bool, String) {
        match self.run_cycle().await {
            Ok(report) => (true, format!("Sync complete: {report}")),
            Err(error) => (false, format!("Sync failed: {error}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewTask, Priority, Status, Task, TaskId};
    use crate::sync::transport::PullBatch;
    use crate::time::parse_instant;
    use chrono::{DateTime, Duration, Utc};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeTokens(Option<&'static str>);

    impl TokenSource for FakeTokens {
        fn valid_token(&self) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    #[derive(Default)]
    struct FakeTransport {
        pushed: Mutex<Vec<Vec<TaskDto>>>,
        pull_calls: AtomicUsize,
        fail_push_with_timeout: bool,
        pull_tasks: Mutex<Vec<TaskDto>>,
        server_time: Option<DateTime<Utc>>,
        yield_in_pull: bool,
    }

    impl FakeTransport {
        fn with_server_time(time: &str) -> Self {
            Self {
                server_time: Some(parse_instant(time).unwrap()),
                ..Self::default()
            }
        }

        fn queue_pull(&self, tasks: Vec<TaskDto>) {
            *self.pull_tasks.lock().unwrap() = tasks;
        }
    }

    impl RemoteTransport for &FakeTransport {
        async fn push(&self, _token: &str, tasks: &[TaskDto]) -> Result<(), TransportError> {
            if self.fail_push_with_timeout {
                return Err(TransportError::Timeout);
            }
            self.pushed.lock().unwrap().push(tasks.to_vec());
            Ok(())
        }

        async fn pull(
            &self,
            _token: &str,
            _since: DateTime<Utc>,
        ) -> Result<PullBatch, TransportError> {
            self.pull_calls.fetch_add(1, Ordering::SeqCst);
            if self.yield_in_pull {
                tokio::task::yield_now().await;
            }
            Ok(PullBatch {
                tasks: self.pull_tasks.lock().unwrap().clone(),
                server_time: self.server_time.unwrap_or_else(Utc::now),
            })
        }
    }

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn create_local(db: &Database, title: &str) -> Task {
        SqliteTaskRepository::new(db.connection())
            .create(NewTask {
                title: title.to_string(),
                description: None,
                task_type_id: 1,
                personal_priority: 5,
                influence: 2,
                final_priority: Priority::High,
                deadline: None,
            })
            .unwrap()
    }

    fn watermark_of(db: &Database) -> DateTime<Utc> {
        SqliteWatermarkStore::new(db.connection()).read().unwrap()
    }

    fn remote_task(title: &str, updated_at: DateTime<Utc>) -> TaskDto {
        let mut task = Task::create(NewTask {
            title: title.to_string(),
            description: None,
            task_type_id: 1,
            personal_priority: 0,
            influence: 0,
            final_priority: Priority::Mid,
            deadline: None,
        });
        task.created_at = updated_at - Duration::hours(1);
        task.updated_at = updated_at;
        TaskDto::from_task(&task)
    }

    #[tokio::test]
    async fn unauthenticated_short_circuits_before_any_network_call() {
        let db = setup_db();
        create_local(&db, "Pending change");
        let transport = FakeTransport::default();
        let engine = SyncEngine::new(&db, &transport, FakeTokens(None));

        let error = engine.run_cycle().await.unwrap_err();
        assert!(matches!(error, SyncError::Unauthenticated));
        assert!(transport.pushed.lock().unwrap().is_empty());
        assert_eq!(transport.pull_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_change_set_skips_the_push_phase() {
        let db = setup_db();
        let transport = FakeTransport::with_server_time("2024-06-01T12:00:00Z");
        let engine = SyncEngine::new(&db, &transport, FakeTokens(Some("token")));

        let report = engine.run_cycle().await.unwrap();
        assert_eq!(report.pushed, 0);
        assert!(transport.pushed.lock().unwrap().is_empty());
        assert_eq!(transport.pull_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn pushed_records_carry_canonical_priorities() {
        let db = setup_db();
        let task = create_local(&db, "Outbound");
        let transport = FakeTransport::with_server_time("2030-01-01T00:00:00Z");
        let engine = SyncEngine::new(&db, &transport, FakeTokens(Some("token")));

        let report = engine.run_cycle().await.unwrap();
        assert_eq!(report.pushed, 1);

        let pushed = transport.pushed.lock().unwrap();
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0][0].id, task.id.as_str());
        assert_eq!(pushed[0][0].final_priority, "High");
        assert_eq!(pushed[0][0].status, "underway");
    }

    #[tokio::test]
    async fn scenario_a_older_remote_copy_is_skipped() {
        let db = setup_db();
        let local = create_local(&db, "Fresh local edit");
        let transport = FakeTransport::with_server_time("2030-01-01T00:00:00Z");

        let mut stale = local.clone();
        stale.title = "Stale remote edit".to_string();
        stale.updated_at = local.updated_at - Duration::seconds(1);
        transport.queue_pull(vec![TaskDto::from_task(&stale)]);

        let engine = SyncEngine::new(&db, &transport, FakeTokens(Some("token")));
        let report = engine.run_cycle().await.unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.inserted + report.replaced, 0);
        let stored = SqliteTaskRepository::new(db.connection())
            .get(&local.id)
            .unwrap()
            .unwrap();
        assert_eq!(stored, local);
    }

    #[tokio::test]
    async fn scenario_b_unknown_remote_task_is_inserted_canonically() {
        let db = setup_db();
        let transport = FakeTransport::with_server_time("2030-01-01T00:00:00Z");

        let mut dto = remote_task("From the server", Utc::now());
        let id: TaskId = dto.id.parse().unwrap();
        dto.final_priority = "5".to_string();
        transport.queue_pull(vec![dto]);

        let engine = SyncEngine::new(&db, &transport, FakeTokens(Some("token")));
        let report = engine.run_cycle().await.unwrap();

        assert_eq!(report.inserted, 1);
        let stored = SqliteTaskRepository::new(db.connection())
            .get(&id)
            .unwrap()
            .unwrap();
        assert_eq!(stored.final_priority, Priority::Extreme);
        assert_eq!(stored.status, Status::Underway);
        assert_eq!(watermark_of(&db), parse_instant("2030-01-01T00:00:00Z").unwrap());
    }

    #[tokio::test]
    async fn scenario_c_push_failure_aborts_without_side_effects() {
        let db = setup_db();
        let local = create_local(&db, "Unsynced change");
        let pre_watermark = watermark_of(&db);

        let transport = FakeTransport {
            fail_push_with_timeout: true,
            ..FakeTransport::default()
        };
        let engine = SyncEngine::new(&db, &transport, FakeTokens(Some("token")));

        let error = engine.run_cycle().await.unwrap_err();
        assert!(matches!(error, SyncError::Network(_)));
        assert_eq!(watermark_of(&db), pre_watermark);
        assert_eq!(transport.pull_calls.load(Ordering::SeqCst), 0);

        let stored = SqliteTaskRepository::new(db.connection())
            .get(&local.id)
            .unwrap()
            .unwrap();
        assert_eq!(stored, local);
    }

    #[tokio::test]
    async fn mid_pull_store_failure_leaves_the_watermark_untouched() {
        let db = setup_db();
        let pre_watermark = watermark_of(&db);
        let transport = FakeTransport::with_server_time("2030-01-01T00:00:00Z");

        // Second record violates the task_types foreign key, so the upsert
        // fails partway through the apply loop, after the pull succeeded.
        let good = remote_task("Applies cleanly", Utc::now());
        let mut bad = remote_task("Fails the store write", Utc::now());
        bad.task_type_id = 999;
        transport.queue_pull(vec![good, bad]);

        let engine = SyncEngine::new(&db, &transport, FakeTokens(Some("token")));
        let error = engine.run_cycle().await.unwrap_err();

        assert!(matches!(error, SyncError::LocalStore(_)));
        assert_eq!(transport.pull_calls.load(Ordering::SeqCst), 1);
        assert_eq!(watermark_of(&db), pre_watermark);

        // Re-running from the same watermark re-covers the window cleanly
        transport.queue_pull(vec![remote_task("Applies cleanly", Utc::now())]);
        engine.run_cycle().await.unwrap();
        assert_eq!(
            watermark_of(&db),
            parse_instant("2030-01-01T00:00:00Z").unwrap()
        );
    }

    #[tokio::test]
    async fn watermark_never_regresses() {
        let db = setup_db();
        let late = parse_instant("2030-06-01T00:00:00Z").unwrap();
        SqliteWatermarkStore::new(db.connection()).write(late).unwrap();

        // Server reports an earlier instant than the stored watermark
        let transport = FakeTransport::with_server_time("2030-01-01T00:00:00Z");
        let engine = SyncEngine::new(&db, &transport, FakeTokens(Some("token")));

        engine.run_cycle().await.unwrap();
        assert_eq!(watermark_of(&db), late);
    }

    #[tokio::test]
    async fn rerunning_a_cycle_with_the_same_payload_is_idempotent() {
        let db = setup_db();
        let transport = FakeTransport::with_server_time("2030-01-01T00:00:00Z");
        transport.queue_pull(vec![remote_task("Replayed", Utc::now())]);

        let engine = SyncEngine::new(&db, &transport, FakeTokens(Some("token")));

        let first = engine.run_cycle().await.unwrap();
        let repo = SqliteTaskRepository::new(db.connection());
        let state_after_first = repo.list().unwrap();

        let second = engine.run_cycle().await.unwrap();
        let state_after_second = repo.list().unwrap();

        assert_eq!(first.inserted, 1);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped, 1);
        assert_eq!(state_after_first, state_after_second);
    }

    #[tokio::test]
    async fn concurrent_invocation_is_rejected() {
        let db = setup_db();
        let transport = FakeTransport {
            yield_in_pull: true,
            ..FakeTransport::default()
        };
        let engine = SyncEngine::new(&db, &transport, FakeTokens(Some("token")));

        // join! polls in order: the first cycle suspends inside pull while
        // holding the guard, so the second invocation must be rejected.
        let (first, second) = tokio::join!(engine.run_cycle(), engine.run_cycle());

        assert!(first.is_ok());
        assert!(matches!(second.unwrap_err(), SyncError::CycleInFlight));
    }

    #[tokio::test]
    async fn run_sync_reports_a_flag_and_message() {
        let db = setup_db();
        let transport = FakeTransport::with_server_time("2030-01-01T00:00:00Z");
        let engine = SyncEngine::new(&db, &transport, FakeTokens(Some("token")));

        let (ok, message) = engine.run_sync().await;
        assert!(ok);
        assert!(message.contains("Sync complete"));

        let locked_out = SyncEngine::new(&db, &transport, FakeTokens(None));
        let (ok, message) = locked_out.run_sync().await;
        assert!(!ok);
        assert!(message.contains("Sync failed"));
    }
}
