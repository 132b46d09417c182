use std::time::Duration;

use clap::Args;
use trak_core::auth::{StoredTokenSource, TokenSource};
use trak_core::db::{Database, SqliteTaskRepository, TaskRepository};
use trak_core::sync::{HttpTransport, SyncEngine, SyncError};

use crate::commands::common;
use crate::error::CliError;
use crate::paths;
use crate::session::FileSessionStore;

/// Transient failures stretch the polling interval by one base interval
/// per consecutive failure, up to this many.
const MAX_BACKOFF_STEPS: u32 = 5;

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Keep running, syncing every N seconds, instead of a single cycle
    #[arg(long, value_name = "SECONDS")]
    pub interval: Option<u64>,
}

pub async fn run(db: &Database, args: SyncArgs) -> Result<(), CliError> {
    let config = common::load_config()?;
    let transport = HttpTransport::new(&config.server_url, config.request_timeout())?;
    let tokens = StoredTokenSource::new(FileSessionStore::new(paths::session_file()?));
    if tokens.valid_token().is_none() {
        return Err(CliError::NotLoggedIn);
    }
    let engine = SyncEngine::new(db, transport, tokens);

    match args.interval {
        None => {
            mark_overdue(db)?;
            let report = engine.run_cycle().await?;
            println!("Sync complete: {report}");
            Ok(())
        }
        Some(secs) => run_periodic(db, &engine, Duration::from_secs(secs.max(1))).await,
    }
}

/// Periodic mode: one cycle per tick, stretching the wait after
/// consecutive failures so a down server is not hammered.
async fn run_periodic<T, C>(
    db: &Database,
    engine: &SyncEngine<'_, T, C>,
    base_interval: Duration,
) -> Result<(), CliError>
where
    T: trak_core::sync::RemoteTransport,
    C: TokenSource,
{
    let mut failures: u32 = 0;
    loop {
        mark_overdue(db)?;
        match engine.run_cycle().await {
            Ok(report) => {
                failures = 0;
                println!("Sync complete: {report}");
            }
            Err(SyncError::Unauthenticated) => return Err(CliError::NotLoggedIn),
            Err(error @ SyncError::LocalStore(_)) => return Err(error.into()),
            Err(error) => {
                failures = (failures + 1).min(MAX_BACKOFF_STEPS);
                eprintln!("Sync failed: {error}");
            }
        }
        let wait = base_interval * (failures + 1);
        tokio::time::sleep(wait).await;
    }
}

fn mark_overdue(db: &Database) -> Result<(), CliError> {
    let flipped =
        SqliteTaskRepository::new(db.connection()).mark_overdue(trak_core::time::now())?;
    if flipped > 0 {
        tracing::info!(count = flipped, "Marked past-deadline tasks overdue");
    }
    Ok(())
}
