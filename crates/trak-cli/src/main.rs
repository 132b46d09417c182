//! trak - a personal task tracker with background sync.
//!
//! Tasks live in a local `SQLite` database; `trak sync` reconciles them
//! with a remote server using last-write-wins.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use trak_core::models::Status;

mod commands;
mod error;
mod paths;
mod session;

use commands::{add::AddArgs, list::ListArgs, sync::SyncArgs, task::EditArgs};
use error::CliError;

#[derive(Parser)]
#[command(name = "trak")]
#[command(about = "Track personal tasks and sync them across machines")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Optional path to the local database file
    #[arg(long, value_name = "PATH", global = true)]
    db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new task
    #[command(alias = "new")]
    Add(AddArgs),
    /// List tasks, most recently updated first
    #[command(alias = "ls")]
    List(ListArgs),
    /// Mark a task completed
    Done {
        /// Task id or unique id prefix
        id: String,
    },
    /// Cancel a task
    Cancel {
        /// Task id or unique id prefix
        id: String,
    },
    /// Edit fields of an existing task
    Edit(EditArgs),
    /// Push local changes and pull remote ones
    Sync(SyncArgs),
    /// Sign in, sign out, or inspect the stored session
    #[command(subcommand)]
    Auth(commands::auth_cmd::AuthCommand),
    /// Manage the client configuration
    #[command(subcommand)]
    Config(commands::config_cmd::ConfigCommand),
    /// List the available task types
    Types,
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("trak=warn".parse().expect("valid directive")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Add(args) => {
            let db = commands::common::open_database(cli.db_path)?;
            commands::add::run(&db, args)
        }
        Commands::List(args) => {
            let db = commands::common::open_database(cli.db_path)?;
            commands::list::run(&db, &args)
        }
        Commands::Done { id } => {
            let db = commands::common::open_database(cli.db_path)?;
            commands::task::set_status(&db, &id, Status::Completed)
        }
        Commands::Cancel { id } => {
            let db = commands::common::open_database(cli.db_path)?;
            commands::task::set_status(&db, &id, Status::Cancelled)
        }
        Commands::Edit(args) => {
            let db = commands::common::open_database(cli.db_path)?;
            commands::task::edit(&db, args)
        }
        Commands::Sync(args) => {
            let db = commands::common::open_database(cli.db_path)?;
            commands::sync::run(&db, args).await
        }
        Commands::Auth(command) => commands::auth_cmd::run(command).await,
        Commands::Config(command) => commands::config_cmd::run(command),
        Commands::Types => {
            let db = commands::common::open_database(cli.db_path)?;
            commands::types::run(&db)
        }
    }
}
