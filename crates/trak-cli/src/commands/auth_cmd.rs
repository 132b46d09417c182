use clap::Subcommand;
use trak_core::auth::{AuthClient, SessionPersistence};

use crate::commands::common;
use crate::error::CliError;
use crate::paths;
use crate::session::FileSessionStore;

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Sign in to the sync server and store the session
    Login {
        /// Account email
        email: String,
        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Register a new account and sign in
    Register {
        /// Account email
        email: String,
        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Show whether a session is stored and when it expires
    Status,
    /// Forget the stored session
    Logout,
}

pub async fn run(command: AuthCommand) -> Result<(), CliError> {
    let store = FileSessionStore::new(paths::session_file()?);
    match command {
        AuthCommand::Login { email, password } => {
            let session = client()?.login(&email, &password).await?;
            store.save_session(&session)?;
            println!("Signed in as {}", session.email);
            Ok(())
        }
        AuthCommand::Register { email, password } => {
            let session = client()?.register(&email, &password).await?;
            store.save_session(&session)?;
            println!("Registered and signed in as {}", session.email);
            Ok(())
        }
        AuthCommand::Status => {
            match store.load_session()? {
                Some(session) if !session.is_expired() => {
                    println!(
                        "Signed in as {} (session expires {})",
                        session.email, session.expires_at
                    );
                }
                Some(session) => {
                    println!(
                        "Session for {} expired at {}. Run `trak auth login` again.",
                        session.email, session.expires_at
                    );
                }
                None => println!("Not signed in."),
            }
            Ok(())
        }
        AuthCommand::Logout => {
            store.clear_session()?;
            println!("Signed out.");
            Ok(())
        }
    }
}

fn client() -> Result<AuthClient, CliError> {
    let config = common::load_config()?;
    Ok(AuthClient::new(&config.server_url, config.request_timeout())?)
}
