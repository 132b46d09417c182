use clap::Subcommand;
use trak_core::config::ClientConfig;

use crate::commands::common;
use crate::error::CliError;
use crate::paths;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file pointing at a sync server
    Init {
        /// Base URL of the sync server, e.g. `https://sync.example.com`
        #[arg(long)]
        server_url: String,
    },
    /// Print the active configuration
    Show,
}

pub fn run(command: ConfigCommand) -> Result<(), CliError> {
    match command {
        ConfigCommand::Init { server_url } => init(&server_url),
        ConfigCommand::Show => show(),
    }
}

fn init(server_url: &str) -> Result<(), CliError> {
    let config = ClientConfig::with_server_url(server_url).map_err(CliError::Config)?;
    let path = paths::config_file()?;
    std::fs::write(&path, serde_json::to_string_pretty(&config)?)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn show() -> Result<(), CliError> {
    let config = common::load_config()?;
    println!("server_url           {}", config.server_url);
    println!("request_timeout_secs {}", config.request_timeout_secs);
    Ok(())
}
