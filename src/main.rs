use anyhow::Result;
use clap::Parser;
use log::info;

use schema_import::cli::commands::{handle_env_command, handle_plan_command};
use schema_import::cli::{Cli, Commands};
use schema_import::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;

    // Initialize logger to file (truncate on each run)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&config.settings.log_file)?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    info!("Starting schema-import");

    match cli.command {
        Commands::Env(cmd) => handle_env_command(cmd).await,
        Commands::Plan(cmd) => handle_plan_command(cmd).await,
    }
}
