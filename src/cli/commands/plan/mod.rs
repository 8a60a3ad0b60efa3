//! Import plan commands

use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;

mod inspect;
mod run;

pub use inspect::inspect_command;
pub use run::{RunOptions, run_command};

#[derive(Args)]
pub struct PlanCommands {
    #[command(subcommand)]
    pub command: PlanSubcommands,
}

#[derive(Subcommand)]
pub enum PlanSubcommands {
    /// Show what a plan would create and reuse
    Inspect {
        /// Path to the import plan (JSON)
        plan: PathBuf,
    },
    /// Execute a plan against a destination
    Run {
        /// Path to the import plan (JSON)
        plan: PathBuf,
        /// Environment to import into (".env" reads SCHEMA_IMPORT_* variables)
        #[arg(short, long)]
        env: Option<String>,
        /// Record the calls instead of sending them
        #[arg(long)]
        dry_run: bool,
        /// Destination locales assumed by a dry run
        #[arg(long = "locale", default_value = "en")]
        locales: Vec<String>,
    },
}

pub async fn handle_plan_command(cmd: PlanCommands) -> Result<()> {
    match cmd.command {
        PlanSubcommands::Inspect { plan } => inspect_command(&plan),
        PlanSubcommands::Run {
            plan,
            env,
            dry_run,
            locales,
        } => {
            run_command(RunOptions {
                plan,
                env,
                dry_run,
                locales,
            })
            .await
        }
    }
}
