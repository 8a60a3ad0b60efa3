use crate::api::{CmaClient, RecordingClient, SchemaApi};
use crate::cli::ui::ProgressLine;
use crate::config::Config;
use crate::import::{ImportReport, Progress, import_schema};
use crate::schema::ImportPlan;
use anyhow::Result;
use colored::*;
use log::{error, info};
use std::path::PathBuf;

pub struct RunOptions {
    pub plan: PathBuf,
    pub env: Option<String>,
    pub dry_run: bool,
    pub locales: Vec<String>,
}

pub async fn run_command(options: RunOptions) -> Result<()> {
    info!("Running import plan: {}", options.plan.display());

    let plan = ImportPlan::from_path(&options.plan)?;

    if options.dry_run {
        info!("Dry run with locales {:?}", options.locales);
        let client = RecordingClient::new(options.locales);
        let report = execute(&plan, &client).await?;

        println!("{} Dry run recorded {} calls:", "✓".bright_green().bold(), client.calls().len());
        for (index, call) in client.calls().iter().enumerate() {
            println!("  {:>4}. {}", index + 1, call.describe());
        }
        println!();
        println!("{}", report);
        return Ok(());
    }

    let config = Config::load()?;
    let (name, environment) = config.resolve_environment(options.env.as_deref())?;
    info!("Using environment: {}", name);

    let client = CmaClient::from_environment(&environment, &config.settings)?;
    println!("Importing into {} ({})", name.bright_green().bold(), client.base_url().cyan());

    let report = execute(&plan, &client).await?;

    println!("{} Schema imported", "✓".bright_green().bold());
    println!("{}", report);
    Ok(())
}

async fn execute<C: SchemaApi + ?Sized>(plan: &ImportPlan, client: &C) -> Result<ImportReport> {
    let line = ProgressLine::start("Importing schema");
    let result = {
        let sink = |progress: Progress| line.update(progress);
        import_schema(plan, client, &sink).await
    };
    line.finish().await;

    if let Err(e) = &result {
        error!("Import failed: {:#}", e);
        println!("{} Import failed, see the log file for the rejected payload", "✗".bright_red().bold());
    }

    result
}
