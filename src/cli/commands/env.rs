//! Environment management commands

use crate::config::{Config, EnvironmentConfig};
use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;
use log::info;

#[derive(Args)]
pub struct EnvCommands {
    #[command(subcommand)]
    pub command: EnvSubcommands,
}

#[derive(Subcommand)]
pub enum EnvSubcommands {
    /// Add a destination environment
    Add {
        /// Name for this environment (e.g., "production", "staging")
        name: String,
        /// API base url of the destination project
        #[arg(long)]
        url: String,
        /// Full-access API token
        #[arg(long)]
        token: String,
        /// Sandbox environment to target instead of the primary one
        #[arg(long)]
        sandbox: Option<String>,
    },
    /// List configured environments
    List,
    /// Select the current environment
    Select {
        /// Environment name to select
        name: String,
    },
    /// Remove an environment
    Remove {
        /// Environment name to remove
        name: String,
    },
}

pub async fn handle_env_command(cmd: EnvCommands) -> Result<()> {
    let mut config = Config::load()?;

    match cmd.command {
        EnvSubcommands::Add {
            name,
            url,
            token,
            sandbox,
        } => add_environment(&mut config, name, url, token, sandbox),
        EnvSubcommands::List => {
            list_environments(&config);
            Ok(())
        }
        EnvSubcommands::Select { name } => select_environment(&mut config, name),
        EnvSubcommands::Remove { name } => remove_environment(&mut config, &name),
    }
}

fn add_environment(
    config: &mut Config,
    name: String,
    base_url: String,
    api_token: String,
    sandbox: Option<String>,
) -> Result<()> {
    info!("Adding environment: {}", name);

    let environment = EnvironmentConfig {
        base_url,
        api_token,
        sandbox,
    };
    config.add_environment(name.clone(), environment);
    config.save()?;

    println!("{} Environment '{}' added successfully", "✓".bright_green().bold(), name.bright_green().bold());
    if config.current_environment.as_deref() == Some(name.as_str()) {
        println!("{} Set '{}' as current environment", "✓".bright_green().bold(), name.bright_green().bold());
    }

    Ok(())
}

fn list_environments(config: &Config) {
    let environments = config.list_environments();

    if environments.is_empty() {
        println!("  {}", "⚠️  No environments configured".bright_yellow().bold());
        println!("  {}", "Run 'schema-import env add' to get started.".dimmed());
        return;
    }

    println!();
    println!("  {}", "Configured environments:".bright_white().bold());
    for name in environments {
        let Some(environment) = config.get_environment(name) else {
            continue;
        };

        let (marker, label, current) = if config.current_environment.as_ref() == Some(name) {
            ("●", name.bright_green().bold(), " (current)".bright_green())
        } else {
            ("○", name.white(), "".white())
        };
        let sandbox = environment
            .sandbox
            .as_deref()
            .map(|sandbox| format!(" [{}]", sandbox))
            .unwrap_or_default();

        println!(
            "  {} {} → {}{}{}",
            marker.bright_green(),
            label,
            environment.base_url.cyan(),
            sandbox.bright_yellow(),
            current
        );
    }
    println!();
}

fn select_environment(config: &mut Config, name: String) -> Result<()> {
    config.set_current_environment(name.clone())?;
    config.save()?;

    println!("{} Selected environment: {}", "✓".bright_cyan().bold(), name.bright_green().bold());
    Ok(())
}

fn remove_environment(config: &mut Config, name: &str) -> Result<()> {
    config.remove_environment(name)?;
    config.save()?;

    println!("{} Environment '{}' removed successfully", "✓".bright_green().bold(), name);
    match &config.current_environment {
        Some(current) => println!("Current environment: {}", current),
        None => println!(
            "{}",
            "No current environment selected. Run 'schema-import env select' to choose one.".dimmed()
        ),
    }

    Ok(())
}
