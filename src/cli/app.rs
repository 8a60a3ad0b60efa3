use super::commands::env::EnvCommands;
use super::commands::plan::PlanCommands;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "schema-import")]
#[command(about = "Replicate a content-model schema into a destination project")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Destination environment management
    Env(EnvCommands),
    /// Inspect and execute import plans
    Plan(PlanCommands),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::env::EnvSubcommands;
    use crate::cli::commands::plan::PlanSubcommands;

    #[test]
    fn test_parse_dry_run_with_default_locale() {
        let cli = Cli::try_parse_from(["schema-import", "plan", "run", "plan.json", "--dry-run"]).unwrap();

        let Commands::Plan(plan) = cli.command else {
            panic!("expected plan command");
        };
        let PlanSubcommands::Run { plan, env, dry_run, locales } = plan.command else {
            panic!("expected plan run");
        };
        assert_eq!(plan.to_str(), Some("plan.json"));
        assert!(env.is_none());
        assert!(dry_run);
        assert_eq!(locales, vec!["en"]);
    }

    #[test]
    fn test_parse_env_add() {
        let cli = Cli::try_parse_from([
            "schema-import",
            "env",
            "add",
            "staging",
            "--url",
            "https://site-api.example.com",
            "--token",
            "secret",
            "--sandbox",
            "feature-x",
        ])
        .unwrap();

        let Commands::Env(env) = cli.command else {
            panic!("expected env command");
        };
        let EnvSubcommands::Add { name, sandbox, .. } = env.command else {
            panic!("expected env add");
        };
        assert_eq!(name, "staging");
        assert_eq!(sandbox.as_deref(), Some("feature-x"));
    }

    #[test]
    fn test_repeated_locales() {
        let cli = Cli::try_parse_from([
            "schema-import", "plan", "run", "plan.json", "--dry-run", "--locale", "en", "--locale", "it",
        ])
        .unwrap();

        let Commands::Plan(plan) = cli.command else {
            panic!("expected plan command");
        };
        let PlanSubcommands::Run { locales, .. } = plan.command else {
            panic!("expected plan run");
        };
        assert_eq!(locales, vec!["en", "it"]);
    }
}
