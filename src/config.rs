use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the ad-hoc environment built from process variables
pub const DOTENV_ENVIRONMENT: &str = ".env";

const URL_VAR: &str = "SCHEMA_IMPORT_URL";
const TOKEN_VAR: &str = "SCHEMA_IMPORT_TOKEN";
const SANDBOX_VAR: &str = "SCHEMA_IMPORT_SANDBOX";

/// A destination project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub base_url: String,
    pub api_token: String,
    /// Sandbox environment to target instead of the primary one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<String>,
}

impl EnvironmentConfig {
    /// Read `SCHEMA_IMPORT_URL`, `SCHEMA_IMPORT_TOKEN` and optionally
    /// `SCHEMA_IMPORT_SANDBOX`, loading a `.env` file first if one exists
    pub fn from_env() -> Result<Self> {
        info!("Reading environment from process variables");
        dotenvy::dotenv().ok();

        let base_url = std::env::var(URL_VAR)
            .map_err(|_| anyhow::anyhow!("{} environment variable not set", URL_VAR))?;
        let api_token = std::env::var(TOKEN_VAR)
            .map_err(|_| anyhow::anyhow!("{} environment variable not set", TOKEN_VAR))?;
        let sandbox = std::env::var(SANDBOX_VAR).ok().filter(|s| !s.is_empty());

        Ok(Self {
            base_url,
            api_token,
            sandbox,
        })
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    pub current_environment: Option<String>,
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentConfig>,
    #[serde(default)]
    pub settings: Settings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

fn default_max_retries() -> u32 {
    3
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_log_file() -> String {
    "schema-import.log".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            request_timeout_secs: default_request_timeout_secs(),
            log_file: default_log_file(),
        }
    }
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("schema-import")
        } else {
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".schema-import")
        };

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
            info!("Created config directory: {:?}", config_dir);
        }

        Ok(config_dir.join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        debug!("Loading config from: {:?}", config_path);

        if !config_path.exists() {
            info!("Config file doesn't exist, using default config");
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        debug!("Loaded config with {} environments", config.environments.len());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        debug!("Saving config to: {:?}", config_path);

        let config_content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(config_path, config_content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        info!("Config saved successfully");
        Ok(())
    }

    /// Add or replace an environment. The first one becomes current.
    pub fn add_environment(&mut self, name: String, environment: EnvironmentConfig) {
        info!("Adding environment: {}", name);
        if self.environments.insert(name.clone(), environment).is_some() {
            warn!("Environment '{}' already existed, overwritten", name);
        }

        if self.current_environment.is_none() {
            self.current_environment = Some(name.clone());
            info!("Set {} as current environment", name);
        }
    }

    pub fn set_current_environment(&mut self, name: String) -> Result<()> {
        if !self.environments.contains_key(&name) {
            anyhow::bail!("Environment '{}' not found", name);
        }

        info!("Setting current environment to: {}", name);
        self.current_environment = Some(name);
        Ok(())
    }

    pub fn remove_environment(&mut self, name: &str) -> Result<EnvironmentConfig> {
        let removed = self
            .environments
            .remove(name)
            .ok_or_else(|| anyhow::anyhow!("Environment '{}' not found", name))?;
        info!("Removed environment: {}", name);

        if self.current_environment.as_deref() == Some(name) {
            warn!("Removed current environment, clearing current selection");
            self.current_environment = None;
        }

        Ok(removed)
    }

    pub fn get_environment(&self, name: &str) -> Option<&EnvironmentConfig> {
        self.environments.get(name)
    }

    /// Name and settings of the selected environment
    pub fn current_environment(&self) -> Option<(&str, &EnvironmentConfig)> {
        let name = self.current_environment.as_deref()?;
        self.environments.get(name).map(|environment| (name, environment))
    }

    /// Environment names, sorted
    pub fn list_environments(&self) -> Vec<&String> {
        let mut names: Vec<&String> = self.environments.keys().collect();
        names.sort();
        names
    }

    /// Resolve `--env`: a configured name, [`DOTENV_ENVIRONMENT`], or the
    /// current environment when none is given
    pub fn resolve_environment(&self, name: Option<&str>) -> Result<(String, EnvironmentConfig)> {
        match name {
            Some(DOTENV_ENVIRONMENT) => Ok((DOTENV_ENVIRONMENT.to_string(), EnvironmentConfig::from_env()?)),
            Some(name) => {
                let environment = self
                    .get_environment(name)
                    .ok_or_else(|| anyhow::anyhow!("Environment '{}' not found", name))?;
                Ok((name.to_string(), environment.clone()))
            }
            None => {
                let (name, environment) = self.current_environment().ok_or_else(|| {
                    anyhow::anyhow!("No environment selected. Run 'schema-import env add' to create one.")
                })?;
                Ok((name.to_string(), environment.clone()))
            }
        }
    }
}
