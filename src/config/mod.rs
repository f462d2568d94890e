mod api;
mod client;
mod defaults;
mod validation;

use crate::cli::Args;
use crate::error::{LifelogError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub use api::{ApiConfig, ApiSettings};
pub use client::{ClientConfig, ServerCommand};
pub use defaults::{default_base_url, API_KEY_ENV, API_URL_ENV, VERBOSE_ENV};
pub use validation::{expand_env_var_in_string, expand_env_vars};

use defaults::{default_server_args, is_truthy};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LogConfig {
    #[serde(default)]
    pub verbose: Option<bool>,
}

/// On-disk configuration. Every field is optional; the API key is never read from here.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FileConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Fully resolved configuration, built once in `main` and passed down by reference.
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiSettings,
    pub client: ClientConfig,
    pub verbose: bool,
}

impl Config {
    pub fn from_env_and_args(args: &Args) -> Result<Self> {
        let file_config = match &args.config {
            Some(path) => FileConfig::load_from(path),
            None => FileConfig::load(),
        }
        .map_err(|e| LifelogError::Config(format!("{:#}", e)))?;

        Self::resolve(args, file_config, |name| env::var(name).ok())
    }

    /// Merge CLI args, environment (through `lookup`) and the config file.
    /// Precedence: CLI > env > file > default.
    pub fn resolve<F>(args: &Args, file_config: FileConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_ENV)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                LifelogError::Config(format!("{} environment variable not set", API_KEY_ENV))
            })?;

        let base_url = args
            .api_url
            .clone()
            .or_else(|| lookup(API_URL_ENV).filter(|url| !url.is_empty()))
            .or_else(|| {
                file_config
                    .api
                    .base_url
                    .as_deref()
                    .map(|url| expand_env_var_in_string(url, &lookup))
            })
            .unwrap_or_else(default_base_url);

        reqwest::Url::parse(&base_url)
            .map_err(|e| LifelogError::Config(format!("Invalid API URL '{}': {}", base_url, e)))?;

        let verbose = args.verbose
            || lookup(VERBOSE_ENV)
                .map(|v| is_truthy(&v))
                .or(file_config.log.verbose)
                .unwrap_or(false);

        let client = ClientConfig {
            server_command: file_config
                .client
                .server_command
                .as_deref()
                .map(|cmd| expand_env_var_in_string(cmd, &lookup)),
            server_args: file_config.client.server_args.as_ref().map(|args| {
                args.iter()
                    .map(|arg| expand_env_var_in_string(arg, &lookup))
                    .collect()
            }),
            env: expand_env_vars(&file_config.client.env, &lookup),
        };

        Ok(Config {
            api: ApiSettings::new(api_key, base_url.trim_end_matches('/')),
            client,
            verbose,
        })
    }

    /// Command line the client uses to spawn its server. Defaults to this executable in
    /// server mode. The API key and URL are always forwarded to the child, and so is
    /// verbosity when enabled.
    pub fn server_command(&self) -> Result<ServerCommand> {
        let program = match &self.client.server_command {
            Some(cmd) => cmd.clone(),
            None => env::current_exe()?.to_string_lossy().into_owned(),
        };

        let args = self
            .client
            .server_args
            .clone()
            .unwrap_or_else(default_server_args);

        let mut env = self.client.env.clone();
        env.insert(API_KEY_ENV.to_string(), self.api.api_key.clone());
        env.insert(API_URL_ENV.to_string(), self.api.base_url.clone());
        if self.verbose {
            env.insert(VERBOSE_ENV.to_string(), "true".to_string());
        }

        Ok(ServerCommand { program, args, env })
    }
}

impl FileConfig {
    /// Load the first config file found in the search path, or defaults if none exists.
    pub fn load() -> anyhow::Result<Self> {
        for path in Self::get_config_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Ok(FileConfig::default())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let is_yaml = matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("yaml") | Some("yml")
        );

        let config: FileConfig = if is_yaml {
            serde_yaml::from_str(&contents).with_context(|| {
                format!("Failed to parse YAML config file: {}", path.display())
            })?
        } else {
            serde_json::from_str(&contents).with_context(|| {
                format!("Failed to parse JSON config file: {}", path.display())
            })?
        };

        Ok(config)
    }

    pub fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".lifelog-mcp.yaml"),
            PathBuf::from(".lifelog-mcp.yml"),
            PathBuf::from(".lifelog-mcp.json"),
        ];

        if let Some(home_dir) = dirs::home_dir() {
            let config_dir = home_dir.join(".config").join("lifelog-mcp");
            paths.push(config_dir.join("config.yaml"));
            paths.push(config_dir.join("config.yml"));
            paths.push(config_dir.join("config.json"));
        }

        paths
    }
}
