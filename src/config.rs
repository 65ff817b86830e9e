//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.ctgov-query.toml` files.

use crate::api::{ClientConfig, DEFAULT_BASE_URL};
use crate::cli::{OutputFormat, MAX_RETRIES};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".ctgov-query.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// API connection settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Default query filters.
    #[serde(default)]
    pub query: QueryConfig,

    /// Output settings.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Field-values API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Endpoint URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Retries for transient failures. Zero means a single attempt.
    #[serde(default)]
    pub retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            retries: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_retry_backoff_ms() -> u64 {
    500
}

/// Filters applied to every sponsor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Overall study status.
    #[serde(default = "default_status")]
    pub status: String,

    /// Facility name.
    #[serde(default = "default_location")]
    pub location: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            status: default_status(),
            location: default_location(),
        }
    }
}

fn default_status() -> String {
    "Completed".to_string()
}

fn default_location() -> String {
    "NIH Clinical Center".to_string()
}

/// Record output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// tsv or json.
    #[serde(default)]
    pub format: OutputFormat,

    /// Print a TSV header line.
    #[serde(default)]
    pub header: bool,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.ctgov-query.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.api_url {
            self.api.base_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.api.timeout_seconds = timeout;
        }
        if let Some(retries) = args.retries {
            self.api.retries = retries;
        }

        if let Some(ref status) = args.status {
            self.query.status = status.clone();
        }
        if let Some(ref location) = args.location {
            self.query.location = location.clone();
        }

        if let Some(format) = args.format {
            self.output.format = format;
        }
        // Flags always override
        if args.header {
            self.output.header = true;
        }
    }

    /// Check the merged settings, whichever source they came from.
    pub fn validate(&self) -> Result<()> {
        let url = &self.api.base_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            bail!("API URL must start with 'http://' or 'https://': {}", url);
        }

        if self.api.timeout_seconds == 0 {
            bail!("Timeout must be at least 1 second");
        }

        if self.api.retries > MAX_RETRIES {
            bail!("Retries must be at most {}", MAX_RETRIES);
        }

        Ok(())
    }

    /// HTTP client settings derived from the `[api]` section.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api.base_url.clone(),
            timeout_seconds: self.api.timeout_seconds,
            retries: self.api.retries,
            retry_backoff_ms: self.api.retry_backoff_ms,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
