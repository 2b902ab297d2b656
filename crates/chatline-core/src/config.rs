use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result, anyhow};

use crate::transport::parse_endpoint;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/api/chat";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const ENDPOINT_ENV: &str = "CHATLINE_ENDPOINT";
pub const TIMEOUT_ENV: &str = "CHATLINE_TIMEOUT_SECS";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    /// Per-request timeout; 0 waits forever
    pub timeout_secs: u64,
    pub log_level: String,
    pub log_to_file: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_level: "info".to_string(),
            log_to_file: true,
        }
    }

    /// Load from the default location, falling back to defaults when absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Apply `CHATLINE_*` environment overrides
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(
            std::env::var(ENDPOINT_ENV).ok(),
            std::env::var(TIMEOUT_ENV).ok(),
        )
    }

    fn apply_overrides(&mut self, endpoint: Option<String>, timeout: Option<String>) -> Result<()> {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            self.endpoint = endpoint.trim().to_string();
        }
        if let Some(timeout) = timeout {
            self.timeout_secs = timeout
                .trim()
                .parse()
                .map_err(|_| anyhow!("{} must be a whole number of seconds, got '{}'", TIMEOUT_ENV, timeout))?;
        }
        Ok(())
    }

    /// Reject endpoints that are not absolute http(s) URLs
    pub fn validate(&self) -> Result<()> {
        parse_endpoint(&self.endpoint)?;
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::get_config_dir()?.join("config.json"))
    }

    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("chatline"))
    }

    pub fn log_dir() -> Result<PathBuf> {
        Ok(Self::get_config_dir()?.join("logs"))
    }
}
