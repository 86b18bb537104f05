//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/studytube/config.toml)
//! 3. Environment variables (STUDYTUBE_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::metadata::{DEFAULT_LOOKUP_TIMEOUT, DEFAULT_OEMBED_URL};
use crate::storage::STORAGE_KEY;

/// Environment variable prefix
const ENV_PREFIX: &str = "STUDYTUBE";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for the saved state
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Write logs here instead of stderr
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Seconds between autosaves while a video is playing
    #[serde(default = "default_autosave_interval")]
    pub autosave_interval_secs: u64,

    /// Milliseconds between playback progress samples
    #[serde(default = "default_progress_interval")]
    pub progress_interval_ms: u64,

    /// Timeout for metadata lookups
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout_secs: u64,

    /// oEmbed endpoint used for metadata lookups
    #[serde(default = "default_oembed_url")]
    pub oembed_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_file: None,
            autosave_interval_secs: default_autosave_interval(),
            progress_interval_ms: default_progress_interval(),
            lookup_timeout_secs: default_lookup_timeout(),
            oembed_url: default_oembed_url(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (STUDYTUBE_DATA_DIR, STUDYTUBE_AUTOSAVE_SECS, ...)
    /// 2. Config file (~/.config/studytube/config.toml or STUDYTUBE_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config
            .validate()
            .with_context(|| format!("Invalid config file: {:?}", path))?;
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_AUTOSAVE_SECS", ENV_PREFIX)) {
            if let Some(secs) = parse_nonzero(&val) {
                self.autosave_interval_secs = secs;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_LOOKUP_TIMEOUT_SECS", ENV_PREFIX)) {
            if let Some(secs) = parse_nonzero(&val) {
                self.lookup_timeout_secs = secs;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_OEMBED_URL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.oembed_url = val;
            }
        }
    }

    /// Reject values the runtime cannot use
    ///
    /// Interval timers panic on a zero period, so every interval must be
    /// positive.
    pub fn validate(&self) -> Result<()> {
        let intervals = [
            ("autosave_interval_secs", self.autosave_interval_secs),
            ("progress_interval_ms", self.progress_interval_ms),
            ("lookup_timeout_secs", self.lookup_timeout_secs),
        ];
        for (key, value) in intervals {
            if value == 0 {
                bail!("{} must be greater than zero", key);
            }
        }
        Ok(())
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Set a value by key, as used by `studytube config set`
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "data_dir" => self.data_dir = PathBuf::from(value),
            "log_file" => {
                self.log_file = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                }
            }
            "autosave_interval_secs" => {
                self.autosave_interval_secs = parse_positive(key, value)?;
            }
            "progress_interval_ms" => {
                self.progress_interval_ms = parse_positive(key, value)?;
            }
            "lookup_timeout_secs" => {
                self.lookup_timeout_secs = parse_positive(key, value)?;
            }
            "oembed_url" => self.oembed_url = value.to_string(),
            _ => bail!(
                "Unknown config key '{}'. Valid keys: data_dir, log_file, autosave_interval_secs, \
                 progress_interval_ms, lookup_timeout_secs, oembed_url",
                key
            ),
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &PathBuf) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with STUDYTUBE_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("studytube")
            .join("config.toml")
    }

    /// Get the path to the saved state
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json", STORAGE_KEY))
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}

fn parse_positive(key: &str, value: &str) -> Result<u64> {
    let parsed: u64 = value
        .parse()
        .with_context(|| format!("Invalid value for {}: {}", key, value))?;
    if parsed == 0 {
        bail!("{} must be greater than zero", key);
    }
    Ok(parsed)
}

/// Parse an env value, ignoring zero like any other unusable value
fn parse_nonzero(value: &str) -> Option<u64> {
    value.trim().parse().ok().filter(|&n| n > 0)
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("studytube")
}

fn default_autosave_interval() -> u64 {
    30
}

fn default_progress_interval() -> u64 {
    1000
}

fn default_lookup_timeout() -> u64 {
    DEFAULT_LOOKUP_TIMEOUT
}

fn default_oembed_url() -> String {
    DEFAULT_OEMBED_URL.to_string()
}
