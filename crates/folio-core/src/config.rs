//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/folio/config.toml)
//! 3. Environment variables (FOLIO_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable prefix
const ENV_PREFIX: &str = "FOLIO";

/// Default share of a book that may be copied, in percent
pub const DEFAULT_COPY_ALLOWANCE: f64 = 10.0;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage (SQLite cache)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Whether remote sync is enabled
    #[serde(default)]
    pub sync_enabled: bool,

    /// Percentage of a book's characters a reader may copy
    #[serde(default = "default_copy_allowance")]
    pub copy_allowance_percentage: f64,

    /// Publisher prefixes that mark a 13-digit identifier as a remote ISBN
    #[serde(default = "default_isbn_prefixes")]
    pub isbn_prefixes: Vec<String>,

    /// Remote annotation service (optional)
    #[serde(default)]
    pub remote: Option<RemoteConfig>,

    /// Static mapping from external book identifiers to remote ids
    #[serde(default)]
    pub book_ids: BTreeMap<String, String>,
}

/// Connection settings for the remote annotation service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL, e.g. `https://books.example.com/api`
    pub base_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            sync_enabled: false,
            remote: None,
            copy_allowance_percentage: DEFAULT_COPY_ALLOWANCE,
            isbn_prefixes: default_isbn_prefixes(),
            book_ids: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (FOLIO_DATA_DIR, FOLIO_REMOTE_URL, FOLIO_SYNC_ENABLED, ...)
    /// 2. Config file (~/.config/folio/config.toml or FOLIO_CONFIG)
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
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // An empty URL clears the remote entirely
        if let Ok(val) = std::env::var(format!("{}_REMOTE_URL", ENV_PREFIX)) {
            if val.is_empty() {
                self.remote = None;
            } else {
                self.remote.get_or_insert_with(RemoteConfig::default).base_url = val;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_REMOTE_USERNAME", ENV_PREFIX)) {
            if let Some(remote) = self.remote.as_mut() {
                remote.username = val;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_REMOTE_PASSWORD", ENV_PREFIX)) {
            if let Some(remote) = self.remote.as_mut() {
                remote.password = val;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_SYNC_ENABLED", ENV_PREFIX)) {
            self.sync_enabled = val.eq_ignore_ascii_case("true") || val == "1";
        }
    }

    /// Ensure data directory exists
    pub fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
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
    /// Can be overridden with FOLIO_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("folio")
            .join("config.toml")
    }

    /// Get the path to the SQLite cache database
    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join("folio.db")
    }

    /// Remote settings, but only when sync is switched on
    pub fn active_remote(&self) -> Option<&RemoteConfig> {
        if !self.sync_enabled {
            return None;
        }
        self.remote.as_ref().filter(|r| !r.base_url.is_empty())
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("folio")
}

fn default_copy_allowance() -> f64 {
    DEFAULT_COPY_ALLOWANCE
}

fn default_isbn_prefixes() -> Vec<String> {
    vec!["978".to_string(), "979".to_string()]
}
