//! Persisted companion configuration.
//!
//! Stored as TOML. Missing fields fall back to defaults so older files keep
//! loading after new settings are added.

use crate::client::{DEFAULT_HOST_API_URL, HostInfo};
use crate::error::ConfigError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const CONFIG_DIR_NAME: &str = "companion";
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Host app home directory, used when the host is not running.
    pub host_path: PathBuf,
    /// Explicit host executable, tried before any default location.
    pub host_exe_path: Option<PathBuf>,
    pub host_api_url: String,
    pub initialized: bool,
    pub cache: ConfigCache,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigCache {
    pub host_version: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host_path: default_host_path(),
            host_exe_path: None,
            host_api_url: DEFAULT_HOST_API_URL.to_string(),
            initialized: false,
            cache: ConfigCache::default(),
        }
    }
}

impl AppConfig {
    /// Remember what a live host reported.
    pub fn record_host_info(&mut self, info: &HostInfo) {
        self.host_path = info.home.clone();
        if info.version.is_some() {
            self.cache.host_version = info.version.clone();
        }
    }
}

fn default_host_path() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\pinokio")
    } else {
        dirs::home_dir()
            .map(|home| home.join("pinokio"))
            .unwrap_or_else(|| PathBuf::from("pinokio"))
    }
}

/// `<platform config dir>/companion/config.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or(ConfigError::NoConfigDir)
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open_default() -> Result<Self, ConfigError> {
        default_config_path().map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the config, or defaults when the file does not exist yet.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(AppConfig::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Write the config, stamping `cache.last_update`.
    pub fn save(&self, config: &mut AppConfig) -> Result<(), ConfigError> {
        config.cache.last_update = Some(Utc::now());
        let rendered = toml::to_string_pretty(config)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, rendered).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), "config saved");
        Ok(())
    }

    /// Point the config at `host_path` after checking that it can be read.
    pub fn initialize(&self, host_path: impl Into<PathBuf>) -> Result<AppConfig, ConfigError> {
        let host_path = host_path.into();
        fs::read_dir(&host_path).map_err(|source| ConfigError::HostPathUnreadable {
            path: host_path.clone(),
            source,
        })?;

        let mut config = self.load()?;
        config.host_path = host_path;
        config.initialized = true;
        self.save(&mut config)?;
        Ok(config)
    }
}
