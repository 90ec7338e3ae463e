//! Host app adapters.
//!
//! This crate is intentionally thin: it talks to the host app's local info
//! API, starts the host, reads its release feed, and persists the small
//! amount of configuration needed when the host is not running. It holds no
//! peer-check logic.

pub mod client;
pub mod config;
pub mod error;
pub mod launch;
pub mod releases;

pub use client::{DEFAULT_HOST_API_URL, HostClient, HostInfo};
pub use config::{AppConfig, ConfigCache, ConfigStore, default_config_path};
pub use error::{ConfigError, HostError, HostResult};
pub use launch::{LaunchTarget, launch_host, resolve_launch_target};
pub use releases::{Release, ReleaseAsset, ReleaseFeed, current_asset_suffix, latest_release};

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Directory under the host home that holds the peer drive layout.
pub const DRIVE_DIR: &str = "drive";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeSource {
    /// Reported by the running host.
    Live,
    /// Taken from the saved config because the host did not answer.
    Cached,
    /// Given explicitly by the caller.
    Explicit,
}

impl HomeSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Cached => "cached",
            Self::Explicit => "explicit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostHome {
    pub path: PathBuf,
    pub source: HomeSource,
    pub version: Option<String>,
}

impl HostHome {
    pub fn explicit(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source: HomeSource::Explicit,
            version: None,
        }
    }

    /// Base path handed to the peer check: `<home>/drive`.
    pub fn peer_base(&self) -> PathBuf {
        peer_base(&self.path)
    }
}

pub fn peer_base(home: &Path) -> PathBuf {
    home.join(DRIVE_DIR)
}

/// Ask the running host for its home, falling back to the configured path
/// when the host is unreachable and the config was initialized.
pub async fn resolve_host_home(client: &HostClient, config: &AppConfig) -> HostResult<HostHome> {
    match client.info().await {
        Ok(info) => Ok(HostHome {
            path: info.home,
            source: HomeSource::Live,
            version: info.version,
        }),
        Err(err) if config.initialized => {
            tracing::warn!(
                error = %err,
                cached = %config.host_path.display(),
                "host app unreachable, using cached home path"
            );
            Ok(HostHome {
                path: config.host_path.clone(),
                source: HomeSource::Cached,
                version: config.cache.host_version.clone(),
            })
        }
        Err(err) => Err(HostError::HomeUnavailable(format!(
            "{err}; run `companion config init --host-path <dir>` or pass --home"
        ))),
    }
}
