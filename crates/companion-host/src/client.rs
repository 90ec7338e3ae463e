//! Client for the host app's local info API.

use crate::error::{HostError, HostResult};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HOST_API_URL: &str = "http://localhost/pinokio/info";
pub const DEFAULT_WAIT_ATTEMPTS: u32 = 30;
pub const DEFAULT_WAIT_INTERVAL: Duration = Duration::from_secs(1);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// What the running host reports about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub home: PathBuf,
    pub version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InfoPayload {
    home: String,
    #[serde(default)]
    version: Option<VersionPayload>,
}

#[derive(Debug, Deserialize)]
struct VersionPayload {
    #[serde(default)]
    pinokio: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HostClient {
    http: reqwest::Client,
    info_url: String,
}

impl HostClient {
    pub fn new(info_url: impl Into<String>) -> HostResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| HostError::Client(err.to_string()))?;
        Ok(Self {
            http,
            info_url: info_url.into(),
        })
    }

    pub fn info_url(&self) -> &str {
        &self.info_url
    }

    /// Query the running host for its home directory and version.
    pub async fn info(&self) -> HostResult<HostInfo> {
        let response = self
            .http
            .get(&self.info_url)
            .send()
            .await
            .map_err(|err| HostError::Unreachable {
                url: self.info_url.clone(),
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HostError::UnexpectedStatus {
                url: self.info_url.clone(),
                status: status.as_u16(),
            });
        }

        let payload: InfoPayload =
            response
                .json()
                .await
                .map_err(|err| HostError::InvalidResponse {
                    url: self.info_url.clone(),
                    message: err.to_string(),
                })?;
        if payload.home.trim().is_empty() {
            return Err(HostError::InvalidResponse {
                url: self.info_url.clone(),
                message: "empty home path".to_string(),
            });
        }

        Ok(HostInfo {
            home: PathBuf::from(payload.home),
            version: payload.version.and_then(|v| v.pinokio),
        })
    }

    pub async fn is_running(&self) -> bool {
        self.info().await.is_ok()
    }

    /// Poll until the host answers. Returns `false` after `max_attempts`
    /// failed probes.
    pub async fn wait_until_running(&self, max_attempts: u32, interval: Duration) -> bool {
        for attempt in 1..=max_attempts {
            if self.is_running().await {
                tracing::debug!(attempt, "host app is answering");
                return true;
            }
            if attempt < max_attempts {
                tokio::time::sleep(interval).await;
            }
        }
        tracing::warn!(max_attempts, "host app did not come up");
        false
    }
}
