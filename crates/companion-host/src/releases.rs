//! Host app release feed and installer asset selection.

use crate::error::{HostError, HostResult};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::OnceLock;
use std::time::Duration;

pub const GITHUB_API_BASE: &str = "https://api.github.com";
pub const STABLE_REPO: &str = "pinokiocomputer/pinokio";
pub const EXPERIMENTAL_REPO: &str = "cocktailpeanutlabs/p2";
const USER_AGENT: &str = concat!("companion/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl Release {
    /// First asset whose file name ends with `suffix`.
    pub fn asset_for(&self, suffix: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|asset| asset.name.ends_with(suffix))
    }

    /// Version from the tag, without a leading `v`.
    pub fn version(&self) -> &str {
        self.tag_name.trim_start_matches('v')
    }
}

/// Installer asset suffix for an OS/arch pair as reported by
/// `std::env::consts`.
pub fn platform_asset_suffix(os: &str, arch: &str) -> Option<&'static str> {
    match os {
        "windows" => Some(if arch == "aarch64" {
            "win32-arm64.zip"
        } else {
            "win32.zip"
        }),
        "macos" => Some(if arch == "aarch64" {
            "darwin-arm64.zip"
        } else {
            "darwin-intel.zip"
        }),
        "linux" => Some(match arch {
            "x86_64" => "x86_64.rpm",
            "aarch64" => "arm64.deb",
            _ => "amd64.deb",
        }),
        _ => None,
    }
}

pub fn current_asset_suffix() -> Option<&'static str> {
    platform_asset_suffix(std::env::consts::OS, std::env::consts::ARCH)
}

/// Newest release by creation time.
pub fn latest_release(releases: &[Release]) -> Option<&Release> {
    releases.iter().max_by_key(|release| release.created_at)
}

fn asset_version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Pinokio-(\d+\.\d+\.\d+)").expect("asset version regex must compile"))
}

/// `Pinokio-3.2.218-win32.zip` → `3.2.218`.
pub fn version_from_asset_name(name: &str) -> Option<&str> {
    asset_version_re()
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Compare dotted versions numerically. Non-numeric parts compare as zero.
pub fn compare_versions(left: &str, right: &str) -> Ordering {
    let parse = |v: &str| -> Vec<u64> {
        v.trim_start_matches('v')
            .split(['.', '-', '+'])
            .map(|part| part.parse().unwrap_or(0))
            .collect()
    };
    let (mut a, mut b) = (parse(left), parse(right));
    let len = a.len().max(b.len());
    a.resize(len, 0);
    b.resize(len, 0);
    a.cmp(&b)
}

#[derive(Debug, Clone)]
pub struct ReleaseFeed {
    http: reqwest::Client,
    api_base: String,
}

impl ReleaseFeed {
    pub fn new(api_base: impl Into<String>) -> HostResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|err| HostError::Client(err.to_string()))?;
        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn github() -> HostResult<Self> {
        Self::new(GITHUB_API_BASE)
    }

    pub async fn stable(&self) -> HostResult<Vec<Release>> {
        self.releases(STABLE_REPO).await
    }

    pub async fn experimental(&self) -> HostResult<Vec<Release>> {
        self.releases(EXPERIMENTAL_REPO).await
    }

    /// All published releases of `repo` (`owner/name`).
    pub async fn releases(&self, repo: &str) -> HostResult<Vec<Release>> {
        let url = format!("{}/repos/{repo}/releases", self.api_base);
        let response = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.github.v3+json")
            .send()
            .await
            .map_err(|err| HostError::Unreachable {
                url: url.clone(),
                message: err.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(HostError::UnexpectedStatus {
                url,
                status: status.as_u16(),
            });
        }
        let releases: Vec<Release> = response.json().await.map_err(|err| HostError::InvalidResponse {
            url: url.clone(),
            message: err.to_string(),
        })?;
        tracing::debug!(repo, count = releases.len(), "fetched releases");
        Ok(releases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn release(tag: &str, created_at: &str, assets: &[&str]) -> Release {
        Release {
            tag_name: tag.to_string(),
            name: None,
            created_at: created_at.parse().expect("timestamp"),
            prerelease: false,
            html_url: None,
            assets: assets
                .iter()
                .map(|name| ReleaseAsset {
                    name: name.to_string(),
                    browser_download_url: format!("https://example.invalid/{name}"),
                    size: 1,
                })
                .collect(),
        }
    }

    #[test]
    fn asset_suffix_per_platform() {
        assert_eq!(platform_asset_suffix("windows", "x86_64"), Some("win32.zip"));
        assert_eq!(platform_asset_suffix("windows", "aarch64"), Some("win32-arm64.zip"));
        assert_eq!(platform_asset_suffix("macos", "aarch64"), Some("darwin-arm64.zip"));
        assert_eq!(platform_asset_suffix("macos", "x86_64"), Some("darwin-intel.zip"));
        assert_eq!(platform_asset_suffix("linux", "x86_64"), Some("x86_64.rpm"));
        assert_eq!(platform_asset_suffix("linux", "aarch64"), Some("arm64.deb"));
        assert_eq!(platform_asset_suffix("linux", "riscv64"), Some("amd64.deb"));
        assert_eq!(platform_asset_suffix("freebsd", "x86_64"), None);
    }

    #[test]
    fn latest_release_is_newest_by_creation() {
        let releases = vec![
            release("v3.1.0", "2024-01-01T00:00:00Z", &[]),
            release("v3.2.0", "2024-06-01T00:00:00Z", &[]),
            release("v3.0.9", "2023-01-01T00:00:00Z", &[]),
        ];
        assert_eq!(latest_release(&releases).map(Release::version), Some("3.2.0"));
        assert!(latest_release(&[]).is_none());
    }

    #[test]
    fn asset_lookup_and_version_extraction() {
        let r = release(
            "v3.2.218",
            "2024-06-01T00:00:00Z",
            &["Pinokio-3.2.218-win32.zip", "Pinokio-3.2.218-x86_64.rpm"],
        );
        let asset = r.asset_for("x86_64.rpm").expect("rpm asset");
        assert_eq!(asset.name, "Pinokio-3.2.218-x86_64.rpm");
        assert_eq!(version_from_asset_name(&asset.name), Some("3.2.218"));
        assert!(r.asset_for("arm64.deb").is_none());
        assert_eq!(version_from_asset_name("setup.exe"), None);
    }

    #[test]
    fn versions_compare_numerically() {
        assert_eq!(compare_versions("3.2.218", "3.2.30"), Ordering::Greater);
        assert_eq!(compare_versions("v3.2", "3.2.0"), Ordering::Equal);
        assert_eq!(compare_versions("2.9.9", "3.0.0"), Ordering::Less);
    }

    #[tokio::test]
    async fn feed_fetches_repo_releases() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/pinokiocomputer/pinokio/releases"))
            .and(header("accept", "application/vnd.github.v3+json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "tag_name": "v3.2.0",
                    "created_at": "2024-06-01T00:00:00Z",
                    "assets": [
                        {"name": "Pinokio-3.2.0-win32.zip", "browser_download_url": "https://x/a.zip", "size": 10}
                    ]
                }
            ])))
            .mount(&server)
            .await;

        let feed = ReleaseFeed::new(server.uri()).expect("feed");
        let releases = feed.stable().await.expect("releases");
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].asset_for("win32.zip").map(|a| a.size), Some(10));
    }
}
