//! Error types for host adapters.

use std::path::PathBuf;

pub type HostResult<T> = Result<T, HostError>;

/// Errors from talking to, or launching, the host app.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The host app's live API did not answer.
    #[error("host app is not reachable at {url}: {message}")]
    Unreachable { url: String, message: String },

    #[error("host API {url} answered with status {status}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("unable to parse host API response from {url}: {message}")]
    InvalidResponse { url: String, message: String },

    #[error("http client setup failed: {0}")]
    Client(String),

    #[error("could not launch the host app: {0}")]
    Launch(String),

    /// No live answer and no initialized config to fall back on.
    #[error("host home is unknown: {0}")]
    HomeUnavailable(String),
}

/// Errors from the persisted companion configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("host path {} is not readable: {source}", path.display())]
    HostPathUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no config directory is available on this platform")]
    NoConfigDir,
}
