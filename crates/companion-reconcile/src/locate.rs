//! Resolve the peer tree and drives manifest under a host data path.

use crate::error::{ReconcileError, ReconcileResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const DRIVES_DIR: &str = "drives";
pub const PEERS_DIR: &str = "peers";
pub const MANIFEST_FILE: &str = "drives.json";

/// Paths that a peer check runs against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestRoot {
    pub drive_base: PathBuf,
    pub peer_dir: PathBuf,
    pub manifest_file: PathBuf,
    /// `false` when no peer has been shared yet; not an error.
    pub peers_exist: bool,
}

/// Locate `<base>/drives`, `<base>/drives/peers` and `<base>/drives.json`.
///
/// The base path, the drive root and the manifest must all be accessible.
/// The three checks are issued concurrently. A missing peer directory only
/// clears `peers_exist`.
pub async fn locate_manifest_root(base: impl AsRef<Path>) -> ReconcileResult<ManifestRoot> {
    let base = base.as_ref();
    let drive_base = base.join(DRIVES_DIR);
    let peer_dir = drive_base.join(PEERS_DIR);
    let manifest_file = base.join(MANIFEST_FILE);

    let (base_ok, drives_ok, manifest_ok) = tokio::join!(
        require_dir(base),
        require_dir(&drive_base),
        require_file(&manifest_file),
    );
    base_ok?;
    drives_ok?;
    manifest_ok?;

    let peers_exist = require_dir(&peer_dir).await.is_ok();
    if !peers_exist {
        tracing::debug!(peer_dir = %peer_dir.display(), "peer directory not created yet");
    }

    Ok(ManifestRoot {
        drive_base,
        peer_dir,
        manifest_file,
        peers_exist,
    })
}

async fn require_dir(path: &Path) -> ReconcileResult<()> {
    fs::read_dir(path)
        .await
        .map(|_| ())
        .map_err(|err| not_found(path, "directory", err))
}

async fn require_file(path: &Path) -> ReconcileResult<()> {
    fs::File::open(path)
        .await
        .map(|_| ())
        .map_err(|err| not_found(path, "file", err))
}

fn not_found(path: &Path, what: &str, err: std::io::Error) -> ReconcileError {
    ReconcileError::NotFound {
        path: path.to_path_buf(),
        reason: format!("{what} is not accessible: {err}"),
    }
}
