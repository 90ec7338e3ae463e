//! List peer directories.

use crate::error::{ReconcileError, ReconcileResult};
use std::io;
use std::path::Path;
use tokio::fs;

/// Names of the immediate child directories of `peer_dir`, sorted.
///
/// Files and symbolic links are skipped; the file type is read without
/// following links. A missing `peer_dir` yields an empty list.
pub async fn scan_peer_directories(peer_dir: impl AsRef<Path>) -> ReconcileResult<Vec<String>> {
    let peer_dir = peer_dir.as_ref();
    let mut entries = match fs::read_dir(peer_dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(ReconcileError::from_io(peer_dir, err)),
    };

    let mut dirs = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|err| ReconcileError::from_io(peer_dir, err))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|err| ReconcileError::from_io(&entry.path(), err))?;
        if !file_type.is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => dirs.push(name),
            Err(raw) => {
                tracing::warn!(name = ?raw, "skipping peer directory with non-UTF-8 name");
            }
        }
    }
    dirs.sort();
    Ok(dirs)
}
