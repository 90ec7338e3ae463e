//! Error types for reconciler operations.

use std::io;
use std::path::{Path, PathBuf};

/// Result type for reconciler operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Errors raised while locating, scanning, or reading the peer layout.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// A required path is missing or cannot be accessed.
    #[error("not found: {} ({reason})", path.display())]
    NotFound { path: PathBuf, reason: String },

    /// The path exists but reading it failed.
    #[error("unreadable: {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The manifest text is not a well-formed JSON object.
    #[error("invalid manifest {}: {message}", path.display())]
    InvalidManifest { path: PathBuf, message: String },
}

impl ReconcileError {
    /// Classify an I/O failure on `path`: missing files become `NotFound`,
    /// everything else `Unreadable`.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
                reason: err.to_string(),
            }
        } else {
            Self::Unreadable {
                path: path.to_path_buf(),
                source: err,
            }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Unreadable { .. } => ErrorKind::Unreadable,
            Self::InvalidManifest { .. } => ErrorKind::InvalidManifest,
        }
    }
}

/// Stable error classes for machine-readable reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Unreadable,
    InvalidManifest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_classifies_as_not_found() {
        let err = ReconcileError::from_io(
            Path::new("/nowhere/drives.json"),
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("/nowhere/drives.json"));
    }

    #[test]
    fn permission_denied_classifies_as_unreadable() {
        let err = ReconcileError::from_io(
            Path::new("/locked"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.kind(), ErrorKind::Unreadable);
    }
}
