//! Drives manifest loading.
//!
//! The manifest is kept twice: as a parsed key → value mapping for key
//! enumeration, and as the raw file text. The orphan and duplicate checks
//! work on the raw text because parsing drops whitespace, quoting and
//! repeated keys.

use crate::error::{ReconcileError, ReconcileResult};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;

/// A parsed drives manifest together with its verbatim text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Manifest {
    /// Entries in file order.
    pub entries: Map<String, Value>,
    #[serde(skip)]
    pub raw: String,
}

impl Manifest {
    /// Parse manifest text. `path` is only used for error reporting.
    pub fn parse(path: &Path, raw: String) -> ReconcileResult<Self> {
        let value: Value = serde_json::from_str(&raw).map_err(|err| invalid(path, err.to_string()))?;
        match value {
            Value::Object(entries) => Ok(Self { entries, raw }),
            other => Err(invalid(
                path,
                format!("expected a JSON object at the root, found {}", json_kind(&other)),
            )),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Read and parse the manifest at `path`.
///
/// Missing files map to `NotFound`, other I/O failures to `Unreadable`.
/// Bytes that are not UTF-8, malformed JSON and non-object roots map to
/// `InvalidManifest`.
pub async fn read_manifest(path: impl AsRef<Path>) -> ReconcileResult<Manifest> {
    let path = path.as_ref();
    let bytes = fs::read(path)
        .await
        .map_err(|err| ReconcileError::from_io(path, err))?;
    let raw = String::from_utf8(bytes).map_err(|err| invalid(path, format!("not UTF-8: {err}")))?;
    let manifest = Manifest::parse(path, raw)?;
    tracing::debug!(path = %path.display(), entries = manifest.len(), "manifest loaded");
    Ok(manifest)
}

fn invalid(path: &Path, message: String) -> ReconcileError {
    ReconcileError::InvalidManifest {
        path: PathBuf::from(path),
        message,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
