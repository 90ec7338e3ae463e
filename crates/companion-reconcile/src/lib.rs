//! # Companion Reconcile
//!
//! Consistency check between the host app's shared peer tree and its drives
//! manifest.
//!
//! ## Layout
//!
//! ```text
//! <base>/drives.json        ← manifest: peer key → metadata
//! <base>/drives/            ← drive root
//! <base>/drives/peers/<id>  ← one directory per shared peer
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! locate ─┬─ scan peers ──────┬─ orphans
//!         └─ read manifest ───┴─ duplicates
//! ```
//!
//! The detectors are pure functions of their inputs and match on the raw
//! manifest text rather than on its parsed structure.

pub mod check;
pub mod duplicates;
pub mod error;
pub mod locate;
pub mod manifest;
pub mod orphans;
pub mod scan;

pub use check::{
    CheckEvent, CheckFailure, CheckOptions, CheckProgress, CheckReport, CheckSession, CheckStage,
    NoProgress, ProgressSink, StageStatus, run_full_check, spawn_full_check,
};
pub use duplicates::{DuplicateReport, find_duplicates};
pub use error::{ErrorKind, ReconcileError, ReconcileResult};
pub use locate::{ManifestRoot, locate_manifest_root};
pub use manifest::{Manifest, read_manifest};
pub use orphans::{OrphanReport, TokenShape, extract_peer_tokens, find_orphans, find_orphans_with_shape};
pub use scan::scan_peer_directories;
