//! Peer check orchestration.
//!
//! A run walks a fixed sequence of stages, emitting a progress event when a
//! stage starts and when it concludes:
//!
//! ```text
//! Idle → Initializing → ScanningDirectories → ReadingManifest
//!      → CheckingDuplicates → CheckingOrphans → Complete
//! ```
//!
//! The first failure moves the run to `Failed` and stops it. A
//! [`CheckSession`] keeps the last result of every section and replaces a
//! section only once the step producing it has succeeded again.

use crate::duplicates::{DuplicateReport, find_duplicates};
use crate::error::ReconcileError;
use crate::locate::{ManifestRoot, locate_manifest_root};
use crate::manifest::{Manifest, read_manifest};
use crate::orphans::{OrphanReport, TokenShape, find_orphans_with_shape};
use crate::scan::scan_peer_directories;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStage {
    #[default]
    Idle,
    Initializing,
    ScanningDirectories,
    ReadingManifest,
    CheckingDuplicates,
    CheckingOrphans,
    Complete,
    Failed,
}

impl CheckStage {
    /// Successor on the success path; `None` for terminal stages.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Initializing),
            Self::Initializing => Some(Self::ScanningDirectories),
            Self::ScanningDirectories => Some(Self::ReadingManifest),
            Self::ReadingManifest => Some(Self::CheckingDuplicates),
            Self::CheckingDuplicates => Some(Self::CheckingOrphans),
            Self::CheckingOrphans => Some(Self::Complete),
            Self::Complete | Self::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Initializing => "initializing",
            Self::ScanningDirectories => "scanning_directories",
            Self::ReadingManifest => "reading_manifest",
            Self::CheckingDuplicates => "checking_duplicates",
            Self::CheckingOrphans => "checking_orphans",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }
}

impl Display for CheckStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Running,
    Success,
    Info,
    Warning,
    Error,
}

impl StageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl Display for StageStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckProgress {
    pub stage: CheckStage,
    pub status: StageStatus,
    pub detail: String,
}

/// Receiver of progress events.
pub trait ProgressSink {
    fn emit(&mut self, progress: CheckProgress);
}

impl<F: FnMut(CheckProgress)> ProgressSink for F {
    fn emit(&mut self, progress: CheckProgress) {
        self(progress)
    }
}

/// Discards progress events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn emit(&mut self, _progress: CheckProgress) {}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckOptions {
    pub token_shape: TokenShape,
    /// Pause before each stage. Zero disables pacing.
    pub step_delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub root: ManifestRoot,
    pub peer_directories: Vec<String>,
    pub peer_directory_count: usize,
    pub manifest_keys: Vec<String>,
    pub manifest_entry_count: usize,
    pub duplicates: DuplicateReport,
    pub orphans: OrphanReport,
}

impl CheckReport {
    pub fn has_findings(&self) -> bool {
        !self.duplicates.is_empty() || !self.orphans.is_empty()
    }
}

/// The stage a run stopped at and why.
#[derive(Debug, thiserror::Error)]
#[error("peer check failed while {stage}: {error}")]
pub struct CheckFailure {
    pub stage: CheckStage,
    #[source]
    pub error: ReconcileError,
}

#[derive(Debug)]
pub enum CheckEvent {
    Progress(CheckProgress),
    Complete(Box<CheckReport>),
    Failed(CheckFailure),
}

/// Per-section results of the most recent runs.
#[derive(Debug, Default)]
pub struct CheckSession {
    options: CheckOptions,
    stage: CheckStage,
    root: Option<ManifestRoot>,
    directories: Option<Vec<String>>,
    manifest: Option<Manifest>,
    duplicates: Option<DuplicateReport>,
    orphans: Option<OrphanReport>,
}

impl CheckSession {
    pub fn new(options: CheckOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn stage(&self) -> CheckStage {
        self.stage
    }

    pub fn root(&self) -> Option<&ManifestRoot> {
        self.root.as_ref()
    }

    pub fn directories(&self) -> Option<&[String]> {
        self.directories.as_deref()
    }

    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }

    pub fn duplicates(&self) -> Option<&DuplicateReport> {
        self.duplicates.as_ref()
    }

    pub fn orphans(&self) -> Option<&OrphanReport> {
        self.orphans.as_ref()
    }

    /// Run every stage against `base`, replacing each section as its stage
    /// succeeds. Stops at the first failure.
    pub async fn run(
        &mut self,
        base: impl AsRef<Path>,
        sink: &mut impl ProgressSink,
    ) -> Result<CheckReport, CheckFailure> {
        let base = base.as_ref();
        tracing::info!(base = %base.display(), "peer check started");
        self.stage = CheckStage::Idle;

        self.enter(
            CheckStage::Initializing,
            sink,
            format!("locating peer tree under {}", base.display()),
        )
        .await;
        let root = match locate_manifest_root(base).await {
            Ok(root) => root,
            Err(error) => return Err(self.fail(error, sink)),
        };
        report(
            sink,
            CheckStage::Initializing,
            StageStatus::Success,
            format!(
                "drive base {}, manifest {}",
                root.drive_base.display(),
                root.manifest_file.display()
            ),
        );
        self.root = Some(root.clone());

        self.enter(
            CheckStage::ScanningDirectories,
            sink,
            format!("scanning {}", root.peer_dir.display()),
        )
        .await;
        let directories = match scan_peer_directories(&root.peer_dir).await {
            Ok(dirs) => dirs,
            Err(error) => return Err(self.fail(error, sink)),
        };
        let (status, detail) = match (directories.len(), root.peers_exist) {
            (0, false) => (
                StageStatus::Info,
                "peers directory has not been created yet; this is normal when no models have been shared between apps"
                    .to_string(),
            ),
            (0, true) => (
                StageStatus::Warning,
                "no peer directories found in existing peers directory".to_string(),
            ),
            (count, _) => (StageStatus::Success, format!("found {count} peer directories")),
        };
        report(sink, CheckStage::ScanningDirectories, status, detail);
        self.directories = Some(directories.clone());

        self.enter(
            CheckStage::ReadingManifest,
            sink,
            format!("reading {}", root.manifest_file.display()),
        )
        .await;
        let manifest = match read_manifest(&root.manifest_file).await {
            Ok(manifest) => manifest,
            Err(error) => return Err(self.fail(error, sink)),
        };
        report(
            sink,
            CheckStage::ReadingManifest,
            StageStatus::Success,
            format!("found {} entries in the manifest", manifest.len()),
        );
        self.manifest = Some(manifest.clone());

        self.enter(
            CheckStage::CheckingDuplicates,
            sink,
            "checking for duplicate entries".to_string(),
        )
        .await;
        let duplicates = find_duplicates(&manifest.entries, &manifest.raw);
        if duplicates.is_empty() {
            report(
                sink,
                CheckStage::CheckingDuplicates,
                StageStatus::Success,
                "no duplicate entries found".to_string(),
            );
        } else {
            report(
                sink,
                CheckStage::CheckingDuplicates,
                StageStatus::Warning,
                format!("found {} duplicate keys", duplicates.len()),
            );
        }
        self.duplicates = Some(duplicates.clone());

        self.enter(
            CheckStage::CheckingOrphans,
            sink,
            "checking for orphaned entries".to_string(),
        )
        .await;
        let orphans = find_orphans_with_shape(&directories, &manifest.raw, self.options.token_shape);
        if orphans.is_empty() {
            report(
                sink,
                CheckStage::CheckingOrphans,
                StageStatus::Success,
                "all directories and manifest entries are linked".to_string(),
            );
        } else {
            report(
                sink,
                CheckStage::CheckingOrphans,
                StageStatus::Warning,
                format!(
                    "{} directories missing from the manifest, {} manifest entries without a directory",
                    orphans.directories_without_manifest_entry.len(),
                    orphans.manifest_entries_without_directory.len()
                ),
            );
        }
        self.orphans = Some(orphans.clone());

        self.transition(CheckStage::Complete);
        let manifest_keys: Vec<String> = manifest.keys().map(str::to_string).collect();
        let summary = CheckReport {
            root,
            peer_directory_count: directories.len(),
            peer_directories: directories,
            manifest_entry_count: manifest_keys.len(),
            manifest_keys,
            duplicates,
            orphans,
        };
        report(
            sink,
            CheckStage::Complete,
            StageStatus::Success,
            format!(
                "peer check complete: {} directories, {} manifest entries",
                summary.peer_directory_count, summary.manifest_entry_count
            ),
        );
        tracing::info!(
            directories = summary.peer_directory_count,
            entries = summary.manifest_entry_count,
            duplicates = summary.duplicates.len(),
            orphans = summary.orphans.len(),
            "peer check complete"
        );
        Ok(summary)
    }

    async fn enter(&mut self, stage: CheckStage, sink: &mut impl ProgressSink, detail: String) {
        if !self.options.step_delay.is_zero() {
            tokio::time::sleep(self.options.step_delay).await;
        }
        self.transition(stage);
        tracing::debug!(stage = %stage, "{detail}");
        report(sink, stage, StageStatus::Running, detail);
    }

    fn transition(&mut self, to: CheckStage) {
        debug_assert!(
            to == CheckStage::Failed || self.stage.next() == Some(to),
            "invalid peer check transition {} -> {}",
            self.stage,
            to
        );
        self.stage = to;
    }

    fn fail(&mut self, error: ReconcileError, sink: &mut impl ProgressSink) -> CheckFailure {
        let stage = self.stage;
        self.transition(CheckStage::Failed);
        tracing::warn!(stage = %stage, error = %error, "peer check failed");
        report(sink, stage, StageStatus::Error, error.to_string());
        CheckFailure { stage, error }
    }
}

fn report(sink: &mut impl ProgressSink, stage: CheckStage, status: StageStatus, detail: String) {
    sink.emit(CheckProgress {
        stage,
        status,
        detail,
    });
}

/// One-shot run with a fresh session.
pub async fn run_full_check(
    base: impl AsRef<Path>,
    options: CheckOptions,
    sink: &mut impl ProgressSink,
) -> Result<CheckReport, CheckFailure> {
    CheckSession::new(options).run(base, sink).await
}

/// Run a check on the current tokio runtime and stream its events.
///
/// The last event is always `Complete` or `Failed`.
pub fn spawn_full_check(base: PathBuf, options: CheckOptions) -> mpsc::UnboundedReceiver<CheckEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let progress_tx = tx.clone();
        let mut sink = move |progress: CheckProgress| {
            let _ = progress_tx.send(CheckEvent::Progress(progress));
        };
        let terminal = match run_full_check(&base, options, &mut sink).await {
            Ok(report) => CheckEvent::Complete(Box::new(report)),
            Err(failure) => CheckEvent::Failed(failure),
        };
        let _ = tx.send(terminal);
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_path_visits_every_stage_once() {
        let mut stage = CheckStage::Idle;
        let mut visited = vec![stage];
        while let Some(next) = stage.next() {
            visited.push(next);
            stage = next;
        }
        assert_eq!(
            visited,
            vec![
                CheckStage::Idle,
                CheckStage::Initializing,
                CheckStage::ScanningDirectories,
                CheckStage::ReadingManifest,
                CheckStage::CheckingDuplicates,
                CheckStage::CheckingOrphans,
                CheckStage::Complete,
            ]
        );
        assert!(CheckStage::Failed.is_terminal());
        assert!(CheckStage::Failed.next().is_none());
    }

    #[test]
    fn stage_labels_match_serialized_form() {
        let mut stage = CheckStage::Idle;
        loop {
            assert_eq!(
                serde_json::to_value(stage).expect("serialize"),
                serde_json::json!(stage.to_string())
            );
            match stage.next() {
                Some(next) => stage = next,
                None => break,
            }
        }
        assert_eq!(CheckStage::ScanningDirectories.to_string(), "scanning_directories");
        assert_eq!(
            serde_json::to_value(CheckStage::Failed).expect("serialize"),
            serde_json::json!(CheckStage::Failed.as_str())
        );
    }
}
