//! Starting the host app.
//!
//! Executables are tried in order: the configured path, the platform
//! default install location, well-known names under the host home, and
//! finally the platform launcher.

use crate::client::HostClient;
use crate::config::AppConfig;
use crate::error::{HostError, HostResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

const HOME_EXECUTABLES: [&str; 4] = [
    "Pinokio.exe",
    "bin/Pinokio.exe",
    "bin/pinokio.exe",
    "pinokio.exe",
];

/// How the host was started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LaunchTarget {
    Executable { path: PathBuf },
    Shell { program: String, args: Vec<String> },
}

/// Where the platform installer puts the host executable.
pub fn default_install_path() -> Option<PathBuf> {
    if cfg!(windows) {
        dirs::home_dir().map(|home| {
            home.join("AppData")
                .join("Local")
                .join("Programs")
                .join("Pinokio")
                .join("Pinokio.exe")
        })
    } else {
        None
    }
}

pub fn home_candidates(home: &Path) -> Vec<PathBuf> {
    HOME_EXECUTABLES.iter().map(|rel| home.join(rel)).collect()
}

/// First candidate that is a regular file.
pub fn first_executable(candidates: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    candidates.into_iter().find(|path| path.is_file())
}

/// Platform launcher used when no executable could be found.
pub fn shell_fallback() -> (String, Vec<String>) {
    let (program, args): (&str, &[&str]) = if cfg!(windows) {
        ("cmd", &["/c", "start", "pinokio"])
    } else if cfg!(target_os = "macos") {
        ("open", &["-a", "Pinokio"])
    } else {
        ("pinokio", &[])
    };
    (
        program.to_string(),
        args.iter().map(|arg| arg.to_string()).collect(),
    )
}

/// Resolve what to start, asking the live host for its home when the
/// configured and default locations have nothing.
pub async fn resolve_launch_target(config: &AppConfig, client: &HostClient) -> LaunchTarget {
    let direct = config
        .host_exe_path
        .iter()
        .cloned()
        .chain(default_install_path());
    if let Some(path) = first_executable(direct) {
        return LaunchTarget::Executable { path };
    }

    let home = match client.info().await {
        Ok(info) => info.home,
        Err(err) => {
            tracing::debug!(error = %err, "host home unavailable, using configured path");
            config.host_path.clone()
        }
    };
    if let Some(path) = first_executable(home_candidates(&home)) {
        return LaunchTarget::Executable { path };
    }

    let (program, args) = shell_fallback();
    LaunchTarget::Shell { program, args }
}

/// Start the host detached from this process.
pub async fn launch_host(config: &AppConfig, client: &HostClient) -> HostResult<LaunchTarget> {
    let target = resolve_launch_target(config, client).await;
    spawn_detached(&target)?;
    tracing::info!(target = ?target, "host app launched");
    Ok(target)
}

fn spawn_detached(target: &LaunchTarget) -> HostResult<()> {
    let mut command = match target {
        LaunchTarget::Executable { path } => {
            let mut command = Command::new(path);
            if let Some(dir) = path.parent() {
                command.current_dir(dir);
            }
            command
        }
        LaunchTarget::Shell { program, args } => {
            let mut command = Command::new(program);
            command.args(args);
            command
        }
    };
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_child| ())
        .map_err(|err| HostError::Launch(format!("{target:?}: {err}")))
}
