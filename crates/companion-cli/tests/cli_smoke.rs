use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_companion<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_companion");
    Command::new(bin)
        .args(args)
        .env_remove("COMPANION_LOG")
        .output()
        .expect("companion command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn assert_exit_code(output: &Output, code: i32) {
    if output.status.code() != Some(code) {
        panic!(
            "expected exit code {code}, got {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout should be valid json: {e}\nstdout:\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn drive_base(peers: &[&str], manifest: &str) -> TempDir {
    let tmp = tempfile::tempdir().expect("tempdir");
    let peer_dir = tmp.path().join("drives").join("peers");
    fs::create_dir_all(&peer_dir).expect("peer dir should be created");
    for peer in peers {
        fs::create_dir(peer_dir.join(peer)).expect("peer should be created");
    }
    fs::write(tmp.path().join("drives.json"), manifest).expect("manifest should be written");
    tmp
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[test]
fn peer_check_json_accepts_consistent_layout() {
    let base = drive_base(&["a.1"], r#"{"main":{"path":"/host/drive/drives/peers/a.1/"}}"#);
    let output = run_companion(["peer-check", "--base", &path_arg(base.path()), "--json"]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["schema"], 1);
    assert_eq!(payload["checkKind"], "companion.peer_check.v1");
    assert_eq!(payload["result"], "accepted");
    assert_eq!(payload["report"]["peerDirectories"], serde_json::json!(["a.1"]));
    assert_eq!(payload["report"]["manifestKeys"], serde_json::json!(["main"]));
    assert_eq!(payload["report"]["orphans"]["dirToJson"], serde_json::json!([]));
    assert_eq!(payload["report"]["orphans"]["jsonToDir"], serde_json::json!([]));
    assert!(payload["home"].is_null());

    let stages: Vec<&str> = payload["progress"]
        .as_array()
        .expect("progress should be an array")
        .iter()
        .filter_map(|step| step["stage"].as_str())
        .collect();
    assert_eq!(stages.first(), Some(&"initializing"));
    assert_eq!(stages.last(), Some(&"complete"));
}

#[test]
fn peer_check_reports_findings_with_exit_code_one() {
    let base = drive_base(
        &["a.1", "b.2"],
        r#"{"a.1":{"path":"/host/drive/drives/peers/a.1/"},"c.3":{"path":"/host/drive/drives/peers/c.3/"}}"#,
    );
    let output = run_companion(["peer-check", "--base", &path_arg(base.path()), "--json"]);
    assert_exit_code(&output, 1);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["result"], "rejected");
    assert_eq!(
        payload["failureClasses"],
        serde_json::json!(["peer_manifest_mismatch"])
    );
    assert_eq!(payload["report"]["orphans"]["dirToJson"], serde_json::json!(["b.2"]));
    assert_eq!(payload["report"]["orphans"]["jsonToDir"], serde_json::json!(["c.3"]));
    assert!(payload["report"]["duplicates"]["a.1"].is_array());
}

#[test]
fn peer_check_text_output_lists_orphans() {
    let base = drive_base(&["a.1", "b.2"], r#"{"main":{"path":"/x/peers/a.1/"}}"#);
    let output = run_companion(["peer-check", "--base", &path_arg(base.path())]);
    assert_exit_code(&output, 1);

    let stdout = stdout_text(&output);
    assert!(stdout.contains("[peer-check] initializing running"));
    assert!(stdout.contains("[peer-check] scanning_directories success: found 2 peer directories"));
    assert!(stdout.contains("directories missing from drives.json: 1"));
    assert!(stdout.contains("  - b.2"));
    assert!(stdout.contains("[peer-check] FINDINGS (duplicates=0, orphans=1)"));
}

#[test]
fn peer_check_missing_base_fails_with_exit_code_two() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let missing = tmp.path().join("nope");
    let output = run_companion(["peer-check", "--base", &path_arg(&missing), "--json"]);
    assert_exit_code(&output, 2);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["result"], "failed");
    assert_eq!(payload["failure"]["stage"], "initializing");
    assert_eq!(payload["failure"]["errorKind"], "not_found");
    assert!(payload.get("report").is_none());
}

#[test]
fn peer_check_home_uses_drive_subdirectory() {
    let home = tempfile::tempdir().expect("tempdir");
    let base = home.path().join("drive");
    fs::create_dir_all(base.join("drives").join("peers")).expect("layout should be created");
    fs::write(base.join("drives.json"), "{}").expect("manifest should be written");

    let output = run_companion(["peer-check", "--home", &path_arg(home.path()), "--json"]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["base"], path_arg(&base));
    assert_eq!(payload["home"]["source"], "explicit");
    assert_eq!(payload["report"]["peerDirectoryCount"], 0);
}

#[test]
fn peer_locate_json_reports_layout() {
    let tmp = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(tmp.path().join("drives")).expect("drives should be created");
    fs::write(tmp.path().join("drives.json"), "{}").expect("manifest should be written");

    let output = run_companion(["peer-locate", "--base", &path_arg(tmp.path()), "--json"]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["root"]["peersExist"], false);
    assert_eq!(
        payload["root"]["peerDir"],
        path_arg(&tmp.path().join("drives").join("peers"))
    );
}

#[test]
fn config_init_then_show_round_trips_host_path() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config_path = tmp.path().join("conf").join("config.toml");
    let host = tmp.path().join("host");
    fs::create_dir_all(&host).expect("host dir should be created");

    let init = run_companion([
        "--config",
        &path_arg(&config_path),
        "config",
        "init",
        "--host-path",
        &path_arg(&host),
        "--json",
    ]);
    assert_success(&init);
    assert!(config_path.is_file());

    let show = run_companion(["--config", &path_arg(&config_path), "config", "show", "--json"]);
    assert_success(&show);
    let payload = parse_json_stdout(&show);
    assert_eq!(payload["config"]["initialized"], true);
    assert_eq!(payload["config"]["host_path"], path_arg(&host));
}

#[test]
fn config_init_rejects_missing_host_path() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config_path = tmp.path().join("config.toml");
    let output = run_companion([
        "--config",
        &path_arg(&config_path),
        "config",
        "init",
        "--host-path",
        &path_arg(&tmp.path().join("missing")),
    ]);
    assert_exit_code(&output, 1);
    assert!(!config_path.exists());
}

#[test]
fn host_info_fails_when_host_is_down() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);

    let tmp = tempfile::tempdir().expect("tempdir");
    let output = run_companion([
        "--config",
        &path_arg(&tmp.path().join("config.toml")),
        "--host-url",
        &format!("http://127.0.0.1:{port}/pinokio/info"),
        "host-info",
    ]);
    assert_exit_code(&output, 1);
    assert!(String::from_utf8_lossy(&output.stderr).contains("not reachable"));
}
