use crate::support::{self, GlobalArgs};
use companion_reconcile::locate_manifest_root;
use serde_json::json;

pub fn run(globals: &GlobalArgs, base: Option<String>, home: Option<String>, json_output: bool) {
    let runtime = support::runtime_or_exit();
    let resolved = support::resolve_base_or_exit(&runtime, globals, base, home);

    let root = runtime
        .block_on(locate_manifest_root(&resolved.base))
        .unwrap_or_else(|err| {
            if json_output {
                let payload = json!({
                    "schema": 1,
                    "base": resolved.base.display().to_string(),
                    "home": resolved.home,
                    "errorKind": err.kind(),
                    "message": err.to_string(),
                });
                support::print_json_or_exit(&payload, "peer-locate");
            } else {
                eprintln!("error: {err}");
            }
            std::process::exit(2);
        });

    if json_output {
        let payload = json!({
            "schema": 1,
            "base": resolved.base.display().to_string(),
            "home": resolved.home,
            "root": root,
        });
        support::print_json_or_exit(&payload, "peer-locate");
        return;
    }

    println!("[peer-locate] base: {}", resolved.base.display());
    if let Some(home) = &resolved.home {
        println!(
            "[peer-locate] home: {} ({})",
            home.path.display(),
            home.source.as_str()
        );
    }
    println!("  drive base: {}", root.drive_base.display());
    println!(
        "  peers:      {} (exists: {})",
        root.peer_dir.display(),
        support::yes_no(root.peers_exist)
    );
    println!("  manifest:   {}", root.manifest_file.display());
}
