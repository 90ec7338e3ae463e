use crate::support::{self, GlobalArgs};
use serde_json::json;

pub fn run(globals: &GlobalArgs, json_output: bool) {
    let runtime = support::runtime_or_exit();
    let (store, mut config) = support::load_config_or_exit(globals);
    let client = support::host_client_or_exit(globals, &config);

    let info = runtime.block_on(client.info()).unwrap_or_else(|err| {
        eprintln!("error: {err}");
        std::process::exit(1);
    });

    config.record_host_info(&info);
    if let Err(err) = store.save(&mut config) {
        tracing::warn!(error = %err, "failed to refresh config cache");
    }

    if json_output {
        let payload = json!({
            "schema": 1,
            "url": client.info_url(),
            "home": info.home.display().to_string(),
            "peerBase": companion_host::peer_base(&info.home).display().to_string(),
            "version": info.version,
        });
        support::print_json_or_exit(&payload, "host-info");
    } else {
        println!("[host-info] {}", client.info_url());
        println!("  home:      {}", info.home.display());
        println!(
            "  peer base: {}",
            companion_host::peer_base(&info.home).display()
        );
        println!(
            "  version:   {}",
            info.version.as_deref().unwrap_or("unknown")
        );
    }
}
