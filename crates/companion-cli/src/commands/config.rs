use crate::support::{self, GlobalArgs};
use companion_host::AppConfig;
use companion_host::ConfigStore;
use serde_json::json;

fn print_config(store: &ConfigStore, config: &AppConfig, json_output: bool, what: &str) {
    if json_output {
        let payload = json!({
            "schema": 1,
            "path": store.path().display().to_string(),
            "config": config,
        });
        support::print_json_or_exit(&payload, what);
        return;
    }

    println!("[{what}] {}", store.path().display());
    println!("  host path:   {}", config.host_path.display());
    println!(
        "  host exe:    {}",
        config
            .host_exe_path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "(auto)".to_string())
    );
    println!("  host api:    {}", config.host_api_url);
    println!("  initialized: {}", support::yes_no(config.initialized));
    println!(
        "  version:     {}",
        config.cache.host_version.as_deref().unwrap_or("unknown")
    );
    if let Some(updated) = config.cache.last_update {
        println!("  updated:     {}", updated.to_rfc3339());
    }
}

pub fn show(globals: &GlobalArgs, json_output: bool) {
    let (store, config) = support::load_config_or_exit(globals);
    print_config(&store, &config, json_output, "config");
}

pub fn init(globals: &GlobalArgs, host_path: String, json_output: bool) {
    let store = support::config_store_or_exit(globals);
    let config = store.initialize(host_path).unwrap_or_else(|err| {
        eprintln!("error: {err}");
        std::process::exit(1);
    });
    print_config(&store, &config, json_output, "config-init");
}
