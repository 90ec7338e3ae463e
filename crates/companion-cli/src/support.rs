use companion_host::{
    AppConfig, ConfigStore, HomeSource, HostClient, HostHome, HostInfo, resolve_host_home,
};
use serde_json::Value;
use std::path::PathBuf;
use std::process;
use tokio::runtime::Runtime;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub config: Option<String>,
    pub host_url: Option<String>,
}

/// Where a command's drive base came from.
#[derive(Debug, Clone)]
pub struct ResolvedBase {
    pub base: PathBuf,
    /// `None` when `--base` was given directly.
    pub home: Option<HostHome>,
}

pub fn runtime_or_exit() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|err| {
            eprintln!("error: failed to create tokio runtime: {err}");
            process::exit(2);
        })
}

pub fn config_store_or_exit(globals: &GlobalArgs) -> ConfigStore {
    match &globals.config {
        Some(path) => ConfigStore::new(path),
        None => ConfigStore::open_default().unwrap_or_else(|err| {
            eprintln!("error: {err}");
            process::exit(2);
        }),
    }
}

pub fn load_config_or_exit(globals: &GlobalArgs) -> (ConfigStore, AppConfig) {
    let store = config_store_or_exit(globals);
    let config = store.load().unwrap_or_else(|err| {
        eprintln!("error: {err}");
        process::exit(2);
    });
    (store, config)
}

pub fn host_client_or_exit(globals: &GlobalArgs, config: &AppConfig) -> HostClient {
    let url = globals
        .host_url
        .clone()
        .unwrap_or_else(|| config.host_api_url.clone());
    HostClient::new(url).unwrap_or_else(|err| {
        eprintln!("error: {err}");
        process::exit(2);
    })
}

/// Persist what a live host reported. Failures only warn: the command's
/// own result does not depend on the cache.
pub fn refresh_cache(store: &ConfigStore, config: &mut AppConfig, home: &HostHome) {
    if home.source != HomeSource::Live {
        return;
    }
    config.record_host_info(&HostInfo {
        home: home.path.clone(),
        version: home.version.clone(),
    });
    if let Err(err) = store.save(config) {
        tracing::warn!(error = %err, "failed to refresh config cache");
    }
}

/// Resolve the drive base from `--base`, `--home`, or the host itself.
pub fn resolve_base_or_exit(
    runtime: &Runtime,
    globals: &GlobalArgs,
    base: Option<String>,
    home: Option<String>,
) -> ResolvedBase {
    if let Some(base) = base {
        return ResolvedBase {
            base: PathBuf::from(base),
            home: None,
        };
    }
    if let Some(home) = home {
        let home = HostHome::explicit(home);
        return ResolvedBase {
            base: home.peer_base(),
            home: Some(home),
        };
    }

    let (store, mut config) = load_config_or_exit(globals);
    let client = host_client_or_exit(globals, &config);
    let home = runtime
        .block_on(resolve_host_home(&client, &config))
        .unwrap_or_else(|err| {
            eprintln!("error: {err}");
            process::exit(2);
        });
    refresh_cache(&store, &mut config, &home);
    ResolvedBase {
        base: home.peer_base(),
        home: Some(home),
    }
}

pub fn print_json_or_exit(payload: &Value, what: &str) {
    let rendered = serde_json::to_string_pretty(payload).unwrap_or_else(|err| {
        eprintln!("error: failed to render {what} payload: {err}");
        process::exit(2);
    });
    println!("{rendered}");
}

pub fn yes_no(ok: bool) -> &'static str {
    if ok { "yes" } else { "no" }
}
