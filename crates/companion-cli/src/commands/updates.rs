use crate::support::{self, GlobalArgs};
use companion_host::releases::{compare_versions, version_from_asset_name};
use companion_host::{Release, ReleaseFeed, current_asset_suffix, latest_release};
use serde_json::{Value, json};
use std::cmp::Ordering;

fn release_summary(release: &Release, suffix: Option<&str>) -> Value {
    let asset = suffix.and_then(|suffix| release.asset_for(suffix));
    json!({
        "tag": release.tag_name,
        "version": asset
            .and_then(|asset| version_from_asset_name(&asset.name))
            .unwrap_or_else(|| release.version()),
        "createdAt": release.created_at,
        "prerelease": release.prerelease,
        "asset": asset.map(|asset| &asset.name),
        "downloadUrl": asset.map(|asset| &asset.browser_download_url),
    })
}

pub fn run(globals: &GlobalArgs, json_output: bool) {
    let runtime = support::runtime_or_exit();
    let (store, mut config) = support::load_config_or_exit(globals);
    let client = support::host_client_or_exit(globals, &config);
    let feed = ReleaseFeed::github().unwrap_or_else(|err| {
        eprintln!("error: {err}");
        std::process::exit(1);
    });

    let (live, stable, experimental) = runtime.block_on(async {
        let live = client.info().await;
        let stable = feed.stable().await;
        let experimental = feed.experimental().await;
        (live, stable, experimental)
    });

    let current = match live {
        Ok(info) => {
            config.record_host_info(&info);
            if let Err(err) = store.save(&mut config) {
                tracing::warn!(error = %err, "failed to refresh config cache");
            }
            info.version
        }
        Err(err) => {
            tracing::warn!(error = %err, "host app unreachable, using cached version");
            config.cache.host_version.clone()
        }
    };

    let stable = stable.unwrap_or_else(|err| {
        eprintln!("error: {err}");
        std::process::exit(1);
    });
    let experimental = experimental.unwrap_or_else(|err| {
        tracing::warn!(error = %err, "experimental release feed unavailable");
        Vec::new()
    });

    let suffix = current_asset_suffix();
    let latest = latest_release(&stable);
    let latest_version = latest.map(|release| {
        suffix
            .and_then(|suffix| release.asset_for(suffix))
            .and_then(|asset| version_from_asset_name(&asset.name))
            .unwrap_or_else(|| release.version())
            .to_string()
    });
    let update_available = match (&current, &latest_version) {
        (Some(current), Some(latest)) => compare_versions(latest, current) == Ordering::Greater,
        _ => false,
    };

    if json_output {
        let payload = json!({
            "schema": 1,
            "currentVersion": current,
            "assetSuffix": suffix,
            "updateAvailable": update_available,
            "latest": latest.map(|release| release_summary(release, suffix)),
            "experimental": experimental
                .iter()
                .map(|release| release_summary(release, suffix))
                .collect::<Vec<_>>(),
        });
        support::print_json_or_exit(&payload, "updates");
        return;
    }

    println!(
        "[updates] current: {}",
        current.as_deref().unwrap_or("unknown")
    );
    match latest {
        Some(release) => {
            println!(
                "[updates] latest stable: {} ({})",
                latest_version.as_deref().unwrap_or(release.version()),
                release.created_at.format("%Y-%m-%d")
            );
            match suffix.and_then(|suffix| release.asset_for(suffix)) {
                Some(asset) => println!("  download: {}", asset.browser_download_url),
                None => println!("  download: no asset for this platform"),
            }
        }
        None => println!("[updates] latest stable: none published"),
    }
    if update_available {
        println!("[updates] UPDATE AVAILABLE");
    }
    if !experimental.is_empty() {
        println!("[updates] experimental: {}", experimental.len());
        for release in &experimental {
            println!("  - {} ({})", release.tag_name, release.created_at.format("%Y-%m-%d"));
        }
    }
}
