use crate::support::{self, GlobalArgs};
use companion_host::LaunchTarget;
use companion_host::client::{DEFAULT_WAIT_ATTEMPTS, DEFAULT_WAIT_INTERVAL};
use serde_json::json;

pub fn run(globals: &GlobalArgs, wait: bool, json_output: bool) {
    let runtime = support::runtime_or_exit();
    let (_store, config) = support::load_config_or_exit(globals);
    let client = support::host_client_or_exit(globals, &config);

    let (target, running) = runtime.block_on(async {
        let target = companion_host::launch_host(&config, &client).await?;
        let running = if wait {
            Some(
                client
                    .wait_until_running(DEFAULT_WAIT_ATTEMPTS, DEFAULT_WAIT_INTERVAL)
                    .await,
            )
        } else {
            None
        };
        Ok::<_, companion_host::HostError>((target, running))
    })
    .unwrap_or_else(|err| {
        eprintln!("error: {err}");
        std::process::exit(1);
    });

    if json_output {
        let payload = json!({
            "schema": 1,
            "target": target,
            "running": running,
        });
        support::print_json_or_exit(&payload, "launch");
    } else {
        match &target {
            LaunchTarget::Executable { path } => {
                println!("[launch] started {}", path.display());
            }
            LaunchTarget::Shell { program, args } => {
                println!("[launch] started via `{program} {}`", args.join(" "));
            }
        }
        match running {
            Some(true) => println!("[launch] host is answering at {}", client.info_url()),
            Some(false) => println!("[launch] host did not answer at {}", client.info_url()),
            None => {}
        }
    }

    if running == Some(false) {
        std::process::exit(1);
    }
}
