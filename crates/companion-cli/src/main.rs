//! Companion CLI: the `companion` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands, ConfigCommands};
use support::GlobalArgs;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "COMPANION_LOG";

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let globals = GlobalArgs {
        config: cli.config,
        host_url: cli.host_url,
    };

    match cli.command {
        Commands::PeerCheck {
            base,
            home,
            legacy_token_shape,
            step_delay_ms,
            json,
        } => commands::peer_check::run(
            &globals,
            commands::peer_check::Args {
                base,
                home,
                legacy_token_shape,
                step_delay_ms,
                json,
            },
        ),

        Commands::PeerLocate { base, home, json } => {
            commands::peer_locate::run(&globals, base, home, json)
        }

        Commands::HostInfo { json } => commands::host_info::run(&globals, json),

        Commands::Launch { wait, json } => commands::launch::run(&globals, wait, json),

        Commands::Updates { json } => commands::updates::run(&globals, json),

        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Show { json } => commands::config::show(&globals, json),
            ConfigCommands::Init { host_path, json } => {
                commands::config::init(&globals, host_path, json)
            }
        },
    }
}
