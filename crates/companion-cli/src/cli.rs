use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "companion",
    about = "Companion: launch, update-check, and peer-check the host app",
    version
)]
pub struct Cli {
    /// Path to the companion config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Host info API URL (overrides the configured one)
    #[arg(long, global = true)]
    pub host_url: Option<String>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check the peer directories against drives.json
    PeerCheck {
        /// Drive base holding drives/ and drives.json (skips host lookup)
        #[arg(long)]
        base: Option<String>,

        /// Host home directory; the drive base is <home>/drive
        #[arg(long, conflicts_with = "base")]
        home: Option<String>,

        /// Accept any character between letter and digits in peer tokens
        #[arg(long)]
        legacy_token_shape: bool,

        /// Pause between stages, in milliseconds
        #[arg(long, default_value_t = 0)]
        step_delay_ms: u64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show where the peer tree and drives.json are
    PeerLocate {
        /// Drive base holding drives/ and drives.json (skips host lookup)
        #[arg(long)]
        base: Option<String>,

        /// Host home directory; the drive base is <home>/drive
        #[arg(long, conflicts_with = "base")]
        home: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Query the running host app for its home and version
    HostInfo {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the host app
    Launch {
        /// Wait until the host API answers
        #[arg(long)]
        wait: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare the running host version with published releases
    Updates {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect or initialize the companion config
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigCommands {
    /// Print the effective config
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Point the config at a host home directory
    Init {
        /// Host home directory
        #[arg(long)]
        host_path: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
