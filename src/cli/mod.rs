//! Command-line interface.

pub mod bootstrap;
pub mod completions;
pub mod init;
pub mod key;
pub mod output;
pub mod report;
pub mod up;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Outpost - provision a cloud server and bootstrap it into a hardened,
/// service-running state.
#[derive(Parser)]
#[command(
    name = "outpost",
    about = "Provision a cloud server and bootstrap it into a hardened, service-running state",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to outpost.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging (same as OUTPOST_LOG=outpost=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Write a commented outpost.toml template
    Init,

    /// Provision a server and run the full bootstrap sequence
    Up {
        /// Instance name (overrides server.name; omit to auto-generate)
        #[arg(long)]
        name: Option<String>,
        /// Answer yes to prompts (key reuse)
        #[arg(short, long)]
        yes: bool,
    },

    /// Re-run the bootstrap sequence against an existing server
    Bootstrap {
        /// Public address of the server
        address: String,
        /// Answer yes to prompts (key reuse)
        #[arg(short, long)]
        yes: bool,
    },

    /// Ensure the dedicated SSH key exists and show it
    Key {
        /// Use this key instead of the dedicated one
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Execute a command.
pub fn execute(command: Command, config_path: Option<PathBuf>) -> crate::error::Result<()> {
    use Command::*;

    match command {
        Init => init::execute(),
        Up { name, yes } => up::execute(config_path.as_deref(), name, yes),
        Bootstrap { address, yes } => {
            bootstrap::execute(config_path.as_deref(), &address, yes)
        }
        Key { path } => key::execute(path.as_deref()),
        Completions { shell } => completions::execute(shell),
    }
}
