//! Outpost - provision a cloud server and bootstrap it into a hardened,
//! service-running state.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use outpost::cli::output;
use outpost::cli::{execute, Cli};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env("OUTPOST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("outpost=debug")
        } else {
            EnvFilter::new("outpost=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).without_time())
        .init();

    if let Err(e) = execute(cli.command, cli.config) {
        let suggestion = match &e {
            outpost::error::OutpostError::NotInitialized => Some("run: outpost init"),
            outpost::error::OutpostError::MissingToken(_) => {
                Some("export the control-plane API token first")
            }
            outpost::error::OutpostError::Timeout { .. } => {
                Some("the instance never came up; check the provider console, then destroy and retry")
            }
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
