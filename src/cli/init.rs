//! Init command.
//!
//! Writes a commented outpost.toml template into the current directory.

use crate::cli::output;
use crate::config::{self, Config};
use crate::error::{OutpostError, Result};

pub fn execute() -> Result<()> {
    if Config::exists() {
        return Err(OutpostError::AlreadyInitialized);
    }

    std::fs::write(Config::config_path(), config::template())?;

    output::success("wrote outpost.toml");
    output::hint("edit it, export OUTPOST_API_TOKEN, then run: outpost up");
    Ok(())
}
