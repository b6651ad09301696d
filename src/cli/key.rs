//! Key command.
//!
//! Ensures the dedicated SSH key exists and shows the material an operator
//! may need elsewhere (the public half and fingerprint, never the private
//! key).

use std::path::Path;

use crate::cli::output;
use crate::core::identity;
use crate::error::Result;

pub fn execute(path: Option<&Path>) -> Result<()> {
    let material = identity::ensure_key(path, false)?;

    output::section("Dedicated key");
    output::kv("private key", material.private_key_path.display());
    output::kv("fingerprint", &material.fingerprint);
    output::kv("public key", &material.public_key);
    Ok(())
}
