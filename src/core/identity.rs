//! Dedicated SSH key management.
//!
//! All remote access runs over a key pair generated for outpost alone. The
//! operator's personal `~/.ssh` keys are never picked up implicitly; reuse
//! of anything is an explicit opt-in.

use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::Local;
use dialoguer::Confirm;
use std::io::IsTerminal;
use tracing::{debug, info};

use crate::error::{OutpostError, Result};

const KEY_FILE: &str = "id_ed25519";

/// The durable identity used for every remote session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    pub private_key_path: PathBuf,
    /// Public half, the only part that ever leaves this machine.
    pub public_key: String,
    pub fingerprint: String,
}

/// How to resolve "a dedicated key already exists, reuse it?".
pub enum Reuse {
    /// Ask on a terminal, defaulting to yes; accept silently otherwise.
    Prompt { assume_yes: bool },
    Accept,
    Decline,
}

impl Reuse {
    fn decide(&self, path: &Path) -> Result<bool> {
        match self {
            Reuse::Accept => Ok(true),
            Reuse::Decline => Ok(false),
            Reuse::Prompt { assume_yes } => {
                if *assume_yes || !std::io::stdin().is_terminal() {
                    return Ok(true);
                }
                Ok(Confirm::new()
                    .with_prompt(format!("Reuse dedicated key {}?", path.display()))
                    .default(true)
                    .interact()?)
            }
        }
    }
}

/// Base directory for outpost state (`~/.outpost`).
pub fn state_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| OutpostError::Other("unable to determine home directory".to_string()))?;
    Ok(home.join(".outpost"))
}

/// Resolve the key to use for this run.
///
/// An explicit path wins as-is when it exists (and is generated fresh when
/// it does not). Otherwise the conventional dedicated key is offered for
/// reuse; declining generates a new timestamped key beside it rather than
/// clobbering anything.
pub fn ensure_key(explicit: Option<&Path>, assume_yes: bool) -> Result<KeyMaterial> {
    ensure_key_in(&state_dir()?, explicit, Reuse::Prompt { assume_yes })
}

pub fn ensure_key_in(dir: &Path, explicit: Option<&Path>, reuse: Reuse) -> Result<KeyMaterial> {
    if let Some(path) = explicit {
        if path.exists() {
            debug!("using operator-supplied key at {}", path.display());
            return load(path);
        }
        info!("generating key at operator-supplied path {}", path.display());
        return generate(path);
    }

    let default_path = dir.join(KEY_FILE);
    if default_path.exists() {
        if reuse.decide(&default_path)? {
            debug!("reusing dedicated key at {}", default_path.display());
            return load(&default_path);
        }
        let stamped = dir.join(format!(
            "{}-{}",
            KEY_FILE,
            Local::now().format("%Y%m%d%H%M%S")
        ));
        info!("reuse declined; generating {}", stamped.display());
        return generate(&stamped);
    }

    generate(&default_path)
}

/// Load existing key material, reading the fingerprint back via ssh-keygen.
pub fn load(private_key_path: &Path) -> Result<KeyMaterial> {
    let pub_path = public_path(private_key_path);
    let public_key = std::fs::read_to_string(&pub_path)
        .map_err(|e| {
            OutpostError::Keygen(format!("cannot read {}: {}", pub_path.display(), e))
        })?
        .trim()
        .to_string();
    Ok(KeyMaterial {
        private_key_path: private_key_path.to_path_buf(),
        fingerprint: fingerprint(&pub_path)?,
        public_key,
    })
}

/// Generate a fresh ed25519 pair with no passphrase.
///
/// No passphrase because the key must be usable non-interactively by the
/// readiness poller and every bootstrap step.
pub fn generate(private_key_path: &Path) -> Result<KeyMaterial> {
    if let Some(parent) = private_key_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let keygen = which::which("ssh-keygen")
        .map_err(|_| OutpostError::Keygen("ssh-keygen not found in PATH".to_string()))?;
    let comment = format!("outpost-{}", Local::now().format("%Y-%m-%d"));
    let output = Command::new(keygen)
        .args(["-t", "ed25519", "-N", "", "-C"])
        .arg(&comment)
        .args(["-q", "-f"])
        .arg(private_key_path)
        .output()?;
    if !output.status.success() {
        return Err(OutpostError::Keygen(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    info!("generated dedicated key at {}", private_key_path.display());
    load(private_key_path)
}

fn public_path(private_key_path: &Path) -> PathBuf {
    let mut os = private_key_path.as_os_str().to_os_string();
    os.push(".pub");
    PathBuf::from(os)
}

/// `ssh-keygen -lf` prints `<bits> <fingerprint> <comment> (<type>)`.
fn fingerprint(pub_path: &Path) -> Result<String> {
    let keygen = which::which("ssh-keygen")
        .map_err(|_| OutpostError::Keygen("ssh-keygen not found in PATH".to_string()))?;
    let output = Command::new(keygen).arg("-lf").arg(pub_path).output()?;
    if !output.status.success() {
        return Err(OutpostError::Keygen(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .split_whitespace()
        .nth(1)
        .map(str::to_string)
        .ok_or_else(|| OutpostError::Keygen(format!("unexpected ssh-keygen output: {}", stdout)))
}
