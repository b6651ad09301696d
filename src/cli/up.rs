//! Up command - the full pipeline.
//!
//! Key → provision → wait for reachability → gather facts → run the
//! bootstrap steps → final report.

use std::path::Path;

use tracing::info;

use crate::cli::{bootstrap, output, report};
use crate::config::Config;
use crate::core::cloud::HttpControlPlane;
use crate::core::identity;
use crate::core::provision::{self, ServerSpec, ServerState};
use crate::core::readiness::{self, DEFAULT_INTERVAL, DEFAULT_MAX_ATTEMPTS};
use crate::core::remote::SshRemote;
use crate::core::steps::STOCK_SSH_PORT;
use crate::error::Result;

pub fn execute(config_path: Option<&Path>, name: Option<String>, yes: bool) -> Result<()> {
    let config = match config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let token = config.api_token()?;

    let material = identity::ensure_key(config.ssh.key_path.as_deref(), yes)?;
    output::kv("key", &material.fingerprint);

    let plane = HttpControlPlane::new(&config.cloud.endpoint, &token);
    let spec = ServerSpec {
        name: name.or_else(|| config.server.name.clone()),
        size_class: config.server.size_class.clone(),
        location: config.server.location.clone(),
        image: config.server.image.clone(),
    };

    output::progress("provisioning instance");
    let mut server = match provision::provision(&plane, &spec, &material) {
        Ok(server) => {
            output::progress_done(true);
            server
        }
        Err(e) => {
            output::progress_done(false);
            return Err(e);
        }
    };
    output::kv("address", &server.address);

    // A fresh image's sshd answers on the stock port; the configured port
    // only applies once the hardening step has run.
    let mut probe_remote =
        SshRemote::new(&server.address, "root", STOCK_SSH_PORT, &material.private_key_path)?;

    output::progress("waiting for ssh");
    let wait = readiness::wait_reachable(
        || readiness::ssh_probe(&mut probe_remote),
        DEFAULT_MAX_ATTEMPTS,
        DEFAULT_INTERVAL,
    );
    output::tick_end();
    match wait {
        Ok(()) => server.state = ServerState::Reachable,
        Err(e) => {
            server.state = ServerState::Failed;
            return Err(e);
        }
    }
    info!("server {} reachable", server.id);

    let run_report = bootstrap::run_plan(&config, &server.address, &material)?;
    report::render(&run_report)?;

    output::hint(&format!(
        "connect with: ssh -i {} {}@{} -p {}",
        material.private_key_path.display(),
        config.ssh.user,
        server.address,
        config.ssh.port
    ));
    Ok(())
}
