//! Bootstrap command.
//!
//! Re-runs the step sequence against an already provisioned server. Safe by
//! the idempotency discipline: previously applied steps report "already
//! satisfied" and are skipped.

use std::path::Path;

use tracing::debug;

use crate::cli::report;
use crate::config::Config;
use crate::core::identity::KeyMaterial;
use crate::core::remote::SshRemote;
use crate::core::step::Report;
use crate::core::steps::STOCK_SSH_PORT;
use crate::core::{facts, identity, orchestrator, readiness, steps};
use crate::error::Result;

pub fn execute(config_path: Option<&Path>, address: &str, yes: bool) -> Result<()> {
    let config = match config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let material = identity::ensure_key(config.ssh.key_path.as_deref(), yes)?;
    let run_report = run_plan(&config, address, &material)?;
    report::render(&run_report)
}

/// Run the full step plan in its two port phases.
///
/// The stock-port phase normally runs over 22, but an already hardened
/// machine only answers on the configured port, so that port is probed
/// first and wins when live. The hardened-port phase always uses the
/// configured port, which the hardening step has applied by then.
pub(crate) fn run_plan(
    config: &Config,
    address: &str,
    material: &KeyMaterial,
) -> Result<Report> {
    let port = config.ssh.port;
    let mut remote = SshRemote::new(address, "root", STOCK_SSH_PORT, &material.private_key_path)?;
    if port != STOCK_SSH_PORT {
        let mut hardened =
            SshRemote::new(address, "root", port, &material.private_key_path)?;
        if readiness::ssh_probe(&mut hardened) {
            debug!("sshd already answers on port {}", port);
            remote = hardened;
        }
    }

    let host_facts = facts::gather(&mut remote)?;
    let plan = steps::plan(config, &host_facts)?;

    let mut run_report = orchestrator::run(&mut remote, plan.stock_port)?;
    if !run_report.is_success() {
        return Ok(run_report);
    }

    let mut remote = SshRemote::new(address, "root", port, &material.private_key_path)?;
    run_report.merge(orchestrator::run(&mut remote, plan.hardened_port)?);
    Ok(run_report)
}
